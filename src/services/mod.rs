pub(crate) mod assignment_lifecycle;
pub(crate) mod assignments;
pub(crate) mod audit;
pub(crate) mod notifications;
