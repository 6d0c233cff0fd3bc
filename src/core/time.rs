use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Duration,
    OffsetDateTime, PrimitiveDateTime, Time,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

pub(crate) fn format_time(value: Time) -> String {
    value
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| value.to_string())
}

/// Accepts `YYYY-MM-DD`.
pub(crate) fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time(value: &str) -> Option<Time> {
    let value = value.trim();
    Time::parse(value, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(value, format_description!("[hour]:[minute]")))
        .ok()
}

pub(crate) fn minutes_between(start: Time, end: Time) -> i64 {
    let diff: Duration = end - start;
    diff.whole_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn exam_date_and_time_round_through_strings() {
        let date = parse_date("2026-03-09").unwrap();
        assert_eq!(date, Date::from_calendar_date(2026, Month::March, 9).unwrap());
        assert_eq!(format_date(date), "2026-03-09");

        let time = parse_time("09:30").unwrap();
        assert_eq!(time, Time::from_hms(9, 30, 0).unwrap());
        assert_eq!(parse_time("09:30:00"), Some(time));
        assert_eq!(format_time(time), "09:30");
    }

    #[test]
    fn parse_rejects_malformed_values() {
        assert!(parse_date("09/03/2026").is_none());
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn minutes_between_handles_ordering() {
        let start = Time::from_hms(9, 0, 0).unwrap();
        let end = Time::from_hms(11, 30, 0).unwrap();
        assert_eq!(minutes_between(start, end), 150);
        assert_eq!(minutes_between(end, start), -150);
    }
}
