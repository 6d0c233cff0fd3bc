use super::parsing::{
    env_optional, env_or_default, normalize_api_prefix, parse_bool, parse_cors_origins,
    parse_environment, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, MaintenanceSettings,
    RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("INVIGILATION_HOST", "0.0.0.0");
        let port = env_or_default("INVIGILATION_PORT", "8000");

        let environment = parse_environment(
            env_optional("INVIGILATION_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("INVIGILATION_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Invigilation API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = normalize_api_prefix(env_or_default("API_PREFIX", "/api"))?;

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "480"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "invigilation");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "invigilation_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections = parse_u32(
            "DATABASE_MAX_CONNECTIONS",
            env_or_default("DATABASE_MAX_CONNECTIONS", "30"),
        )?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let first_superuser_username = env_or_default("FIRST_SUPERUSER_USERNAME", "admin");
        let first_superuser_email = env_or_default("FIRST_SUPERUSER_EMAIL", "admin@localhost");
        let first_superuser_password = env_or_default("FIRST_SUPERUSER_PASSWORD", "");

        let interval_seconds = parse_u64(
            "MAINTENANCE_INTERVAL_SECONDS",
            env_or_default("MAINTENANCE_INTERVAL_SECONDS", "300"),
        )?;

        let log_level = env_or_default("INVIGILATION_LOG_LEVEL", "info");
        let json = env_optional("INVIGILATION_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);
        let prometheus_enabled = env_optional("PROMETHEUS_ENABLED")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            admin: AdminSettings {
                first_superuser_username,
                first_superuser_email,
                first_superuser_password,
            },
            maintenance: MaintenanceSettings { interval_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn maintenance(&self) -> &MaintenanceSettings {
        &self.maintenance
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.maintenance.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAINTENANCE_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !matches!(self.security.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }
        if env_optional("SECRET_KEY").is_none() {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support;

    use super::*;

    #[test]
    fn load_applies_defaults() {
        let _lock = test_support::env_lock();
        let _guard = test_support::ScopedEnv::new(&[
            ("INVIGILATION_PORT", None),
            ("API_PREFIX", None),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", None),
            ("MAINTENANCE_INTERVAL_SECONDS", None),
            ("INVIGILATION_STRICT_CONFIG", None),
            ("INVIGILATION_ENV", None),
            ("ENVIRONMENT", None),
            ("SECRET_KEY", Some("unit-test-secret")),
        ]);

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.server_port(), 8000);
        assert_eq!(settings.api().api_prefix, "/api");
        assert_eq!(settings.security().access_token_expire_minutes, 480);
        assert_eq!(settings.maintenance().interval_seconds, 300);
        assert!(!settings.runtime().strict_config);
    }

    #[test]
    fn strict_mode_requires_superuser_password() {
        let _lock = test_support::env_lock();
        let _guard = test_support::ScopedEnv::new(&[
            ("INVIGILATION_STRICT_CONFIG", Some("true")),
            ("DATABASE_URL", Some("postgresql://user:pw@localhost/db")),
            ("SECRET_KEY", Some("unit-test-secret")),
            ("FIRST_SUPERUSER_PASSWORD", None),
        ]);

        let err = Settings::load().expect_err("strict config without superuser password");
        assert!(matches!(err, ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD")));
    }

    #[test]
    fn zero_maintenance_interval_is_rejected() {
        let _lock = test_support::env_lock();
        let _guard = test_support::ScopedEnv::new(&[
            ("INVIGILATION_STRICT_CONFIG", None),
            ("INVIGILATION_ENV", None),
            ("ENVIRONMENT", None),
            ("SECRET_KEY", Some("unit-test-secret")),
            ("MAINTENANCE_INTERVAL_SECONDS", Some("0")),
        ]);

        let err = Settings::load().expect_err("zero interval");
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "MAINTENANCE_INTERVAL_SECONDS", .. }
        ));
    }
}
