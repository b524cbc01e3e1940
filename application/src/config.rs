//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::Deserialize;
use service::domain::schedule::RoundingUnit;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Authentication configuration.
    pub auth: Auth,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Authentication configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Auth {
    /// Secret the [JWT]s are signed with.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Installment schedule configuration.
    pub schedule: Schedule,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl Service {
    /// Builds a [`service::Config`] out of this [`Service`] configuration
    /// and the provided [`Auth`] one.
    ///
    /// # Errors
    ///
    /// If the configured [`Schedule::rounding_unit`] is not positive.
    pub fn into_config(
        self,
        auth: &Auth,
    ) -> Result<service::Config, NonPositiveRoundingUnit> {
        let Self {
            schedule: Schedule { rounding_unit },
            tasks: Tasks {
                expire_rent_agreements,
            },
        } = self;

        Ok(service::Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                auth.jwt_secret.as_bytes(),
            ),
            rounding_unit: RoundingUnit::new(rounding_unit)
                .ok_or(NonPositiveRoundingUnit(rounding_unit))?,
            expire_rent_agreements:
                service::task::expire_rent_agreements::Config {
                    interval: expire_rent_agreements.interval,
                },
        })
    }
}

/// Installment schedule configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Schedule {
    /// Amount every non-final generated installment is rounded to.
    #[default(RoundingUnit::DEFAULT.get())]
    pub rounding_unit: Decimal,
}

/// Error of a non-positive [`Schedule::rounding_unit`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`service.schedule.rounding_unit` must be positive, got {_0}")]
pub struct NonPositiveRoundingUnit(#[error(not(source))] pub Decimal);

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpireRentAgreements` task configuration.
    pub expire_rent_agreements: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time;

    use rust_decimal::Decimal;
    use service::domain::schedule::RoundingUnit;

    use super::{Auth, Config, NonPositiveRoundingUnit, Schedule, Service};

    #[test]
    fn defaults_without_file() {
        let config = Config::new("/nonexistent/rent-schedule").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service.schedule.rounding_unit, Decimal::from(50));
        assert_eq!(
            config.service.tasks.expire_rent_agreements.interval,
            time::Duration::from_secs(60 * 60),
        );
    }

    #[test]
    fn fills_missing_sections_with_defaults() {
        let path = std::env::temp_dir().join("rent-schedule-partial.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = Config::new(path.to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret, "secret");
        assert_eq!(config.service.schedule.rounding_unit, Decimal::from(50));
    }

    #[test]
    fn builds_service_config() {
        let service = Service {
            schedule: Schedule {
                rounding_unit: Decimal::from(100),
            },
            ..Service::default()
        };

        let config = service.into_config(&Auth::default()).unwrap();

        assert_eq!(
            config.rounding_unit,
            RoundingUnit::new(Decimal::from(100)).unwrap(),
        );
    }

    #[test]
    fn rejects_non_positive_rounding_unit() {
        let service = Service {
            schedule: Schedule {
                rounding_unit: Decimal::ZERO,
            },
            ..Service::default()
        };

        assert!(matches!(
            service.into_config(&Auth::default()),
            Err(NonPositiveRoundingUnit(u)) if u.is_zero(),
        ));
    }
}
