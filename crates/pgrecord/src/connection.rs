//! Connection configuration and lifecycle.
//!
//! [`Connection`] owns one live `tokio_postgres::Client` and the background
//! task driving its socket. The model layer only borrows it through
//! [`GenericClient`]; creating and closing it belongs to the application.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;

/// Default Postgres port used when none is configured.
pub const DEFAULT_PORT: u16 = 5432;

/// Connection parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionOptions {
    /// Read options from `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_HOST` and `DB_PORT`.
    ///
    /// Unset string variables become empty strings and an unset port falls back
    /// to [`DEFAULT_PORT`]. A port that does not parse is a configuration error.
    /// Load a `.env` file beforehand (e.g. `dotenvy::dotenv()`) if needed.
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionOptions::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let var = |key: &str| lookup(key).unwrap_or_default();
        let port = match lookup("DB_PORT") {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<u16>().map_err(|e| {
                OrmError::configuration(format!("invalid DB_PORT {raw:?}: {e}"))
            })?,
            _ => DEFAULT_PORT,
        };

        Ok(Self {
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
            database: var("DB_NAME"),
            hostname: var("DB_HOST"),
            port,
        })
    }

    /// Convert into a driver configuration.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .user(&self.user)
            .dbname(&self.database)
            .host(&self.hostname)
            .port(self.port);
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

/// A single live database connection.
pub struct Connection {
    client: tokio_postgres::Client,
    driver: JoinHandle<()>,
}

impl Connection {
    /// Connect using explicit options.
    pub async fn connect(options: &ConnectionOptions) -> OrmResult<Self> {
        Self::connect_with_config(options.to_pg_config()).await
    }

    /// Connect using a `postgres://` URL or key/value connection string.
    pub async fn connect_url(database_url: &str) -> OrmResult<Self> {
        let config: tokio_postgres::Config = database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;
        Self::connect_with_config(config).await
    }

    /// Connect using a prepared driver configuration.
    ///
    /// Must be called from within a tokio runtime: the socket driver is spawned
    /// as a background task.
    pub async fn connect_with_config(config: tokio_postgres::Config) -> OrmResult<Self> {
        let (client, connection) = match config.connect(NoTls).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "failed to connect to the database");
                return Err(OrmError::Connection(e.to_string()));
            }
        };

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection closed with error");
            }
        });

        tracing::info!("connected to the database");
        Ok(Self { client, driver })
    }

    /// Borrow the underlying driver client.
    pub fn client(&self) -> &tokio_postgres::Client {
        &self.client
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    /// Close the connection.
    ///
    /// Errors from the socket driver are logged and not returned.
    pub async fn disconnect(self) {
        let Self { client, driver } = self;
        drop(client);
        match driver.await {
            Ok(()) => tracing::info!("disconnected from the database"),
            Err(e) => tracing::error!(error = %e, "error during disconnection"),
        }
    }
}

impl GenericClient for Connection {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        GenericClient::query(&self.client, sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let opts = ConnectionOptions::from_lookup(lookup(&[
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "app"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "6543"),
        ]))
        .unwrap();

        assert_eq!(
            opts,
            ConnectionOptions {
                user: "postgres".into(),
                password: "secret".into(),
                database: "app".into(),
                hostname: "localhost".into(),
                port: 6543,
            }
        );
    }

    #[test]
    fn missing_variables_default() {
        let opts = ConnectionOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(opts.user, "");
        assert_eq!(opts.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_port_is_a_configuration_error() {
        let err = ConnectionOptions::from_lookup(lookup(&[("DB_PORT", "not-a-port")])).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn deserializes_with_default_port() {
        let opts: ConnectionOptions = serde_json::from_str(
            r#"{"user":"u","database":"d","hostname":"h"}"#,
        )
        .unwrap();
        assert_eq!(opts.port, DEFAULT_PORT);
        assert_eq!(opts.password, "");
    }

    #[test]
    fn pg_config_carries_options() {
        let opts = ConnectionOptions {
            user: "u".into(),
            password: "p".into(),
            database: "d".into(),
            hostname: "h".into(),
            port: 5433,
        };
        let config = opts.to_pg_config();
        assert_eq!(config.get_user(), Some("u"));
        assert_eq!(config.get_dbname(), Some("d"));
        assert_eq!(config.get_ports(), &[5433]);
        assert_eq!(config.get_password(), Some(&b"p"[..]));
    }
}
