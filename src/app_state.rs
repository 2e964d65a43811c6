//! Implements a struct that holds the state of the REST server.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// The mode the server runs in.
///
/// Controls how much detail is shown to clients when an internal error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    /// Internal error messages are included in error responses.
    Development,
    /// Internal error messages are only written to the server logs.
    Production,
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    ///
    /// Used to decide which calendar month "now" and bare dates fall in.
    pub local_timezone: String,

    /// The config that controls how lists of records are paged.
    pub pagination_config: PaginationConfig,

    /// Whether the server runs in development or production mode.
    pub environment: Environment,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Kolkata".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        environment: Environment,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            environment,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Environment {
    fn from_ref(state: &AppState) -> Self {
        state.environment
    }
}
