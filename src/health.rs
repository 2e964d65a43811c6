//! Health check and API description routes.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{AppState, endpoints, timestamp};

/// The state needed for the health check.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// The database connection to check.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Whether the database can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

/// The response body of the health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub database: DatabaseStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

fn check_database(db_connection: &Mutex<Connection>) -> DatabaseStatus {
    let connection = match db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return DatabaseStatus::Disconnected;
        }
    };

    match connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => DatabaseStatus::Connected,
        Err(error) => {
            tracing::error!("Health check query failed: {error}");
            DatabaseStatus::Disconnected
        }
    }
}

/// A route handler that reports whether the server is up and can reach the database.
///
/// The server always responds with 200 OK while it is running, check `database` for the state of
/// the database.
pub async fn get_health(State(state): State<HealthState>) -> impl IntoResponse {
    Json(Health {
        status: "OK",
        message: "Server is running",
        database: check_database(&state.db_connection),
        timestamp: timestamp::now(),
    })
}

/// The response body of the root route.
#[derive(Debug, Clone, Serialize)]
pub struct ApiDescription {
    pub message: &'static str,
    pub status: &'static str,
    pub endpoints: &'static [&'static str],
}

/// A route handler that describes the API.
pub async fn get_api_description() -> impl IntoResponse {
    Json(ApiDescription {
        message: "Farm Budget API",
        status: "running",
        endpoints: &endpoints::AVAILABLE_ENDPOINTS,
    })
}
