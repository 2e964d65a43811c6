use rusqlite::Connection;

use crate::{AppState, Environment, db::initialize, pagination::PaginationConfig};

pub(crate) fn get_test_db_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn get_test_app_state(environment: Environment) -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory SQLite database"),
        "Etc/UTC",
        PaginationConfig::default(),
        environment,
    )
    .expect("Could not create app state")
}
