use mongodb::Database;

/// Shared application state handed to every handler.
pub struct AppState {
    pub db: Database,
}
