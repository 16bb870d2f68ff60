use anyhow::{Context, Result};
use mongodb::{Client, Database};
use std::env;

/// Connect to MongoDB using the MONGODB_URI environment variable and hand
/// back the application database.
pub async fn get_database() -> Result<Database> {
    let uri = env::var("MONGODB_URI").context("MONGODB_URI not set")?;
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| String::from("visitlog"));

    let client = Client::with_uri_str(&uri)
        .await
        .context("Failed to connect to MongoDB")?;

    Ok(client.database(&db_name))
}
