use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::Logger, web};
use dotenv::dotenv;
use env_logger::Env;
use std::env;

use visitlog::db::mongodb::get_database;
use visitlog::routes::init_routes;
use visitlog::state::app_state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let port_string = env::var("PORT").unwrap_or_else(|_| String::from("8080"));
    let port = port_string.parse::<u16>().expect("PORT must be a number");
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Initialize the database connection
    let db = match get_database().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error connecting to the database: {}", e);
            std::process::exit(1);
        }
    };

    // Create shared state
    let app_state = web::Data::new(AppState { db });

    // Browser origins allowed to call the tracking API, comma separated
    let cors_origins: Vec<String> = env::var("CORS_ALLOWED_ORIGINS")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    // Start the Actix Web server
    HttpServer::new(move || {
        let logger = Logger::new("%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %D ms");
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }
        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(init_routes)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
