use actix_web::{HttpResponse, web};
use mongodb::bson::doc;

use crate::state::app_state::AppState;

/// Liveness probe: ping the visitors database so a monitor can tell a dead
/// MongoDB connection apart from a dead web server.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(_) => HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "error": "Database connection failed" })),
    }
}
