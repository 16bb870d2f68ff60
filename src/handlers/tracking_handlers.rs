use actix_web::{HttpRequest, HttpResponse, Responder, Result, error, web};
use chrono::Utc;
use mongodb::bson::{Bson, doc};
use validator::Validate;

use crate::models::visitor::Visitor;
use crate::state::app_state::AppState;
use crate::structs::analytics_response::PublicStatsResponse;
use crate::structs::track_request::{TrackVisitorRequest, validation_error_map};
use crate::utils::stats::day_bounds_millis;

/// Record one visit. The payload is entirely optional; whatever is missing
/// stays null, except the IP address which falls back to the caller's
/// observed address.
pub async fn track_visitor(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    web::Json(payload): web::Json<TrackVisitorRequest>,
) -> Result<impl Responder> {
    if let Err(errors) = payload.validate() {
        return Ok(HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "success": false,
            "message": "Validation failed",
            "errors": validation_error_map(&errors),
        })));
    }

    let caller_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    let visitor = Visitor::from_request(payload, caller_ip);

    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    match visitors_collection.insert_one(&visitor).await {
        Ok(_) => Ok(HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "Visitor tracked successfully",
        }))),
        Err(e) => {
            log::error!("Visitor tracking failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": "Failed to track visitor",
            })))
        }
    }
}

/// Public summary: total, today, distinct countries. No auth, rate limited
/// at the route.
pub async fn visitor_stats(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    let total_visitors = visitors_collection
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let (today_start, today_end) = day_bounds_millis(Utc::now().date_naive());
    let today_visitors = visitors_collection
        .count_documents(doc! {
            "created_at": { "$gte": today_start, "$lt": today_end }
        })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let countries = visitors_collection
        .distinct(
            "country",
            doc! { "country": { "$nin": [Bson::Null, "Unknown"] } },
        )
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?
        .len();

    Ok(HttpResponse::Ok().json(PublicStatsResponse {
        total_visitors,
        today_visitors,
        countries,
    }))
}
