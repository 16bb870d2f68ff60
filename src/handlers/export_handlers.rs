use actix_web::{HttpResponse, Responder, Result, error, http::header, web};
use chrono::Utc;
use futures_util::{StreamExt, stream};
use mongodb::bson::doc;

use crate::models::visitor::Visitor;
use crate::state::app_state::AppState;
use crate::utils::csv::{header_row, visitor_row};

/// Stream every stored visit as CSV, newest first. Rows are written as the
/// cursor yields them, so the export never holds the full collection in
/// memory.
pub async fn export_csv(app_state: web::Data<AppState>) -> Result<impl Responder> {
    let db = &app_state.db;
    let visitors_collection = db.collection::<Visitor>("visitors");

    let cursor = visitors_collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    let header = stream::once(async {
        Ok::<_, mongodb::error::Error>(web::Bytes::from(header_row()))
    });
    let rows =
        cursor.map(|result| result.map(|visitor| web::Bytes::from(visitor_row(&visitor))));

    let filename = format!("visitors_{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .streaming(header.chain(rows)))
}
