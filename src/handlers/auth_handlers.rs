use actix_web::{HttpResponse, Result, error, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use mongodb::bson::doc;

use crate::models::user::User;
use crate::state::app_state::AppState;
use crate::structs::user::{LoginRequest, LoginResponse};
use crate::utils::jwt::create_token;

pub async fn login(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let db = &app_state.db;
    let users_collection = db.collection::<User>("users");

    let user = users_collection
        .find_one(doc! { "username": &req.username, "is_active": true })
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    match user {
        Some(mut user) => {
            let password_matches = verify(&req.password, &user.password_hash)
                .map_err(|_| error::ErrorInternalServerError("Password verification failed"))?;

            if !password_matches {
                return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Invalid credentials"
                })));
            }

            let token = create_token(&user.username).map_err(|e| {
                error::ErrorInternalServerError(format!("Token generation failed: {}", e))
            })?;

            user.update_last_login();
            users_collection
                .update_one(
                    doc! { "username": &user.username },
                    doc! { "$set": { "last_login": user.last_login } },
                )
                .await
                .map_err(|e| {
                    error::ErrorInternalServerError(format!("Failed to update last login: {}", e))
                })?;

            Ok(HttpResponse::Ok().json(LoginResponse {
                token,
                username: user.username,
            }))
        }
        None => Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid credentials"
        }))),
    }
}

/// Bootstrap the single admin account from env vars. Refuses once any user
/// exists.
pub async fn create_admin(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let db = &app_state.db;
    let users_collection = db.collection::<User>("users");

    let count = users_collection
        .count_documents(doc! {})
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Database error: {}", e)))?;

    if count > 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Users already exist, cannot create initial admin"
        })));
    }

    let username = std::env::var("ADMIN_USERNAME")
        .map_err(|_| error::ErrorInternalServerError("ADMIN_USERNAME not set"))?;
    let password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| error::ErrorInternalServerError("ADMIN_PASSWORD not set"))?;

    let password_hash = hash(password, DEFAULT_COST)
        .map_err(|e| error::ErrorInternalServerError(format!("Failed to hash password: {}", e)))?;

    let admin = User::new(username.clone(), password_hash);

    users_collection
        .insert_one(&admin)
        .await
        .map_err(|e| error::ErrorInternalServerError(format!("Failed to create admin: {}", e)))?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Admin created successfully",
        "username": username
    })))
}
