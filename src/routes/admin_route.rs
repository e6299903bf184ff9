use crate::services::seat_service::SeatService;
use crate::utils::error::AppError;
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use rocket_okapi::openapi;

/// Recompute available seats for every active trip
#[openapi(tag = "Admin")]
#[post("/admin/trips/sync")]
pub async fn sync_trips(seat_service: &State<SeatService>) -> Result<Json<Value>, AppError> {
    let synced = seat_service.sync_all_trips().await?;
    Ok(Json(json!({ "synced_trips": synced })))
}
