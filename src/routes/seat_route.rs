use crate::models::seat::{SeatAvailability, SeatAvailabilityRequest, SeatMap};
use crate::services::seat_service::SeatService;
use crate::utils::error::AppError;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Seat map of a trip
#[openapi(tag = "Seats")]
#[get("/trips/<trip_id>/seats")]
pub async fn get_seat_map(
    trip_id: i32,
    seat_service: &State<SeatService>,
) -> Result<Json<SeatMap>, AppError> {
    let seat_map = seat_service.seat_map(trip_id).await?;
    Ok(Json(seat_map))
}

/// Check whether seats are still free
#[openapi(tag = "Seats")]
#[post("/trips/<trip_id>/seats/availability", format = "json", data = "<request>")]
pub async fn check_seat_availability(
    trip_id: i32,
    request: Json<SeatAvailabilityRequest>,
    seat_service: &State<SeatService>,
) -> Result<Json<SeatAvailability>, AppError> {
    if request.seat_numbers.is_empty() {
        return Err(AppError::BadRequest("No seats given".into()));
    }
    let availability = seat_service
        .check_availability(trip_id, &request.seat_numbers)
        .await?;
    Ok(Json(availability))
}
