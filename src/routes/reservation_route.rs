use crate::models::reservation::{Reservation, ReservationConfirmation, ReservationRequest};
use crate::services::reservation_service::ReservationService;
use crate::utils::error::AppError;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// Book seats, pay and receive the invoice
#[openapi(tag = "Reservations")]
#[post("/reservations", format = "json", data = "<request>")]
pub async fn create_reservation(
    request: Json<ReservationRequest>,
    reservation_service: &State<ReservationService>,
) -> Result<Json<ReservationConfirmation>, AppError> {
    let confirmation = reservation_service.commit(request.into_inner()).await?;
    Ok(Json(confirmation))
}

/// Look up a reservation by confirmation code
#[openapi(tag = "Reservations")]
#[get("/reservations/<confirmation_code>")]
pub async fn get_reservation(
    confirmation_code: String,
    reservation_service: &State<ReservationService>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = reservation_service
        .reservation_by_code(&confirmation_code)
        .await?;
    Ok(Json(reservation))
}
