use crate::models::passenger::PassengerForm;
use crate::models::payment::{PaymentDetails, PaymentMethod, PaymentStatus};
use crate::models::seat::MAX_SEATS_PER_RESERVATION;
use crate::utils::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::Display;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Reservation {
    pub id: i32,
    pub trip_id: i32,
    pub passenger_id: i32,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub passenger_address: String,
    pub seat_numbers: Vec<i32>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub trip_id: i32,
    pub passenger_id: i32,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: String,
    pub passenger_address: String,
    pub seat_numbers: Vec<i32>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ReservationRequest {
    pub trip_id: i32,
    pub passenger: PassengerForm,
    pub seat_numbers: Vec<i32>,
    pub payment: PaymentDetails,
}

/// Checks the seat selection in isolation: between one and
/// `MAX_SEATS_PER_RESERVATION` distinct positive seat numbers. Returns the
/// selection sorted ascending.
pub fn normalize_seat_selection(seats: &[i32]) -> AppResult<Vec<i32>> {
    if seats.is_empty() {
        return Err(AppError::ValidationError("Select at least one seat".into()));
    }
    if seats.len() > MAX_SEATS_PER_RESERVATION {
        return Err(AppError::ValidationError(format!(
            "Cannot select more than {} seats",
            MAX_SEATS_PER_RESERVATION
        )));
    }
    if let Some(bad) = seats.iter().find(|seat| **seat < 1) {
        return Err(AppError::ValidationError(format!("Invalid seat number {}", bad)));
    }
    let unique: BTreeSet<i32> = seats.iter().copied().collect();
    if unique.len() != seats.len() {
        return Err(AppError::ValidationError("Seat selected more than once".into()));
    }
    Ok(unique.into_iter().collect())
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReservationConfirmation {
    pub reservation_id: i32,
    pub passenger_id: i32,
    pub payment_id: Option<i32>,
    pub confirmation_code: String,
    pub booking_status: String,
    pub seat_numbers: Vec<i32>,
    pub total_amount: Decimal,
    pub invoice_url: String,
    /// Steps that failed without aborting the booking. Logged, never shown
    /// to the passenger.
    #[serde(skip)]
    pub soft_failures: Vec<CommitStep>,
}

/// Steps of the reservation commit sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitStep {
    ValidateInput,
    CheckSeats,
    UpsertPassenger,
    InsertReservation,
    ReserveSeats,
    SyncCounter,
    CreatePayment,
    GenerateInvoice,
    UploadInvoice,
    SendEmail,
}
