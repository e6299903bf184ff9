//! Storage seam for the reservation workflow.
//!
//! The relational schema is owned elsewhere; this trait is the exact set of
//! reads and writes the services issue against it. Seat rows are created
//! lazily, so a missing row always means "available".

pub mod memory;
pub mod mysql;

use crate::models::catalog::{Route, TripDetail};
use crate::models::passenger::{NewPassenger, Passenger};
use crate::models::payment::{NewPayment, PaymentStatus};
use crate::models::reservation::{NewReservation, Reservation};
use crate::models::seat::{Seat, SeatClaim};
use crate::utils::error::AppResult;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// All routes, ordered by origin.
    async fn list_routes(&self) -> AppResult<Vec<Route>>;

    /// Active trips on `date` with at least `min_available_seats` left.
    async fn trips_on(
        &self,
        date: NaiveDate,
        min_available_seats: i32,
    ) -> AppResult<Vec<TripDetail>>;

    async fn trip(&self, trip_id: i32) -> AppResult<Option<TripDetail>>;

    async fn active_trip_ids(&self) -> AppResult<Vec<i32>>;

    /// Seat numbers currently reserved on a trip, ascending.
    async fn occupied_seats(&self, trip_id: i32) -> AppResult<Vec<i32>>;

    /// Existing seat rows among `seat_numbers`.
    async fn seats(&self, trip_id: i32, seat_numbers: &[i32]) -> AppResult<Vec<Seat>>;

    /// Marks a seat reserved for `reservation_id` unless another reservation
    /// already holds it. Creates the row when absent. Atomic per seat.
    async fn claim_seat(
        &self,
        trip_id: i32,
        seat_number: i32,
        reservation_id: i32,
    ) -> AppResult<SeatClaim>;

    /// Frees every seat of the trip held by `reservation_id`.
    async fn release_seats(&self, trip_id: i32, reservation_id: i32) -> AppResult<u64>;

    /// Recomputes `available_seats` as capacity minus reserved seats in a
    /// single storage-side write and returns the new value.
    async fn sync_available_seats(&self, trip_id: i32) -> AppResult<i32>;

    async fn find_passenger(&self, identification: &str) -> AppResult<Option<Passenger>>;

    async fn update_passenger_contact(
        &self,
        passenger_id: i32,
        phone: &str,
        address: &str,
    ) -> AppResult<()>;

    async fn insert_passenger(&self, passenger: &NewPassenger) -> AppResult<i32>;

    async fn insert_reservation(&self, reservation: &NewReservation) -> AppResult<i32>;

    async fn set_reservation_status(
        &self,
        reservation_id: i32,
        status: PaymentStatus,
    ) -> AppResult<()>;

    async fn reservation_by_code(&self, confirmation_code: &str) -> AppResult<Option<Reservation>>;

    async fn insert_payment(&self, payment: &NewPayment) -> AppResult<i32>;

    async fn set_payment_receipt(&self, payment_id: i32, receipt_url: &str) -> AppResult<()>;
}
