use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upper bound on seats in one reservation.
pub const MAX_SEATS_PER_RESERVATION: usize = 5;

// Seat rows are created lazily, the first time a seat is reserved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Seat {
    pub trip_id: i32,
    pub seat_number: i32,
    pub is_reserved: bool,
    pub reservation_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SeatMap {
    pub trip_id: i32,
    pub capacity: i32,
    pub occupied_seats: Vec<i32>,
    pub available_seats: Vec<i32>,
}

impl SeatMap {
    /// Splits `1..=capacity` into occupied and available. Reserved rows
    /// outside the bus capacity are ignored.
    pub fn build(trip_id: i32, capacity: i32, reserved: &[i32]) -> Self {
        let reserved: BTreeSet<i32> = reserved.iter().copied().collect();
        let (occupied_seats, available_seats): (Vec<i32>, Vec<i32>) =
            (1..=capacity.max(0)).partition(|seat| reserved.contains(seat));
        SeatMap {
            trip_id,
            capacity,
            occupied_seats,
            available_seats,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SeatAvailabilityRequest {
    pub seat_numbers: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SeatAvailability {
    pub available: bool,
    pub unavailable_seats: Vec<i32>,
}

impl SeatAvailability {
    pub fn from_conflicts(mut unavailable_seats: Vec<i32>) -> Self {
        unavailable_seats.sort_unstable();
        unavailable_seats.dedup();
        SeatAvailability {
            available: unavailable_seats.is_empty(),
            unavailable_seats,
        }
    }
}

/// Outcome of a conditional seat claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatClaim {
    Claimed,
    // Another reservation already holds the seat
    Taken,
}
