use crate::models::seat::{SeatAvailability, SeatClaim, SeatMap};
use crate::store::ReservationStore;
use crate::utils::error::{AppError, AppResult};
use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SeatService {
    store: Arc<dyn ReservationStore>,
}

/// Per-seat result of reserving a selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeatReservation {
    pub claimed: Vec<i32>,
    // Held by another reservation
    pub taken: Vec<i32>,
    // The write itself failed
    pub failed: Vec<i32>,
}

impl SeatService {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        SeatService { store }
    }

    pub async fn occupied_seats(&self, trip_id: i32) -> AppResult<Vec<i32>> {
        self.store.occupied_seats(trip_id).await
    }

    pub async fn seat_map(&self, trip_id: i32) -> AppResult<SeatMap> {
        let (trip, occupied) = tokio::try_join!(
            self.store.trip(trip_id),
            self.store.occupied_seats(trip_id)
        )?;
        let trip = trip.ok_or_else(|| AppError::NotFound("Trip not found".into()))?;
        Ok(SeatMap::build(trip_id, trip.capacity(), &occupied))
    }

    /// Reports which of `seat_numbers` are already reserved. This is a plain
    /// read; nothing is held between it and a later claim.
    pub async fn check_availability(
        &self,
        trip_id: i32,
        seat_numbers: &[i32],
    ) -> AppResult<SeatAvailability> {
        let seats = self.store.seats(trip_id, seat_numbers).await?;
        let conflicts = seats
            .into_iter()
            .filter(|seat| seat.is_reserved)
            .map(|seat| seat.seat_number)
            .collect();
        Ok(SeatAvailability::from_conflicts(conflicts))
    }

    /// Claims each seat for `reservation_id`, one conditional write per seat,
    /// all issued together.
    pub async fn reserve_seats(
        &self,
        trip_id: i32,
        seat_numbers: &[i32],
        reservation_id: i32,
    ) -> SeatReservation {
        let claims = seat_numbers.iter().map(|seat| async move {
            (*seat, self.store.claim_seat(trip_id, *seat, reservation_id).await)
        });

        let mut outcome = SeatReservation::default();
        for (seat, result) in join_all(claims).await {
            match result {
                Ok(SeatClaim::Claimed) => outcome.claimed.push(seat),
                Ok(SeatClaim::Taken) => outcome.taken.push(seat),
                Err(e) => {
                    warn!(trip_id, seat, reservation_id, error = %e, "Seat write failed");
                    outcome.failed.push(seat);
                }
            }
        }

        info!(
            trip_id,
            reservation_id,
            claimed = ?outcome.claimed,
            taken = ?outcome.taken,
            failed = ?outcome.failed,
            "Seats reserved"
        );
        outcome
    }

    pub async fn release_seats(&self, trip_id: i32, reservation_id: i32) -> AppResult<u64> {
        let released = self.store.release_seats(trip_id, reservation_id).await?;
        info!(trip_id, reservation_id, released, "Seats released");
        Ok(released)
    }

    pub async fn sync_available_seats(&self, trip_id: i32) -> AppResult<i32> {
        let available = self.store.sync_available_seats(trip_id).await?;
        info!(trip_id, available, "Available seats synchronized");
        Ok(available)
    }

    /// Resynchronizes every active trip; returns how many were updated.
    pub async fn sync_all_trips(&self) -> AppResult<usize> {
        let trip_ids = self.store.active_trip_ids().await?;
        if trip_ids.is_empty() {
            info!("No active trips to synchronize");
            return Ok(0);
        }
        try_join_all(trip_ids.iter().map(|id| self.sync_available_seats(*id))).await?;
        Ok(trip_ids.len())
    }
}
