//! In-process `ReservationStore` with the same semantics as the MySQL one.
//!
//! Used by the test suites. Individual operations can be made to fail to
//! exercise the soft-failure paths of the commit sequence.

use super::ReservationStore;
use crate::models::catalog::{Bus, Route, Schedule, TripDetail, TripStatus};
use crate::models::passenger::{NewPassenger, Passenger};
use crate::models::payment::{NewPayment, Payment, PaymentStatus};
use crate::models::reservation::{NewReservation, Reservation};
use crate::models::seat::{Seat, SeatClaim};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct TripRow {
    id: i32,
    schedule_id: i32,
    bus_id: Option<i32>,
    trip_date: NaiveDate,
    available_seats: i32,
    status: TripStatus,
}

#[derive(Debug, Default)]
struct State {
    next_id: i32,
    routes: BTreeMap<i32, Route>,
    buses: BTreeMap<i32, Bus>,
    schedules: BTreeMap<i32, Schedule>,
    trips: BTreeMap<i32, TripRow>,
    seats: BTreeMap<(i32, i32), Seat>,
    passengers: BTreeMap<i32, Passenger>,
    reservations: BTreeMap<i32, Reservation>,
    payments: BTreeMap<i32, Payment>,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, row: &TripRow) -> Option<TripDetail> {
        let schedule = self.schedules.get(&row.schedule_id)?.clone();
        let route = self.routes.get(&schedule.route_id)?.clone();
        let bus = row.bus_id.and_then(|id| self.buses.get(&id).cloned());
        Some(TripDetail {
            id: row.id,
            trip_date: row.trip_date,
            available_seats: row.available_seats,
            status: row.status,
            schedule,
            route,
            bus,
        })
    }

    fn reserved_count(&self, trip_id: i32) -> i32 {
        self.seats
            .values()
            .filter(|seat| seat.trip_id == trip_id && seat.is_reserved)
            .count() as i32
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::DatabaseError("memory store lock poisoned".into()))
    }

    // Records the call and applies any injected failure
    fn enter(&self, op: &'static str) -> AppResult<MutexGuard<'_, State>> {
        let mut state = self.state()?;
        *state.calls.entry(op).or_insert(0) += 1;
        if state.failing.contains(op) {
            return Err(AppError::DatabaseError(format!("injected failure in {}", op)));
        }
        Ok(state)
    }

    /// Makes every later call of `op` (a `ReservationStore` method name) fail.
    pub fn fail_on(&self, op: &'static str) {
        if let Ok(mut state) = self.state() {
            state.failing.insert(op);
        }
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state()
            .map(|state| state.calls.get(op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn add_route(
        &self,
        origin: &str,
        destination: &str,
        duration_minutes: i32,
        price: Decimal,
    ) -> i32 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id();
        state.routes.insert(
            id,
            Route {
                id,
                origin: origin.to_string(),
                destination: destination.to_string(),
                duration_minutes,
                price,
            },
        );
        id
    }

    pub fn add_bus(&self, bus_number: &str, capacity: i32) -> i32 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id();
        state.buses.insert(
            id,
            Bus {
                id,
                bus_number: bus_number.to_string(),
                capacity,
            },
        );
        id
    }

    pub fn add_schedule(&self, route_id: i32, departure_time: NaiveTime) -> i32 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id();
        state.schedules.insert(
            id,
            Schedule {
                id,
                route_id,
                departure_time,
                days_of_week: vec![0, 1, 2, 3, 4, 5, 6],
            },
        );
        id
    }

    /// Adds a trip whose counter starts at the bus capacity.
    pub fn add_trip(
        &self,
        schedule_id: i32,
        bus_id: Option<i32>,
        trip_date: NaiveDate,
        status: TripStatus,
    ) -> i32 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id();
        let available_seats = bus_id
            .and_then(|bus| state.buses.get(&bus))
            .map(|bus| bus.capacity)
            .unwrap_or(crate::models::catalog::DEFAULT_BUS_CAPACITY);
        state.trips.insert(
            id,
            TripRow {
                id,
                schedule_id,
                bus_id,
                trip_date,
                available_seats,
                status,
            },
        );
        id
    }

    /// Overwrites the denormalised counter, bypassing the seat rows.
    pub fn set_trip_counter(&self, trip_id: i32, available_seats: i32) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(trip) = state.trips.get_mut(&trip_id) {
            trip.available_seats = available_seats;
        }
    }

    pub fn trip_counter(&self, trip_id: i32) -> Option<i32> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.trips.get(&trip_id).map(|trip| trip.available_seats)
    }

    pub fn seat(&self, trip_id: i32, seat_number: i32) -> Option<Seat> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.seats.get(&(trip_id, seat_number)).cloned()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.reservations.values().cloned().collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.payments.values().cloned().collect()
    }

    pub fn passengers(&self) -> Vec<Passenger> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.passengers.values().cloned().collect()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn list_routes(&self) -> AppResult<Vec<Route>> {
        let state = self.enter("list_routes")?;
        let mut routes: Vec<Route> = state.routes.values().cloned().collect();
        routes.sort_by(|a, b| a.origin.cmp(&b.origin));
        Ok(routes)
    }

    async fn trips_on(
        &self,
        date: NaiveDate,
        min_available_seats: i32,
    ) -> AppResult<Vec<TripDetail>> {
        let state = self.enter("trips_on")?;
        let mut trips: Vec<TripDetail> = state
            .trips
            .values()
            .filter(|trip| {
                trip.trip_date == date
                    && trip.status == TripStatus::Active
                    && trip.available_seats >= min_available_seats
            })
            .filter_map(|trip| state.detail(trip))
            .collect();
        trips.sort_by_key(|trip| trip.schedule.departure_time);
        Ok(trips)
    }

    async fn trip(&self, trip_id: i32) -> AppResult<Option<TripDetail>> {
        let state = self.enter("trip")?;
        Ok(state.trips.get(&trip_id).and_then(|trip| state.detail(trip)))
    }

    async fn active_trip_ids(&self) -> AppResult<Vec<i32>> {
        let state = self.enter("active_trip_ids")?;
        Ok(state
            .trips
            .values()
            .filter(|trip| trip.status == TripStatus::Active)
            .map(|trip| trip.id)
            .collect())
    }

    async fn occupied_seats(&self, trip_id: i32) -> AppResult<Vec<i32>> {
        let occupied = {
            let state = self.enter("occupied_seats")?;
            state
                .seats
                .values()
                .filter(|seat| seat.trip_id == trip_id && seat.is_reserved)
                .map(|seat| seat.seat_number)
                .collect()
        };
        // Let concurrent bookings interleave between read and write
        tokio::task::yield_now().await;
        Ok(occupied)
    }

    async fn seats(&self, trip_id: i32, seat_numbers: &[i32]) -> AppResult<Vec<Seat>> {
        let seats = {
            let state = self.enter("seats")?;
            seat_numbers
                .iter()
                .filter_map(|number| state.seats.get(&(trip_id, *number)).cloned())
                .collect()
        };
        tokio::task::yield_now().await;
        Ok(seats)
    }

    async fn claim_seat(
        &self,
        trip_id: i32,
        seat_number: i32,
        reservation_id: i32,
    ) -> AppResult<SeatClaim> {
        let mut state = self.enter("claim_seat")?;
        let seat = state.seats.entry((trip_id, seat_number)).or_insert(Seat {
            trip_id,
            seat_number,
            is_reserved: false,
            reservation_id: None,
        });
        if seat.is_reserved {
            return Ok(SeatClaim::Taken);
        }
        seat.is_reserved = true;
        seat.reservation_id = Some(reservation_id);
        Ok(SeatClaim::Claimed)
    }

    async fn release_seats(&self, trip_id: i32, reservation_id: i32) -> AppResult<u64> {
        let mut state = self.enter("release_seats")?;
        let mut released = 0;
        for seat in state.seats.values_mut() {
            if seat.trip_id == trip_id && seat.reservation_id == Some(reservation_id) {
                seat.is_reserved = false;
                seat.reservation_id = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn sync_available_seats(&self, trip_id: i32) -> AppResult<i32> {
        let mut state = self.enter("sync_available_seats")?;
        let detail = state
            .trips
            .get(&trip_id)
            .and_then(|trip| state.detail(trip))
            .ok_or_else(|| AppError::NotFound("Trip not found".into()))?;
        let available = detail.capacity() - state.reserved_count(trip_id);
        if let Some(trip) = state.trips.get_mut(&trip_id) {
            trip.available_seats = available;
        }
        Ok(available)
    }

    async fn find_passenger(&self, identification: &str) -> AppResult<Option<Passenger>> {
        let state = self.enter("find_passenger")?;
        Ok(state
            .passengers
            .values()
            .find(|p| p.identification == identification)
            .cloned())
    }

    async fn update_passenger_contact(
        &self,
        passenger_id: i32,
        phone: &str,
        address: &str,
    ) -> AppResult<()> {
        let mut state = self.enter("update_passenger_contact")?;
        let passenger = state
            .passengers
            .get_mut(&passenger_id)
            .ok_or_else(|| AppError::NotFound("Passenger not found".into()))?;
        passenger.phone = phone.to_string();
        passenger.address = address.to_string();
        Ok(())
    }

    async fn insert_passenger(&self, passenger: &NewPassenger) -> AppResult<i32> {
        let mut state = self.enter("insert_passenger")?;
        if state
            .passengers
            .values()
            .any(|p| p.identification == passenger.identification)
        {
            return Err(AppError::Conflict("Passenger identification already registered".into()));
        }
        let id = state.next_id();
        state.passengers.insert(
            id,
            Passenger {
                id,
                identification: passenger.identification.clone(),
                name: passenger.name.clone(),
                email: passenger.email.clone(),
                phone: passenger.phone.clone(),
                address: passenger.address.clone(),
            },
        );
        Ok(id)
    }

    async fn insert_reservation(&self, reservation: &NewReservation) -> AppResult<i32> {
        let mut state = self.enter("insert_reservation")?;
        let id = state.next_id();
        state.reservations.insert(
            id,
            Reservation {
                id,
                trip_id: reservation.trip_id,
                passenger_id: reservation.passenger_id,
                passenger_name: reservation.passenger_name.clone(),
                passenger_email: reservation.passenger_email.clone(),
                passenger_phone: reservation.passenger_phone.clone(),
                passenger_address: reservation.passenger_address.clone(),
                seat_numbers: reservation.seat_numbers.clone(),
                total_amount: reservation.total_amount,
                payment_status: reservation.payment_status,
                payment_method: reservation.payment_method,
                confirmation_code: reservation.confirmation_code.clone(),
                created_at: reservation.created_at,
            },
        );
        Ok(id)
    }

    async fn set_reservation_status(
        &self,
        reservation_id: i32,
        status: PaymentStatus,
    ) -> AppResult<()> {
        let mut state = self.enter("set_reservation_status")?;
        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| AppError::NotFound("Reservation not found".into()))?;
        reservation.payment_status = status;
        Ok(())
    }

    async fn reservation_by_code(&self, confirmation_code: &str) -> AppResult<Option<Reservation>> {
        let state = self.enter("reservation_by_code")?;
        Ok(state
            .reservations
            .values()
            .rev()
            .find(|r| r.confirmation_code == confirmation_code)
            .cloned())
    }

    async fn insert_payment(&self, payment: &NewPayment) -> AppResult<i32> {
        let mut state = self.enter("insert_payment")?;
        let id = state.next_id();
        state.payments.insert(
            id,
            Payment {
                id,
                reservation_id: payment.reservation_id,
                amount: payment.amount,
                payment_method: payment.payment_method,
                card_last_four: payment.card_last_four.clone(),
                transaction_id: payment.transaction_id.clone(),
                receipt_url: payment.receipt_url.clone(),
                status: payment.status,
            },
        );
        Ok(id)
    }

    async fn set_payment_receipt(&self, payment_id: i32, receipt_url: &str) -> AppResult<()> {
        let mut state = self.enter("set_payment_receipt")?;
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
        payment.receipt_url = Some(receipt_url.to_string());
        Ok(())
    }
}
