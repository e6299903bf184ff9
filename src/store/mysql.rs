use super::ReservationStore;
use crate::models::catalog::{Bus, Route, Schedule, TripDetail, TripStatus, DEFAULT_BUS_CAPACITY};
use crate::models::passenger::{NewPassenger, Passenger};
use crate::models::payment::{NewPayment, PaymentMethod, PaymentStatus};
use crate::models::reservation::{NewReservation, Reservation};
use crate::models::seat::{Seat, SeatClaim};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

const TRIP_SELECT: &str = r#"
    SELECT
        t.id AS trip_id,
        t.trip_date,
        t.available_seats,
        t.status,
        s.id AS schedule_id,
        s.departure_time,
        s.days_of_week,
        r.id AS route_id,
        r.origin,
        r.destination,
        r.duration_minutes,
        r.price,
        b.id AS bus_id,
        b.bus_number,
        b.capacity
    FROM trips t
    JOIN schedules s ON t.schedule_id = s.id
    JOIN routes r ON s.route_id = r.id
    LEFT JOIN buses b ON t.bus_id = b.id
"#;

// Flat row of the trip x schedule x route x bus join
#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    trip_id: i32,
    trip_date: NaiveDate,
    available_seats: i32,
    status: String,
    schedule_id: i32,
    departure_time: NaiveTime,
    days_of_week: Json<Vec<u8>>,
    route_id: i32,
    origin: String,
    destination: String,
    duration_minutes: i32,
    price: Decimal,
    bus_id: Option<i32>,
    bus_number: Option<String>,
    capacity: Option<i32>,
}

impl TryFrom<TripRow> for TripDetail {
    type Error = AppError;

    fn try_from(row: TripRow) -> AppResult<Self> {
        let status = TripStatus::from_str(&row.status)
            .map_err(|_| AppError::DatabaseError(format!("unknown trip status {}", row.status)))?;
        let bus = match (row.bus_id, row.bus_number, row.capacity) {
            (Some(id), Some(bus_number), Some(capacity)) => Some(Bus { id, bus_number, capacity }),
            _ => None,
        };
        Ok(TripDetail {
            id: row.trip_id,
            trip_date: row.trip_date,
            available_seats: row.available_seats,
            status,
            schedule: Schedule {
                id: row.schedule_id,
                route_id: row.route_id,
                departure_time: row.departure_time,
                days_of_week: row.days_of_week.0,
            },
            route: Route {
                id: row.route_id,
                origin: row.origin,
                destination: row.destination,
                duration_minutes: row.duration_minutes,
                price: row.price,
            },
            bus,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: i32,
    trip_id: i32,
    passenger_id: i32,
    passenger_name: String,
    passenger_email: String,
    passenger_phone: String,
    passenger_address: String,
    seat_numbers: Json<Vec<i32>>,
    total_amount: Decimal,
    payment_status: String,
    payment_method: String,
    confirmation_code: String,
    created_at: NaiveDateTime,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = AppError;

    fn try_from(row: ReservationRow) -> AppResult<Self> {
        let payment_status = PaymentStatus::from_str(&row.payment_status).map_err(|_| {
            AppError::DatabaseError(format!("unknown payment status {}", row.payment_status))
        })?;
        let payment_method = PaymentMethod::from_str(&row.payment_method).map_err(|_| {
            AppError::DatabaseError(format!("unknown payment method {}", row.payment_method))
        })?;
        Ok(Reservation {
            id: row.id,
            trip_id: row.trip_id,
            passenger_id: row.passenger_id,
            passenger_name: row.passenger_name,
            passenger_email: row.passenger_email,
            passenger_phone: row.passenger_phone,
            passenger_address: row.passenger_address,
            seat_numbers: row.seat_numbers.0,
            total_amount: row.total_amount,
            payment_status,
            payment_method,
            confirmation_code: row.confirmation_code,
            created_at: DateTime::<Utc>::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }
}

#[async_trait]
impl ReservationStore for MySqlStore {
    async fn list_routes(&self) -> AppResult<Vec<Route>> {
        let routes = sqlx::query_as::<_, Route>(
            r#"
            SELECT id, origin, destination, duration_minutes, price
            FROM routes
            ORDER BY origin ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }

    async fn trips_on(
        &self,
        date: NaiveDate,
        min_available_seats: i32,
    ) -> AppResult<Vec<TripDetail>> {
        let sql = format!(
            "{} WHERE t.trip_date = ? AND t.status = 'active' AND t.available_seats >= ? \
             ORDER BY s.departure_time",
            TRIP_SELECT
        );
        let rows = sqlx::query_as::<_, TripRow>(&sql)
            .bind(date)
            .bind(min_available_seats)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TripDetail::try_from).collect()
    }

    async fn trip(&self, trip_id: i32) -> AppResult<Option<TripDetail>> {
        let sql = format!("{} WHERE t.id = ?", TRIP_SELECT);
        let row = sqlx::query_as::<_, TripRow>(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TripDetail::try_from).transpose()
    }

    async fn active_trip_ids(&self) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>("SELECT id FROM trips WHERE status = 'active'")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn occupied_seats(&self, trip_id: i32) -> AppResult<Vec<i32>> {
        let seats = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT seat_number
            FROM seats
            WHERE trip_id = ? AND is_reserved = TRUE
            ORDER BY seat_number
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    async fn seats(&self, trip_id: i32, seat_numbers: &[i32]) -> AppResult<Vec<Seat>> {
        if seat_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT trip_id, seat_number, is_reserved, reservation_id FROM seats WHERE trip_id = ",
        );
        builder.push_bind(trip_id);
        builder.push(" AND seat_number IN (");
        let mut separated = builder.separated(", ");
        for seat in seat_numbers {
            separated.push_bind(*seat);
        }
        separated.push_unseparated(") ORDER BY seat_number");

        let seats = builder
            .build_query_as::<Seat>()
            .fetch_all(&self.pool)
            .await?;
        Ok(seats)
    }

    async fn claim_seat(
        &self,
        trip_id: i32,
        seat_number: i32,
        reservation_id: i32,
    ) -> AppResult<SeatClaim> {
        // Make sure the row exists; (trip_id, seat_number) is the primary key.
        // Only the duplicate key is tolerated, other errors still surface.
        sqlx::query(
            r#"
            INSERT INTO seats (trip_id, seat_number, is_reserved, reservation_id)
            VALUES (?, ?, FALSE, NULL)
            ON DUPLICATE KEY UPDATE seat_number = seat_number
            "#,
        )
        .bind(trip_id)
        .bind(seat_number)
        .execute(&self.pool)
        .await?;

        // Only an unreserved row can be taken
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET is_reserved = TRUE,
                reservation_id = ?
            WHERE trip_id = ?
            AND seat_number = ?
            AND is_reserved = FALSE
            "#,
        )
        .bind(reservation_id)
        .bind(trip_id)
        .bind(seat_number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(SeatClaim::Taken);
        }
        Ok(SeatClaim::Claimed)
    }

    async fn release_seats(&self, trip_id: i32, reservation_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET is_reserved = FALSE,
                reservation_id = NULL
            WHERE trip_id = ? AND reservation_id = ?
            "#,
        )
        .bind(trip_id)
        .bind(reservation_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn sync_available_seats(&self, trip_id: i32) -> AppResult<i32> {
        sqlx::query(
            r#"
            UPDATE trips t
            LEFT JOIN buses b ON t.bus_id = b.id
            SET t.available_seats = COALESCE(b.capacity, ?) - (
                SELECT COUNT(*) FROM seats s
                WHERE s.trip_id = t.id AND s.is_reserved = TRUE
            )
            WHERE t.id = ?
            "#,
        )
        .bind(DEFAULT_BUS_CAPACITY)
        .bind(trip_id)
        .execute(&self.pool)
        .await?;

        sqlx::query_scalar::<_, i32>("SELECT available_seats FROM trips WHERE id = ?")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".into()))
    }

    async fn find_passenger(&self, identification: &str) -> AppResult<Option<Passenger>> {
        let passenger = sqlx::query_as::<_, Passenger>(
            r#"
            SELECT id, identification, name, email, phone, address
            FROM passengers
            WHERE identification = ?
            "#,
        )
        .bind(identification)
        .fetch_optional(&self.pool)
        .await?;
        Ok(passenger)
    }

    async fn update_passenger_contact(
        &self,
        passenger_id: i32,
        phone: &str,
        address: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE passengers SET phone = ?, address = ? WHERE id = ?")
            .bind(phone)
            .bind(address)
            .bind(passenger_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_passenger(&self, passenger: &NewPassenger) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO passengers (identification, name, email, phone, address)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&passenger.identification)
        .bind(&passenger.name)
        .bind(&passenger.email)
        .bind(&passenger.phone)
        .bind(&passenger.address)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn insert_reservation(&self, reservation: &NewReservation) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservations (
                trip_id, passenger_id, passenger_name, passenger_email, passenger_phone,
                passenger_address, seat_numbers, total_amount, payment_status, payment_method,
                confirmation_code, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.trip_id)
        .bind(reservation.passenger_id)
        .bind(&reservation.passenger_name)
        .bind(&reservation.passenger_email)
        .bind(&reservation.passenger_phone)
        .bind(&reservation.passenger_address)
        .bind(Json(&reservation.seat_numbers))
        .bind(reservation.total_amount)
        .bind(reservation.payment_status.to_string())
        .bind(reservation.payment_method.to_string())
        .bind(&reservation.confirmation_code)
        .bind(reservation.created_at.naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn set_reservation_status(
        &self,
        reservation_id: i32,
        status: PaymentStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE reservations SET payment_status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(reservation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reservation_by_code(&self, confirmation_code: &str) -> AppResult<Option<Reservation>> {
        // Codes are not unique; the newest reservation wins
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, trip_id, passenger_id, passenger_name, passenger_email, passenger_phone,
                   passenger_address, seat_numbers, total_amount, payment_status, payment_method,
                   confirmation_code, created_at
            FROM reservations
            WHERE confirmation_code = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(confirmation_code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Reservation::try_from).transpose()
    }

    async fn insert_payment(&self, payment: &NewPayment) -> AppResult<i32> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                reservation_id, amount, payment_method, card_last_four,
                transaction_id, receipt_url, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.reservation_id)
        .bind(payment.amount)
        .bind(payment.payment_method.to_string())
        .bind(&payment.card_last_four)
        .bind(&payment.transaction_id)
        .bind(&payment.receipt_url)
        .bind(payment.status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    async fn set_payment_receipt(&self, payment_id: i32, receipt_url: &str) -> AppResult<()> {
        sqlx::query("UPDATE payments SET receipt_url = ? WHERE id = ?")
            .bind(receipt_url)
            .bind(payment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
