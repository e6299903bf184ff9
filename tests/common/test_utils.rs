use dotenv::dotenv;
use once_cell::sync::OnceCell;
use sqlx::mysql::MySqlPool as Pool;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::Error;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

static TEST_DB: OnceCell<Mutex<Option<TestDb>>> = OnceCell::new();

#[derive(Debug)]
pub struct TestDb {
    pub pool: Pool,
    pub db_name: String,
}

// Server URL without the database path, taken from ADMIN_DATABASE_URL
fn server_url() -> Result<String, Error> {
    dotenv().ok();
    let db_url = env::var("ADMIN_DATABASE_URL")
        .map_err(|_| Error::Configuration("ADMIN_DATABASE_URL must be set".into()))?;
    Ok(db_url.split('/').take(3).collect::<Vec<&str>>().join("/"))
}

async fn connect(url: &str) -> Result<Pool, Error> {
    MySqlPoolOptions::new().max_connections(10).connect(url).await
}

impl TestDb {
    /// Shared pool on a fresh database, created once per test binary.
    pub async fn get_instance() -> Result<Pool, Error> {
        let test_db = TEST_DB.get_or_init(|| Mutex::new(None));
        let mut guard = test_db.lock().await;

        if let Some(db) = guard.as_ref() {
            return Ok(db.pool.clone());
        }

        let db = Self::setup_database().await?;
        let pool = db.pool.clone();
        *guard = Some(db);
        Ok(pool)
    }

    async fn setup_database() -> Result<Self, Error> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let db_name = format!("bus_reservation_test_{}", timestamp);

        let server = server_url()?;
        let admin_pool = connect(&server).await?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await?;

        let pool = connect(&format!("{}/{}", server, db_name)).await?;
        Self::create_tables(&pool).await?;

        Ok(Self { pool, db_name })
    }

    async fn create_tables(pool: &Pool) -> Result<(), Error> {
        let tables = vec![
            "CREATE TABLE IF NOT EXISTS routes (
                id INT AUTO_INCREMENT PRIMARY KEY,
                origin VARCHAR(100) NOT NULL,
                destination VARCHAR(100) NOT NULL,
                duration_minutes INT NOT NULL,
                price DECIMAL(10,2) NOT NULL
            )",

            "CREATE TABLE IF NOT EXISTS buses (
                id INT AUTO_INCREMENT PRIMARY KEY,
                bus_number VARCHAR(20) NOT NULL,
                capacity INT NOT NULL DEFAULT 40
            )",

            "CREATE TABLE IF NOT EXISTS schedules (
                id INT AUTO_INCREMENT PRIMARY KEY,
                route_id INT NOT NULL,
                departure_time TIME NOT NULL,
                days_of_week JSON NOT NULL,
                CONSTRAINT schedules_route_fk
                    FOREIGN KEY (route_id) REFERENCES routes(id)
                    ON DELETE CASCADE
            )",

            "CREATE TABLE IF NOT EXISTS trips (
                id INT AUTO_INCREMENT PRIMARY KEY,
                schedule_id INT NOT NULL,
                bus_id INT NULL,
                trip_date DATE NOT NULL,
                available_seats INT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                CONSTRAINT trips_schedule_fk
                    FOREIGN KEY (schedule_id) REFERENCES schedules(id)
                    ON DELETE CASCADE,
                CONSTRAINT trips_bus_fk
                    FOREIGN KEY (bus_id) REFERENCES buses(id)
            )",

            "CREATE TABLE IF NOT EXISTS passengers (
                id INT AUTO_INCREMENT PRIMARY KEY,
                identification CHAR(10) NOT NULL,
                name VARCHAR(200) NOT NULL,
                email VARCHAR(200) NOT NULL,
                phone VARCHAR(20) NOT NULL,
                address VARCHAR(255) NOT NULL,
                CONSTRAINT passengers_identification_uindex UNIQUE (identification)
            )",

            "CREATE TABLE IF NOT EXISTS reservations (
                id INT AUTO_INCREMENT PRIMARY KEY,
                trip_id INT NOT NULL,
                passenger_id INT NOT NULL,
                passenger_name VARCHAR(200) NOT NULL,
                passenger_email VARCHAR(200) NOT NULL,
                passenger_phone VARCHAR(20) NOT NULL,
                passenger_address VARCHAR(255) NOT NULL,
                seat_numbers JSON NOT NULL,
                total_amount DECIMAL(10,2) NOT NULL,
                payment_status VARCHAR(20) NOT NULL,
                payment_method VARCHAR(20) NOT NULL,
                confirmation_code CHAR(8) NOT NULL,
                created_at DATETIME NOT NULL,
                CONSTRAINT reservations_trip_fk FOREIGN KEY (trip_id) REFERENCES trips(id),
                CONSTRAINT reservations_passenger_fk
                    FOREIGN KEY (passenger_id) REFERENCES passengers(id)
            )",

            "CREATE TABLE IF NOT EXISTS seats (
                trip_id INT NOT NULL,
                seat_number INT NOT NULL,
                is_reserved BOOLEAN NOT NULL DEFAULT FALSE,
                reservation_id INT NULL,
                PRIMARY KEY (trip_id, seat_number),
                CONSTRAINT seats_trip_fk
                    FOREIGN KEY (trip_id) REFERENCES trips(id)
                    ON DELETE CASCADE
            )",

            "CREATE TABLE IF NOT EXISTS payments (
                id INT AUTO_INCREMENT PRIMARY KEY,
                reservation_id INT NOT NULL,
                amount DECIMAL(10,2) NOT NULL,
                payment_method VARCHAR(20) NOT NULL,
                card_last_four CHAR(4) NULL,
                transaction_id VARCHAR(40) NOT NULL,
                receipt_url TEXT NULL,
                status VARCHAR(20) NOT NULL,
                CONSTRAINT payments_reservation_fk
                    FOREIGN KEY (reservation_id) REFERENCES reservations(id)
            )",
        ];

        for create_sql in tables {
            sqlx::query(create_sql).execute(pool).await?;
        }

        Ok(())
    }

    /// Quito → Guayaquil on 2025-09-01 with a 40-seat bus. Returns the trip id.
    pub async fn seed_trip(pool: &Pool) -> Result<i32, Error> {
        let route = sqlx::query(
            "INSERT INTO routes (origin, destination, duration_minutes, price)
             VALUES ('Quito', 'Guayaquil', 480, 15.50)",
        )
        .execute(pool)
        .await?
        .last_insert_id();
        let bus = sqlx::query("INSERT INTO buses (bus_number, capacity) VALUES ('B-101', 40)")
            .execute(pool)
            .await?
            .last_insert_id();
        let schedule = sqlx::query(
            "INSERT INTO schedules (route_id, departure_time, days_of_week)
             VALUES (?, '08:00:00', '[1,2,3,4,5]')",
        )
        .bind(route)
        .execute(pool)
        .await?
        .last_insert_id();
        let trip = sqlx::query(
            "INSERT INTO trips (schedule_id, bus_id, trip_date, available_seats, status)
             VALUES (?, ?, '2025-09-01', 40, 'active')",
        )
        .bind(schedule)
        .bind(bus)
        .execute(pool)
        .await?
        .last_insert_id();
        Ok(trip as i32)
    }

    // Drop the per-run database
    pub async fn cleanup_database() -> Result<(), Error> {
        if let Some(test_db) = TEST_DB.get() {
            if let Some(db) = test_db.lock().await.take() {
                let admin_pool = connect(&server_url()?).await?;
                sqlx::query(&format!("DROP DATABASE IF EXISTS {}", db.db_name))
                    .execute(&admin_pool)
                    .await?;
            }
        }
        Ok(())
    }
}
