#![allow(dead_code)]

use async_trait::async_trait;
use bus_reservation_system::clients::email::Mailer;
use bus_reservation_system::clients::object_storage::{BucketSpec, ObjectStorage};
use bus_reservation_system::models::catalog::TripStatus;
use bus_reservation_system::models::invoice::InvoiceEmail;
use bus_reservation_system::models::passenger::PassengerForm;
use bus_reservation_system::models::payment::{CardDetails, PaymentDetails, PaymentMethod};
use bus_reservation_system::models::reservation::ReservationRequest;
use bus_reservation_system::store::MemoryStore;
use bus_reservation_system::utils::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Object storage kept in memory. Can be switched to fail every call.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<Vec<(String, String, Vec<u8>)>>,
    pub buckets: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn failing() -> Self {
        let storage = Self::default();
        storage.failing.store(true, Ordering::SeqCst);
        storage
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("storage unavailable".into()));
        }
        let mut buckets = self.buckets.lock().unwrap();
        if !buckets.contains(&spec.name) {
            buckets.push(spec.name.clone());
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("storage unavailable".into()));
        }
        self.objects
            .lock()
            .unwrap()
            .push((bucket.to_string(), object_name.to_string(), bytes));
        Ok(format!("https://storage.test/{}/{}", bucket, object_name))
    }
}

/// Mailer that records what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<InvoiceEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.failing.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<InvoiceEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invoice(&self, email: &InvoiceEmail) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("email API returned 500".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn trip_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

pub fn booking_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 20, 15, 30, 0).unwrap()
}

/// Quito → Guayaquil at 08:00 on 2025-09-01, $15.50 a seat, 40-seat bus.
pub fn seed_quito_guayaquil(store: &MemoryStore) -> i32 {
    let route = store.add_route("Quito", "Guayaquil", 480, Decimal::new(1550, 2));
    let bus = store.add_bus("B-101", 40);
    let schedule = store.add_schedule(route, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    store.add_trip(schedule, Some(bus), trip_date(), TripStatus::Active)
}

pub fn passenger(identification: &str) -> PassengerForm {
    PassengerForm {
        identification: identification.to_string(),
        first_name: "María".to_string(),
        last_name: "Andrade".to_string(),
        address: "Av. Amazonas N34-120".to_string(),
        phone: "0991234567".to_string(),
        email: "maria.andrade@example.com".to_string(),
    }
}

pub fn card_payment() -> PaymentDetails {
    PaymentDetails {
        method: PaymentMethod::CreditCard,
        card: Some(CardDetails {
            card_number: "4111 1111 1111 1234".to_string(),
            expiry_date: "12/30".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "MARIA ANDRADE".to_string(),
        }),
        transfer_receipt: None,
    }
}

pub fn reservation_request(
    trip_id: i32,
    seats: &[i32],
    identification: &str,
) -> ReservationRequest {
    ReservationRequest {
        trip_id,
        passenger: passenger(identification),
        seat_numbers: seats.to_vec(),
        payment: card_payment(),
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
    pub trip_id: i32,
}

impl Harness {
    pub fn new(storage: MemoryStorage, mailer: RecordingMailer) -> Self {
        let store = Arc::new(MemoryStore::new());
        let trip_id = seed_quito_guayaquil(&store);
        Harness {
            store,
            storage: Arc::new(storage),
            mailer: Arc::new(mailer),
            trip_id,
        }
    }
}
