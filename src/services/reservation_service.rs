use crate::clients::email::Mailer;
use crate::clients::object_storage::ObjectStorage;
use crate::models::catalog::{TripInfo, TripStatus};
use crate::models::invoice::{join_seats, InvoiceData, InvoiceEmail, InvoicePassenger, InvoiceTrip};
use crate::models::payment::{NewPayment, PaymentStatus};
use crate::models::reservation::{
    normalize_seat_selection, CommitStep, NewReservation, Reservation, ReservationConfirmation,
    ReservationRequest,
};
use crate::services::catalog_service::CatalogService;
use crate::services::email_service::EmailService;
use crate::services::invoice_service::{generate_invoice_pdf, InvoiceService};
use crate::services::passenger_service::PassengerService;
use crate::services::seat_service::SeatService;
use crate::store::ReservationStore;
use crate::utils::codes::{
    generate_confirmation_code, generate_transaction_id, is_confirmation_code,
};
use crate::utils::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

const DEFAULT_BUS_TYPE: &str = "Executive";

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    catalog: CatalogService,
    seats: SeatService,
    passengers: PassengerService,
    invoices: InvoiceService,
    emails: EmailService,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        ReservationService {
            catalog: CatalogService::new(store.clone()),
            seats: SeatService::new(store.clone()),
            passengers: PassengerService::new(store.clone()),
            invoices: InvoiceService::new(storage),
            emails: EmailService::new(mailer),
            store,
        }
    }

    pub fn invoices(&self) -> &InvoiceService {
        &self.invoices
    }

    pub async fn commit(&self, request: ReservationRequest) -> AppResult<ReservationConfirmation> {
        self.commit_at(request, Utc::now()).await
    }

    /// Books seats for a passenger on a trip and delivers the invoice.
    ///
    /// Everything up to and including the reservation insert is fatal: an
    /// error there is returned and nothing later runs. Nothing is written
    /// before the seat check passes. After the insert, failures are logged
    /// and collected in `soft_failures` while the booking stays confirmed,
    /// with one exception: losing a seat to a concurrent reservation undoes
    /// this reservation and returns `Conflict`.
    pub async fn commit_at(
        &self,
        request: ReservationRequest,
        now: DateTime<Utc>,
    ) -> AppResult<ReservationConfirmation> {
        let trip_id = request.trip_id;

        info!(step = %CommitStep::ValidateInput, trip_id);
        request.passenger.validate()?;
        request.payment.validate_at(now.date_naive())?;
        let seat_numbers = normalize_seat_selection(&request.seat_numbers)?;

        let trip = self.catalog.trip(trip_id).await?;
        if trip.status != TripStatus::Active {
            return Err(AppError::Unprocessable(format!(
                "Trip {} is not open for booking",
                trip_id
            )));
        }
        let capacity = trip.capacity();
        if let Some(seat) = seat_numbers.iter().find(|seat| **seat > capacity) {
            return Err(AppError::ValidationError(format!(
                "Seat {} does not exist on this bus ({} seats)",
                seat, capacity
            )));
        }
        let total_amount = trip.route.price * Decimal::from(seat_numbers.len());

        info!(step = %CommitStep::CheckSeats, trip_id, seats = ?seat_numbers);
        let availability = self.seats.check_availability(trip_id, &seat_numbers).await?;
        if !availability.available {
            return Err(AppError::Conflict(format!(
                "Seats already reserved: {}",
                join_seats(&availability.unavailable_seats)
            )));
        }
        if trip.available_seats < seat_numbers.len() as i32 {
            return Err(AppError::Conflict(
                "Not enough seats available on this trip".into(),
            ));
        }

        info!(step = %CommitStep::UpsertPassenger, trip_id);
        let passenger_id = self.passengers.upsert_passenger(&request.passenger).await?;

        info!(step = %CommitStep::InsertReservation, trip_id, passenger_id);
        let confirmation_code = generate_confirmation_code();
        let reservation_id = self
            .store
            .insert_reservation(&NewReservation {
                trip_id,
                passenger_id,
                passenger_name: request.passenger.full_name(),
                passenger_email: request.passenger.email.clone(),
                passenger_phone: request.passenger.phone.clone(),
                passenger_address: request.passenger.address.clone(),
                seat_numbers: seat_numbers.clone(),
                total_amount,
                payment_status: PaymentStatus::Completed,
                payment_method: request.payment.method,
                confirmation_code: confirmation_code.clone(),
                created_at: now,
            })
            .await?;

        let mut soft_failures = Vec::new();

        info!(step = %CommitStep::ReserveSeats, trip_id, reservation_id);
        let claims = self
            .seats
            .reserve_seats(trip_id, &seat_numbers, reservation_id)
            .await;
        if !claims.taken.is_empty() {
            self.abandon(trip_id, reservation_id).await;
            return Err(AppError::Conflict(format!(
                "Seats already reserved: {}",
                join_seats(&claims.taken)
            )));
        }
        if !claims.failed.is_empty() {
            soft_failures.push(CommitStep::ReserveSeats);
        }

        info!(step = %CommitStep::SyncCounter, trip_id);
        if let Err(e) = self.seats.sync_available_seats(trip_id).await {
            warn!(trip_id, error = %e, "Could not synchronize available seats");
            soft_failures.push(CommitStep::SyncCounter);
        }

        info!(step = %CommitStep::CreatePayment, reservation_id);
        let card_last_four = request.payment.card_last_four();
        let payment_id = match self
            .store
            .insert_payment(&NewPayment {
                reservation_id,
                amount: total_amount,
                payment_method: request.payment.method,
                card_last_four: card_last_four.clone(),
                transaction_id: generate_transaction_id(now),
                receipt_url: None,
                status: PaymentStatus::Completed,
            })
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(reservation_id, error = %e, "Could not record payment");
                soft_failures.push(CommitStep::CreatePayment);
                None
            }
        };

        info!(step = %CommitStep::GenerateInvoice, reservation_id);
        let trip_info = TripInfo::from(&trip);
        let invoice = InvoiceData {
            reservation_id,
            confirmation_code: confirmation_code.clone(),
            passenger: InvoicePassenger::from(&request.passenger),
            trip: InvoiceTrip::from_info(&trip_info, DEFAULT_BUS_TYPE),
            seats: seat_numbers.clone(),
            total: total_amount,
            payment_method: request.payment.method,
            card_last_four,
            created_at: now,
        };
        let invoice_url = match generate_invoice_pdf(&invoice) {
            Ok(pdf) => {
                info!(step = %CommitStep::UploadInvoice, reservation_id, size = pdf.len());
                let upload = self.invoices.upload_invoice(pdf, reservation_id, now).await;
                if upload.stored {
                    if let Some(payment_id) = payment_id {
                        if let Err(e) =
                            self.store.set_payment_receipt(payment_id, &upload.url).await
                        {
                            warn!(payment_id, error = %e, "Could not attach invoice to payment");
                            soft_failures.push(CommitStep::UploadInvoice);
                        }
                    }
                } else {
                    soft_failures.push(CommitStep::UploadInvoice);
                }
                upload.url
            }
            Err(e) => {
                warn!(reservation_id, error = %e, "Could not render invoice");
                soft_failures.push(CommitStep::GenerateInvoice);
                String::new()
            }
        };

        info!(step = %CommitStep::SendEmail, reservation_id);
        let email = InvoiceEmail::from_invoice(&invoice, &invoice_url);
        if !self.emails.send_invoice_email(&email).await {
            soft_failures.push(CommitStep::SendEmail);
        }

        info!(
            reservation_id,
            code = %confirmation_code,
            soft_failures = ?soft_failures,
            "Reservation confirmed"
        );

        Ok(ReservationConfirmation {
            reservation_id,
            passenger_id,
            payment_id,
            confirmation_code,
            booking_status: "Confirmed".to_string(),
            seat_numbers,
            total_amount,
            invoice_url,
            soft_failures,
        })
    }

    // Undo a reservation that lost one of its seats to another booking
    async fn abandon(&self, trip_id: i32, reservation_id: i32) {
        warn!(trip_id, reservation_id, "Seat lost to a concurrent booking, rolling back");
        if let Err(e) = self.seats.release_seats(trip_id, reservation_id).await {
            error!(reservation_id, error = %e, "Could not release seats");
        }
        if let Err(e) = self
            .store
            .set_reservation_status(reservation_id, PaymentStatus::Failed)
            .await
        {
            error!(reservation_id, error = %e, "Could not mark reservation failed");
        }
        if let Err(e) = self.seats.sync_available_seats(trip_id).await {
            error!(trip_id, error = %e, "Could not synchronize available seats");
        }
    }

    pub async fn reservation_by_code(&self, confirmation_code: &str) -> AppResult<Reservation> {
        let code = confirmation_code.trim().to_ascii_uppercase();
        if !is_confirmation_code(&code) {
            return Err(AppError::BadRequest("Invalid confirmation code".into()));
        }
        self.store
            .reservation_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Reservation not found".into()))
    }
}
