use crate::clients::email::Mailer;
use crate::models::invoice::InvoiceEmail;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        EmailService { mailer }
    }

    /// Best-effort delivery of the confirmation email. Returns whether the
    /// provider accepted it; on failure the full message is logged so it can
    /// be sent by hand.
    pub async fn send_invoice_email(&self, email: &InvoiceEmail) -> bool {
        if email.to_email.trim().is_empty() {
            warn!(code = %email.confirmation_code, "Invoice email has no recipient");
            log_fallback(email);
            return false;
        }

        match self.mailer.send_invoice(email).await {
            Ok(()) => {
                info!(to = %email.to_email, code = %email.confirmation_code, "Invoice email sent");
                true
            }
            Err(e) => {
                error!(error = %e, to = %email.to_email, "Invoice email failed");
                log_fallback(email);
                false
            }
        }
    }
}

fn log_fallback(email: &InvoiceEmail) {
    warn!(
        to = %email.to_email,
        subject = %email.subject(),
        passenger = %email.passenger_name,
        route = %format!("{} → {}", email.trip_origin, email.trip_destination),
        date = %email.departure_date,
        time = %email.departure_time,
        bus = %email.bus_number,
        seats = %email.seat_numbers,
        total = %email.total_amount,
        invoice_url = %email.invoice_url,
        "Undelivered invoice email"
    );
}
