use crate::models::catalog::TripInfo;
use crate::models::passenger::PassengerForm;
use crate::models::payment::PaymentMethod;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePassenger {
    pub first_name: String,
    pub last_name: String,
    pub identification: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl From<&PassengerForm> for InvoicePassenger {
    fn from(form: &PassengerForm) -> Self {
        InvoicePassenger {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            identification: form.identification.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceTrip {
    pub origin: String,
    pub destination: String,
    pub trip_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub bus_number: String,
    pub bus_type: String,
}

impl InvoiceTrip {
    pub fn from_info(info: &TripInfo, bus_type: &str) -> Self {
        InvoiceTrip {
            origin: info.origin.clone(),
            destination: info.destination.clone(),
            trip_date: info.trip_date,
            departure_time: info.departure_time,
            bus_number: info.bus_number.clone(),
            bus_type: bus_type.to_string(),
        }
    }
}

/// Everything printed on an invoice. Rendering is a pure function of this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceData {
    pub reservation_id: i32,
    pub confirmation_code: String,
    pub passenger: InvoicePassenger,
    pub trip: InvoiceTrip,
    pub seats: Vec<i32>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub card_last_four: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InvoiceData {
    pub fn unit_price(&self) -> Decimal {
        if self.seats.is_empty() {
            return self.total;
        }
        self.total / Decimal::from(self.seats.len())
    }

    pub fn passenger_name(&self) -> String {
        format!("{} {}", self.passenger.first_name, self.passenger.last_name)
    }
}

/// Named variables handed to the transactional email template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceEmail {
    pub to_email: String,
    pub to_name: String,
    pub confirmation_code: String,
    pub invoice_url: String,
    pub trip_origin: String,
    pub trip_destination: String,
    pub departure_date: String,
    pub departure_time: String,
    pub bus_number: String,
    pub seat_numbers: String,
    pub total_amount: String,
    pub passenger_name: String,
}

impl InvoiceEmail {
    pub fn from_invoice(invoice: &InvoiceData, invoice_url: &str) -> Self {
        let name = invoice.passenger_name();
        InvoiceEmail {
            to_email: invoice.passenger.email.clone(),
            to_name: name.clone(),
            confirmation_code: invoice.confirmation_code.clone(),
            invoice_url: invoice_url.to_string(),
            trip_origin: invoice.trip.origin.clone(),
            trip_destination: invoice.trip.destination.clone(),
            departure_date: invoice.trip.trip_date.format("%A, %B %-d, %Y").to_string(),
            departure_time: invoice.trip.departure_time.format("%H:%M").to_string(),
            bus_number: invoice.trip.bus_number.clone(),
            seat_numbers: join_seats(&invoice.seats),
            total_amount: format!("{:.2}", invoice.total),
            passenger_name: name,
        }
    }

    pub fn subject(&self) -> String {
        format!("Reservation confirmation - {}", self.confirmation_code)
    }

    pub fn template_params(
        &self,
        company_name: &str,
        support_email: &str,
    ) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("email", self.to_email.clone()),
            ("to_name", self.to_name.clone()),
            ("confirmation_code", self.confirmation_code.clone()),
            ("invoice_url", self.invoice_url.clone()),
            ("trip_details", format!("{} → {}", self.trip_origin, self.trip_destination)),
            ("departure_date", self.departure_date.clone()),
            ("departure_time", self.departure_time.clone()),
            ("bus_number", self.bus_number.clone()),
            ("seat_numbers", self.seat_numbers.clone()),
            ("total_amount", self.total_amount.clone()),
            ("passenger_name", self.passenger_name.clone()),
            ("company_name", company_name.to_string()),
            ("support_email", support_email.to_string()),
        ])
    }
}

pub fn join_seats(seats: &[i32]) -> String {
    seats
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
