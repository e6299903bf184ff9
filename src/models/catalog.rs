use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Capacity assumed for a trip whose bus row is missing.
pub const DEFAULT_BUS_CAPACITY: i32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Route {
    pub id: i32,
    pub origin: String,
    pub destination: String,
    pub duration_minutes: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bus {
    pub id: i32,
    pub bus_number: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schedule {
    pub id: i32,
    pub route_id: i32,
    pub departure_time: NaiveTime,
    pub days_of_week: Vec<u8>,
}

// Trip Status Enum, stored as lowercase text
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TripStatus {
    Active,
    Cancelled,
    Completed,
}

/// A dated departure joined with its schedule, route and bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TripDetail {
    pub id: i32,
    pub trip_date: NaiveDate,
    pub available_seats: i32,
    pub status: TripStatus,
    pub schedule: Schedule,
    pub route: Route,
    pub bus: Option<Bus>,
}

impl TripDetail {
    pub fn capacity(&self) -> i32 {
        self.bus
            .as_ref()
            .map(|bus| bus.capacity)
            .unwrap_or(DEFAULT_BUS_CAPACITY)
    }

    pub fn departure_time(&self) -> NaiveTime {
        self.schedule.departure_time
    }

    /// Departure plus route duration, wrapping past midnight. `None` when the
    /// route has no duration recorded.
    pub fn arrival_time(&self) -> Option<NaiveTime> {
        if self.route.duration_minutes <= 0 {
            return None;
        }
        let (arrival, _) = self
            .departure_time()
            .overflowing_add_signed(Duration::minutes(i64::from(self.route.duration_minutes)));
        Some(arrival)
    }

    pub fn matches_route(&self, origin: &str, destination: &str) -> bool {
        self.route.origin == origin && self.route.destination == destination
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CityOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TripSearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub min_available_seats: Option<i32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct TripSearchResponse {
    pub trips: Vec<TripSummary>,
}

// Single trip row in TripSearchResponse
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TripSummary {
    pub trip_id: i32,
    pub origin: String,
    pub destination: String,
    pub trip_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub departure_label: String,
    pub duration: String,
    pub price: Decimal,
    pub available_seats: i32,
    pub bus_number: Option<String>,
}

impl From<&TripDetail> for TripSummary {
    fn from(trip: &TripDetail) -> Self {
        TripSummary {
            trip_id: trip.id,
            origin: trip.route.origin.clone(),
            destination: trip.route.destination.clone(),
            trip_date: trip.trip_date,
            departure_time: trip.departure_time(),
            departure_label: format_departure_time(trip.departure_time()),
            duration: format_duration(trip.route.duration_minutes),
            price: trip.route.price,
            available_seats: trip.available_seats,
            bus_number: trip.bus.as_ref().map(|bus| bus.bus_number.clone()),
        }
    }
}

/// Trip facts printed on invoices and confirmation emails.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TripInfo {
    pub trip_date: NaiveDate,
    pub bus_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub arrival_time: Option<NaiveTime>,
    pub price: Decimal,
}

impl From<&TripDetail> for TripInfo {
    fn from(trip: &TripDetail) -> Self {
        TripInfo {
            trip_date: trip.trip_date,
            bus_number: trip
                .bus
                .as_ref()
                .map(|bus| bus.bus_number.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            origin: trip.route.origin.clone(),
            destination: trip.route.destination.clone(),
            departure_time: trip.departure_time(),
            arrival_time: trip.arrival_time(),
            price: trip.route.price,
        }
    }
}

// 150 -> "2h 30m", 120 -> "2h"
pub fn format_duration(duration_minutes: i32) -> String {
    let hours = duration_minutes / 60;
    let minutes = duration_minutes % 60;
    if minutes == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

pub fn format_departure_time(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}
