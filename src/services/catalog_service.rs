use crate::models::catalog::{
    CityOption, Route, TripDetail, TripInfo, TripSearchQuery, TripSearchResponse, TripSummary,
};
use crate::store::ReservationStore;
use crate::utils::error::{AppError, AppResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ReservationStore>,
}

// Both cities are required and must differ
pub fn validate_search(origin: &str, destination: &str) -> AppResult<()> {
    if origin.trim().is_empty() || destination.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Origin, destination and date are required".into(),
        ));
    }
    if origin == destination {
        return Err(AppError::ValidationError(
            "Origin and destination cannot be the same".into(),
        ));
    }
    Ok(())
}

impl CatalogService {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        CatalogService { store }
    }

    pub async fn list_routes(&self) -> AppResult<Vec<Route>> {
        self.store.list_routes().await
    }

    // Every city that appears as an origin or destination, sorted
    pub async fn city_options(&self) -> AppResult<Vec<CityOption>> {
        let routes = self.store.list_routes().await?;
        let cities: BTreeSet<String> = routes
            .into_iter()
            .flat_map(|route| [route.origin, route.destination])
            .collect();

        Ok(cities
            .into_iter()
            .map(|city| CityOption {
                value: city.clone(),
                label: city,
            })
            .collect())
    }

    // Search active trips with seats left on the given date
    pub async fn search_trips(&self, query: TripSearchQuery) -> AppResult<TripSearchResponse> {
        validate_search(&query.origin, &query.destination)?;
        let min_seats = query.min_available_seats.unwrap_or(1).max(1);

        let candidates = self.store.trips_on(query.date, min_seats).await?;
        let total = candidates.len();

        // The store may compare text case-insensitively; route match is exact
        let trips: Vec<TripSummary> = candidates
            .iter()
            .filter(|trip| trip.matches_route(&query.origin, &query.destination))
            .map(TripSummary::from)
            .collect();

        debug!(
            origin = %query.origin,
            destination = %query.destination,
            date = %query.date,
            candidates = total,
            matched = trips.len(),
            "Trip search"
        );

        Ok(TripSearchResponse { trips })
    }

    pub async fn trip(&self, trip_id: i32) -> AppResult<TripDetail> {
        self.store
            .trip(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".into()))
    }

    pub async fn trip_info(&self, trip_id: i32) -> AppResult<TripInfo> {
        let trip = self.trip(trip_id).await?;
        Ok(TripInfo::from(&trip))
    }
}
