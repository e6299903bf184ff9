use crate::models::catalog::{
    CityOption, Route, TripDetail, TripInfo, TripSearchQuery, TripSearchResponse,
};
use crate::services::catalog_service::CatalogService;
use crate::utils::error::AppError;
use chrono::NaiveDate;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

/// List all routes
#[openapi(tag = "Catalog")]
#[get("/routes")]
pub async fn list_routes(
    catalog_service: &State<CatalogService>,
) -> Result<Json<Vec<Route>>, AppError> {
    let routes = catalog_service.list_routes().await?;
    Ok(Json(routes))
}

/// Cities offered as origin or destination
#[openapi(tag = "Catalog")]
#[get("/cities")]
pub async fn list_cities(
    catalog_service: &State<CatalogService>,
) -> Result<Json<Vec<CityOption>>, AppError> {
    let cities = catalog_service.city_options().await?;
    Ok(Json(cities))
}

/// Search trips
#[openapi(tag = "Trips")]
#[get("/trips/search?<origin>&<destination>&<date>&<min_seats>")]
pub async fn search_trips(
    origin: String,
    destination: String,
    date: String,
    min_seats: Option<i32>,
    catalog_service: &State<CatalogService>,
) -> Result<Json<TripSearchResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format".into()))?;

    let query = TripSearchQuery {
        origin,
        destination,
        date,
        min_available_seats: min_seats,
    };
    let trips = catalog_service.search_trips(query).await?;
    Ok(Json(trips))
}

/// Trip with its schedule, route and bus
#[openapi(tag = "Trips")]
#[get("/trips/<trip_id>")]
pub async fn get_trip(
    trip_id: i32,
    catalog_service: &State<CatalogService>,
) -> Result<Json<TripDetail>, AppError> {
    let trip = catalog_service.trip(trip_id).await?;
    Ok(Json(trip))
}

/// Trip facts shown on the payment page
#[openapi(tag = "Trips")]
#[get("/trips/<trip_id>/info")]
pub async fn get_trip_info(
    trip_id: i32,
    catalog_service: &State<CatalogService>,
) -> Result<Json<TripInfo>, AppError> {
    let info = catalog_service.trip_info(trip_id).await?;
    Ok(Json(info))
}
