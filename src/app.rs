//! Rocket assembly shared by the binary and the HTTP tests.

use crate::clients::email::Mailer;
use crate::clients::object_storage::ObjectStorage;
use crate::routes;
use crate::services::catalog_service::CatalogService;
use crate::services::reservation_service::ReservationService;
use crate::services::seat_service::SeatService;
use crate::store::ReservationStore;
use crate::swagger::swagger_ui;
use rocket::fairing::AdHoc;
use rocket::http::Header;
use rocket::{Build, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::make_swagger_ui;
use std::sync::Arc;

/// Services placed in Rocket's managed state.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub seats: SeatService,
    pub reservations: ReservationService,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        storage: Arc<dyn ObjectStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AppServices {
            catalog: CatalogService::new(store.clone()),
            seats: SeatService::new(store.clone()),
            reservations: ReservationService::new(store, storage, mailer),
        }
    }
}

pub fn build(services: AppServices) -> Rocket<Build> {
    rocket::build()
        .manage(services.catalog)
        .manage(services.seats)
        .manage(services.reservations)
        .mount(
            "/api",
            openapi_get_routes![
                routes::catalog_route::list_routes,
                routes::catalog_route::list_cities,
                routes::catalog_route::search_trips,
                routes::catalog_route::get_trip,
                routes::catalog_route::get_trip_info,
                routes::seat_route::get_seat_map,
                routes::seat_route::check_seat_availability,
                routes::reservation_route::create_reservation,
                routes::reservation_route::get_reservation,
                routes::admin_route::sync_trips,
            ],
        )
        .mount("/swagger", make_swagger_ui(&swagger_ui()))
        .attach(AdHoc::on_response("CORS", |_, res| {
            Box::pin(async move {
                res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
                res.set_header(Header::new(
                    "Access-Control-Allow-Methods",
                    "GET, POST, OPTIONS",
                ));
                res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
            })
        }))
}
