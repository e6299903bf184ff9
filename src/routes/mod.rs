pub mod admin_route;
pub mod catalog_route;
pub mod reservation_route;
pub mod seat_route;
