pub mod catalog_service;
pub mod email_service;
pub mod invoice_service;
pub mod passenger_service;
pub mod reservation_service;
pub mod seat_service;
