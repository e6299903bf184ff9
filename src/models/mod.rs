pub mod catalog;
pub mod invoice;
pub mod passenger;
pub mod payment;
pub mod reservation;
pub mod seat;
