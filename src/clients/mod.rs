pub mod email;
pub mod object_storage;
