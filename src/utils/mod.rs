pub mod codes;
pub mod error;
pub mod swagger_doc;
pub mod validation;
