use crate::utils::validation::{required, EMAIL_RE, IDENTIFICATION_RE, PHONE_RE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Passenger {
    pub id: i32,
    pub identification: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Registration form filled in before payment.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct PassengerForm {
    #[validate(
        custom(function = "required"),
        regex(
            path = *IDENTIFICATION_RE,
            message = "Identification must have exactly 10 digits"
        )
    )]
    #[schemars(regex(path = "IDENTIFICATION_RE"))]
    pub identification: String,

    #[validate(
        custom(function = "required"),
        length(min = 2, message = "First name must have at least 2 characters")
    )]
    pub first_name: String,

    #[validate(
        custom(function = "required"),
        length(min = 2, message = "Last name must have at least 2 characters")
    )]
    pub last_name: String,

    #[validate(
        custom(function = "required"),
        length(min = 5, message = "Address must have at least 5 characters")
    )]
    pub address: String,

    #[validate(
        custom(function = "required"),
        regex(path = *PHONE_RE, message = "Phone must start with 09 and have 10 digits")
    )]
    #[schemars(regex(path = "PHONE_RE"))]
    pub phone: String,

    #[validate(
        custom(function = "required"),
        regex(path = *EMAIL_RE, message = "Enter a valid email address")
    )]
    #[schemars(regex(path = "EMAIL_RE"))]
    pub email: String,
}

impl PassengerForm {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn to_new_passenger(&self) -> NewPassenger {
        NewPassenger {
            identification: self.identification.clone(),
            name: self.full_name(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassenger {
    pub identification: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}
