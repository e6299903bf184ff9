//! Runtime configuration, read from the environment (after `.env`).

use crate::clients::email::EmailJsSettings;
use crate::utils::error::{AppError, AppResult};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    /// Hosted backend endpoint serving object storage
    pub storage_url: String,
    /// Public API key of the hosted backend
    pub storage_api_key: String,
    pub http_timeout: Duration,
    pub email: EmailJsSettings,
    pub log_level: String,
}

fn required(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Configuration(format!("{} must be set", name))),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| {
                AppError::Configuration(format!("{} has an invalid value: {}", name, raw))
            }),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            database_acquire_timeout: Duration::from_secs(parsed("DATABASE_ACQUIRE_TIMEOUT", 3)?),
            storage_url: required("STORAGE_URL")?,
            storage_api_key: required("STORAGE_API_KEY")?,
            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 10)?),
            email: EmailJsSettings {
                service_id: optional("EMAILJS_SERVICE_ID")
                    .unwrap_or_else(|| "service_busreserva".to_string()),
                template_id: optional("EMAILJS_TEMPLATE_ID")
                    .unwrap_or_else(|| "template_invoice".to_string()),
                public_key: optional("EMAILJS_PUBLIC_KEY"),
                company_name: optional("COMPANY_NAME").unwrap_or_else(|| "BusReserva".to_string()),
                support_email: optional("SUPPORT_EMAIL")
                    .unwrap_or_else(|| "soporte@busreserva.com".to_string()),
            },
            log_level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
