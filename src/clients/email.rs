use crate::models::invoice::InvoiceEmail;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invoice(&self, email: &InvoiceEmail) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct EmailJsSettings {
    pub service_id: String,
    pub template_id: String,
    pub public_key: Option<String>,
    pub company_name: String,
    pub support_email: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: BTreeMap<&'static str, String>,
}

/// Transactional email through the EmailJS REST API.
#[derive(Clone)]
pub struct EmailJsMailer {
    client: Client,
    settings: EmailJsSettings,
}

impl EmailJsMailer {
    pub fn new(client: Client, settings: EmailJsSettings) -> Self {
        EmailJsMailer {
            client,
            settings,
        }
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send_invoice(&self, email: &InvoiceEmail) -> AppResult<()> {
        let public_key = self
            .settings
            .public_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("EMAILJS_PUBLIC_KEY is not set".into()))?;

        let request = SendRequest {
            service_id: &self.settings.service_id,
            template_id: &self.settings.template_id,
            user_id: public_key,
            template_params: email
                .template_params(&self.settings.company_name, &self.settings.support_email),
        };

        let response = self.client.post(EMAILJS_SEND_URL).json(&request).send().await?;
        let status = response.status();
        // EmailJS answers 200 "OK" on acceptance
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "email API returned {}: {}",
                status, body
            )));
        }

        debug!(to = %email.to_email, code = %email.confirmation_code, "Invoice email accepted");
        Ok(())
    }
}
