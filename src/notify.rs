//! Contact-form email notifications sent through the Resend HTTP API.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailSettings;
use crate::db::models::Contact;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("email request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("email API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends a notification for a stored contact message.
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, contact: &Contact) -> Result<(), NotifyError>;
}

/// Used when no API key or recipient is configured.
pub struct DisabledNotifier;

#[async_trait]
impl ContactNotifier for DisabledNotifier {
    async fn notify(&self, contact: &Contact) -> Result<(), NotifyError> {
        tracing::debug!(contact_id = %contact.id, "Email notifications disabled; skipping");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

pub struct ResendNotifier {
    client: Client,
    api_key: String,
    from: String,
    recipient: String,
}

impl ResendNotifier {
    pub fn new(api_key: String, from: String, recipient: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self {
            client,
            api_key,
            from,
            recipient,
        })
    }
}

#[async_trait]
impl ContactNotifier for ResendNotifier {
    async fn notify(&self, contact: &Contact) -> Result<(), NotifyError> {
        let request = ResendRequest {
            from: &self.from,
            to: [self.recipient.as_str()],
            subject: contact_subject(contact),
            html: render_contact_email(contact, Utc::now()),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(contact_id = %contact.id, "Contact notification sent");
        Ok(())
    }
}

/// Picks the notifier for the configured email settings.
pub fn notifier_from_settings(settings: &EmailSettings) -> Arc<dyn ContactNotifier> {
    let (Some(api_key), Some(recipient)) = (&settings.api_key, &settings.recipient) else {
        tracing::warn!(
            "RESEND_API_KEY or CONTACT_NOTIFICATION_EMAIL not set; contact notifications disabled"
        );
        return Arc::new(DisabledNotifier);
    };

    match ResendNotifier::new(api_key.clone(), settings.from.clone(), recipient.clone()) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::warn!("Contact notifications disabled: {}", e);
            Arc::new(DisabledNotifier)
        }
    }
}

pub fn contact_subject(contact: &Contact) -> String {
    format!("New Contact Form Submission from {}", contact.name)
}

/// Escapes `text` for HTML, rendering line breaks as `<br>`.
fn escape_multiline(text: &str) -> String {
    text.split('\n')
        .map(|line| ammonia::clean_text(line.trim_end_matches('\r')))
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn render_contact_email(contact: &Contact, submitted_at: DateTime<Utc>) -> String {
    let name = ammonia::clean_text(&contact.name);
    let email = ammonia::clean_text(&contact.email);
    let message = escape_multiline(&contact.message);
    let submitted = submitted_at.format("%Y-%m-%d %H:%M:%S UTC");

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333; border-bottom: 2px solid #eee; padding-bottom: 10px;">New Contact Form Submission</h2>
  <div style="margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
  </div>
  <div style="margin: 20px 0;">
    <p><strong>Message:</strong></p>
    <div style="background: #f5f5f5; padding: 15px; border-radius: 5px;">{message}</div>
  </div>
  <p style="color: #999; font-size: 12px; border-top: 1px solid #eee; padding-top: 10px;">
    This is an automated notification from your portfolio contact form.<br>
    Submitted at: {submitted}
  </p>
</div>"#
    )
}
