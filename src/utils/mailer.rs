use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()>;
}

/// Posts mail to an HTTP relay (`{from, to, subject, text}` JSON).
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(url: impl Into<String>, api_key: Option<String>, from: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        let mut request = self.client.post(&self.url).json(&json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": text,
        }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        request
            .send()
            .await
            .context("Mail relay request failed")?
            .error_for_status()
            .context("Mail relay rejected the message")?;

        Ok(())
    }
}

/// Writes mail to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        tracing::info!(to, subject, text, "Mail (not delivered, relay disabled)");
        Ok(())
    }
}

pub fn from_config(config: &Config) -> Result<Arc<dyn Mailer>> {
    match &config.mail_api_url {
        Some(url) => Ok(Arc::new(HttpMailer::new(
            url,
            config.mail_api_key.clone(),
            &config.mail_from,
        )?)),
        None => {
            tracing::warn!("MAIL_API_URL not set, outgoing mail is only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub fn reset_code_message(code: &str, ttl_minutes: u64) -> String {
    format!(
        "Your InternTrack verification code is {code}. It expires in {ttl_minutes} minutes.\n\
         If you did not ask to reset your password you can ignore this email."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_contains_code_and_expiry() {
        let text = reset_code_message("042137", 5);
        assert!(text.contains("042137"));
        assert!(text.contains("5 minutes"));
    }
}
