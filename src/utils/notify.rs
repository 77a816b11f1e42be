use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Push delivery to an intern's device.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, device_token: &str, title: &str, body: &str) -> Result<()>;
}

/// Firebase Cloud Messaging over its HTTP endpoint.
pub struct FcmNotifier {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmNotifier {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        })
    }
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn send(&self, device_token: &str, title: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&json!({
                "to": device_token,
                "notification": { "title": title, "body": body }
            }))
            .send()
            .await
            .context("FCM request failed")?;

        response
            .error_for_status()
            .context("FCM rejected the notification")?;

        Ok(())
    }
}

/// Used when no FCM key is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, _device_token: &str, title: &str, body: &str) -> Result<()> {
        tracing::info!(title, body, "Push notification (not delivered, FCM disabled)");
        Ok(())
    }
}

pub fn from_config(config: &Config) -> Result<Arc<dyn Notifier>> {
    match &config.fcm_server_key {
        Some(key) => Ok(Arc::new(FcmNotifier::new(&config.fcm_endpoint, key)?)),
        None => {
            tracing::warn!("FCM_SERVER_KEY not set, push notifications are only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Best-effort push to an intern. Failures are logged and swallowed.
pub async fn notify_intern(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    intern_id: u64,
    title: &str,
    body: &str,
) {
    let token = match sqlx::query_scalar::<_, Option<String>>(
        "SELECT fcm_token FROM interns WHERE id = ?",
    )
    .bind(intern_id)
    .fetch_optional(pool)
    .await
    {
        Ok(Some(Some(token))) if !token.is_empty() => token,
        Ok(_) => {
            tracing::debug!(intern_id, "No device token, skipping notification");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, intern_id, "Failed to load device token");
            return;
        }
    };

    if let Err(e) = notifier.send(&token, title, body).await {
        tracing::warn!(error = %e, intern_id, "Push notification failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.send("token", "Leave approved", "ok").await.is_ok());
    }

    #[test]
    fn falls_back_to_logging_without_a_key() {
        assert!(from_config(&Config::for_tests()).is_ok());
    }
}
