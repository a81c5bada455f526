use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub enum NotifyStatus {
    Success,
    Warning,
    Error,
    Info,
}

impl NotifyStatus {
    fn color(self) -> &'static str {
        match self {
            NotifyStatus::Success => "good",
            NotifyStatus::Warning => "warning",
            NotifyStatus::Error => "danger",
            NotifyStatus::Info => "#36a64f",
        }
    }

    fn label(self) -> &'static str {
        match self {
            NotifyStatus::Success => "SUCCESS",
            NotifyStatus::Warning => "WARNING",
            NotifyStatus::Error => "ERROR",
            NotifyStatus::Info => "INFO",
        }
    }
}

/// Posts Slack-format notifications to an optional webhook. Delivery
/// failures are logged and swallowed; a broken webhook must not change the
/// outcome of a cleanup run.
pub struct Notifier {
    webhook_url: Option<Url>,
    subscription_id: String,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(webhook_url: Option<Url>, subscription_id: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");
        Self {
            webhook_url,
            subscription_id,
            http,
        }
    }

    pub async fn notify(&self, message: &str, status: NotifyStatus) {
        let Some(url) = self.webhook_url.as_ref() else {
            return;
        };

        let payload = json!({
            "text": format!("Azure demo cleanup: {}", status.label()),
            "attachments": [{
                "color": status.color(),
                "fields": [
                    { "title": "Subscription", "value": self.subscription_id, "short": true },
                    { "title": "Message", "value": message, "short": false },
                    {
                        "title": "Timestamp",
                        "value": Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                        "short": true
                    },
                ]
            }]
        });

        match self.http.post(url.clone()).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("webhook notification sent");
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "webhook notification rejected");
            }
            Err(e) => {
                warn!(error = %e, "failed to send webhook notification");
            }
        }
    }
}
