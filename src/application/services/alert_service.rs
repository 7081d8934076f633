//! Fire-and-forget operator alerts posted to a chat webhook.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Backtraces longer than this are cut before being posted.
const MAX_BACKTRACE_BYTES: usize = 4096;

/// What the recovery stage knows about a panicking request.
#[derive(Debug, Clone)]
pub struct PanicReport {
    pub method: String,
    pub path: String,
    pub client_ip: String,
    pub message: String,
    pub backtrace: String,
    pub occurred_at: DateTime<Utc>,
}

impl PanicReport {
    fn render(&self) -> String {
        format!(
            "[{service}] panic recovered\ntime: {time}\nrequest: {method} {path}\nclient: {client}\npanic: {message}\nbacktrace:\n{backtrace}",
            service = env!("CARGO_PKG_NAME"),
            time = self.occurred_at.to_rfc3339(),
            method = self.method,
            path = self.path,
            client = self.client_ip,
            message = self.message,
            backtrace = truncate_at_char_boundary(&self.backtrace, MAX_BACKTRACE_BYTES),
        )
    }
}

/// Text message body understood by Feishu/Lark-style bot webhooks.
#[derive(Debug, Serialize)]
struct WebhookMessage {
    msg_type: &'static str,
    content: WebhookContent,
}

#[derive(Debug, Serialize)]
struct WebhookContent {
    text: String,
}

/// Posts alerts to `ALERT_WEBHOOK_URL` when it is configured.
///
/// Delivery runs on a detached task and is retried a few times with jittered
/// backoff. Failures are logged and otherwise ignored; the request that
/// triggered the alert never waits for it.
pub struct AlertNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl AlertNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();

        Self::with_client(client, webhook_url)
    }

    pub fn with_client(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
        }
    }

    /// A notifier that never sends anything.
    pub fn disabled() -> Self {
        Self::with_client(reqwest::Client::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Spawns delivery of a panic alert.
    ///
    /// Returns `None` when no webhook is configured. The handle is only
    /// useful to tests; production callers drop it.
    pub fn notify_panic(&self, report: PanicReport) -> Option<JoinHandle<()>> {
        let url = self.webhook_url.clone()?;
        let client = self.client.clone();
        let message = WebhookMessage {
            msg_type: "text",
            content: WebhookContent {
                text: report.render(),
            },
        };

        Some(tokio::spawn(async move {
            let strategy = ExponentialBackoff::from_millis(50)
                .map(jitter)
                .take(2);

            let delivery = Retry::start(strategy, || {
                let request = client.post(&url).json(&message);
                async move { request.send().await?.error_for_status() }
            })
            .await;

            match delivery {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "panic alert delivered");
                }
                Err(e) => tracing::warn!(error = %e, "failed to deliver panic alert"),
            }
        }))
    }
}

fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::Value;
    use tokio::sync::mpsc;

    fn report() -> PanicReport {
        PanicReport {
            method: "GET".to_string(),
            path: "/api/v1/examples/1".to_string(),
            client_ip: "10.1.2.3".to_string(),
            message: "index out of bounds".to_string(),
            backtrace: "0: resource_service::handler".to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_disabled_notifier_spawns_nothing() {
        let notifier = AlertNotifier::disabled();
        assert!(!notifier.is_enabled());
        assert!(notifier.notify_panic(report()).is_none());
    }

    #[test]
    fn test_empty_url_counts_as_disabled() {
        assert!(!AlertNotifier::new(Some(String::new())).is_enabled());
    }

    #[test]
    fn test_rendered_text_contains_request_details() {
        let text = report().render();
        assert!(text.contains("GET /api/v1/examples/1"));
        assert!(text.contains("10.1.2.3"));
        assert!(text.contains("index out of bounds"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "ab\u{00e9}cd";
        assert_eq!(truncate_at_char_boundary(text, 3), "ab");
        assert_eq!(truncate_at_char_boundary(text, 4), "ab\u{00e9}");
        assert_eq!(truncate_at_char_boundary("short", 100), "short");
    }

    #[tokio::test]
    async fn test_panic_report_is_posted_to_webhook() {
        let (tx, mut rx) = mpsc::channel::<Value>(1);
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body).await;
                    StatusCode::OK
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let notifier = AlertNotifier::with_client(client, Some(format!("http://{addr}/hook")));

        notifier.notify_panic(report()).unwrap().await.unwrap();

        let body = rx.recv().await.unwrap();
        assert_eq!(body["msg_type"], "text");
        assert!(
            body["content"]["text"]
                .as_str()
                .unwrap()
                .contains("index out of bounds")
        );
    }
}
