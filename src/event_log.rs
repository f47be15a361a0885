//! Client for the audit logging service.
//!
//! Record changes are reported as `{tipo, documento, detalles}` events to the
//! log service's `POST /logs/` endpoint. Delivery is best effort: callers use
//! [`emit`], which never fails. A broken log service is reported with a
//! `warn` event and otherwise ignored.

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LogServiceConfig;

/// One audit event, in the log service's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    /// Event kind: `CREATE`, `UPDATE`, `DELETE`.
    pub tipo: String,
    /// Id of the affected record.
    pub documento: String,
    pub detalles: String,
}

impl LogEvent {
    pub fn new(
        tipo: impl Into<String>,
        documento: impl Into<String>,
        detalles: impl Into<String>,
    ) -> Self {
        Self {
            tipo: tipo.into(),
            documento: documento.into(),
            detalles: detalles.into(),
        }
    }
}

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn record(&self, event: &LogEvent) -> Result<()>;
}

/// Posts events to `{url}/logs/`.
pub struct HttpEventLog {
    client: Client,
    url: String,
}

impl HttpEventLog {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EventLog for HttpEventLog {
    async fn record(&self, event: &LogEvent) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/logs/", self.url))
            .json(event)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("log service error {}: {}", status, body);
        }
        Ok(())
    }
}

/// Local-only sink used when no log service is configured.
pub struct TracingEventLog;

#[async_trait]
impl EventLog for TracingEventLog {
    async fn record(&self, event: &LogEvent) -> Result<()> {
        tracing::info!(
            tipo = %event.tipo,
            documento = %event.documento,
            detalles = %event.detalles,
            "audit event"
        );
        Ok(())
    }
}

pub fn create_event_log(config: &LogServiceConfig) -> Result<Arc<dyn EventLog>> {
    match &config.url {
        Some(url) => Ok(Arc::new(HttpEventLog::new(
            url,
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Arc::new(TracingEventLog)),
    }
}

/// Records an event, swallowing any failure.
pub async fn emit(log: &dyn EventLog, event: LogEvent) {
    if let Err(e) = log.record(&event).await {
        tracing::warn!(
            tipo = %event.tipo,
            documento = %event.documento,
            error = %e,
            "failed to deliver audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_http_event_log_posts_wire_format() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/logs/")
            .match_body(Matcher::Json(json!({
                "tipo": "CREATE",
                "documento": "100",
                "detalles": "Creación de persona: Maria Lopez"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let log = HttpEventLog::new(&format!("{}/", server.url()), Duration::from_secs(5)).unwrap();
        log.record(&LogEvent::new("CREATE", "100", "Creación de persona: Maria Lopez"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_event_log_reports_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/logs/")
            .with_status(500)
            .create_async()
            .await;

        let log = HttpEventLog::new(&server.url(), Duration::from_secs(5)).unwrap();
        assert!(log.record(&LogEvent::new("CREATE", "1", "x")).await.is_err());
    }

    #[tokio::test]
    async fn test_emit_swallows_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let log = HttpEventLog::new(&format!("http://{}", addr), Duration::from_secs(1)).unwrap();
        // Must return normally even though nothing is listening.
        emit(&log, LogEvent::new("DELETE", "1", "x")).await;
    }

    #[test]
    fn test_create_event_log_without_url_is_local() {
        assert!(create_event_log(&LogServiceConfig::default()).is_ok());
    }
}
