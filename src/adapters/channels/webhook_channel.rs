//! Webhook Message Channel - delivers responses to an HTTP channel gateway.
//!
//! The gateway owns the actual WhatsApp/Telegram/etc. integrations. This
//! adapter posts one JSON document per delivery and reads profile data
//! back from `GET {base_url}/users/{business_unit}/{person_id}`.
//!
//! Status mapping: 2xx is success, 404 on profile lookups is "no data",
//! 408/429/5xx and network timeouts are transient, any other status is
//! permanent.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::foundation::{BusinessUnitId, PersonId};
use crate::ports::{ChannelError, MenuPayload, MessageChannel};

/// Configuration for the webhook channel.
#[derive(Debug, Clone)]
pub struct WebhookChannelConfig {
    pub name: String,
    pub base_url: String,
    token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl WebhookChannelConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Secret::new(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutboundPayload<'a> {
    Message {
        business_unit: &'a str,
        person_id: &'a str,
        text: &'a str,
    },
    Menu {
        business_unit: &'a str,
        person_id: &'a str,
        title: &'a str,
        items: &'a [String],
    },
    Options {
        business_unit: &'a str,
        person_id: &'a str,
        text: &'a str,
        options: &'a [String],
    },
}

/// HTTP gateway channel.
pub struct WebhookChannel {
    config: WebhookChannelConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookChannelConfig) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChannelError::Permanent(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.base_url)
    }

    fn user_url(&self, business_unit: &BusinessUnitId, person_id: &PersonId) -> String {
        format!(
            "{}/users/{}/{}",
            self.config.base_url,
            business_unit.as_str(),
            person_id.as_str()
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn post(&self, payload: &OutboundPayload<'_>) -> Result<(), ChannelError> {
        let response = self
            .authorize(self.client.post(self.messages_url()))
            .json(payload)
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response).await.map(|_| ())
    }
}

fn map_send_error(e: reqwest::Error) -> ChannelError {
    if e.is_timeout() || e.is_connect() {
        ChannelError::Transient(e.to_string())
    } else {
        ChannelError::Permanent(e.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> ChannelError {
    let message = format!("Gateway returned {}: {}", status, body);
    match status.as_u16() {
        408 | 429 | 500..=599 => ChannelError::Transient(message),
        _ => ChannelError::Permanent(message),
    }
}

async fn check_status(response: Response) -> Result<Response, ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

#[async_trait]
impl MessageChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn send_message(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.post(&OutboundPayload::Message {
            business_unit: business_unit.as_str(),
            person_id: person_id.as_str(),
            text,
        })
        .await
    }

    async fn send_menu(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        menu: &MenuPayload,
    ) -> Result<(), ChannelError> {
        self.post(&OutboundPayload::Menu {
            business_unit: business_unit.as_str(),
            person_id: person_id.as_str(),
            title: &menu.title,
            items: &menu.items,
        })
        .await
    }

    async fn send_options(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
        text: &str,
        options: &[String],
    ) -> Result<(), ChannelError> {
        self.post(&OutboundPayload::Options {
            business_unit: business_unit.as_str(),
            person_id: person_id.as_str(),
            text,
            options,
        })
        .await
    }

    async fn fetch_user_data(
        &self,
        business_unit: &BusinessUnitId,
        person_id: &PersonId,
    ) -> Result<Option<Value>, ChannelError> {
        let response = self
            .authorize(self.client.get(self.user_url(business_unit, person_id)))
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let data = response
            .json::<Value>()
            .await
            .map_err(|e| ChannelError::Permanent(format!("Invalid profile payload: {}", e)))?;
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_trims_trailing_slash() {
        let config = WebhookChannelConfig::new("gateway", "http://localhost:9000/");
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let config = WebhookChannelConfig::new("gateway", "http://localhost").with_token("s3cr3t");
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }

    #[test]
    fn builds_user_url() {
        let channel =
            WebhookChannel::new(WebhookChannelConfig::new("gateway", "http://gw")).unwrap();
        let url = channel.user_url(
            &BusinessUnitId::new("amigro").unwrap(),
            &PersonId::new("5215500000000").unwrap(),
        );
        assert_eq!(url, "http://gw/users/amigro/5215500000000");
    }

    #[test]
    fn classifies_statuses() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status(StatusCode::REQUEST_TIMEOUT, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_transient());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, "").is_transient());
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let options = vec!["Sí".to_string(), "No".to_string()];
        let payload = OutboundPayload::Options {
            business_unit: "huntred",
            person_id: "p-1",
            text: "¿Continuar?",
            options: &options,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "kind": "options",
                "business_unit": "huntred",
                "person_id": "p-1",
                "text": "¿Continuar?",
                "options": ["Sí", "No"]
            })
        );
    }
}
