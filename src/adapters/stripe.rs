use crate::config::PaymentConfig;
use crate::domain::model::{CheckoutRequest, CheckoutSession};
use crate::domain::ports::PaymentGateway;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Stripe hosted checkout (`/v1/checkout/sessions`)
#[derive(Debug, Clone)]
pub struct StripeCheckout {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl StripeCheckout {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.api_base)
    }

    fn form_for(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("client_reference_id", request.order_id.clone()),
            ("metadata[order_id]", request.order_id.clone()),
            ("metadata[event_id]", request.event_id.clone()),
            (
                "line_items[0][price_data][currency]",
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            ("line_items[0][quantity]", request.quantity.to_string()),
        ]
    }

    async fn parse_session(response: Response) -> Result<CheckoutSession> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<CheckoutSession>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<StripeErrorBody>(&body) {
            Ok(parsed) => format!(
                "{} ({})",
                parsed
                    .error
                    .message
                    .unwrap_or_else(|| "no message".to_string()),
                parsed.error.kind.unwrap_or_else(|| "unknown_error".to_string())
            ),
            Err(_) => format!("HTTP {}", status),
        };

        Err(LensError::PaymentError { message })
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckout {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        tracing::debug!(
            "Creating checkout session for order {} ({} x {} {})",
            request.order_id,
            request.quantity,
            request.unit_amount,
            request.currency
        );

        let response = self
            .client
            .post(self.sessions_url())
            .bearer_auth(&self.secret_key)
            .form(&Self::form_for(request))
            .send()
            .await?;

        let session = Self::parse_session(response).await?;
        if session.url.is_none() {
            return Err(LensError::PaymentError {
                message: format!("checkout session {} has no redirect url", session.id),
            });
        }

        Ok(session)
    }

    async fn retrieve_checkout(&self, session_id: &str) -> Result<CheckoutSession> {
        let response = self
            .client
            .get(format!("{}/{}", self.sessions_url(), session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LensError::not_found(format!("checkout session {}", session_id)));
        }

        Self::parse_session(response).await
    }
}
