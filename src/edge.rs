//! Edge functions client
//!
//! The storefront's delivery calculator, inventory tracker, notification senders and CRM sync
//! run as hosted serverless functions. Each takes a JSON body and answers with
//! `{"data": ...}` on success or `{"error": {"code", "message"}}` on failure.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    collaborators::CollaboratorError,
    config::EdgeConfig,
    crm::{CrmSync, SyncType},
    inventory::{ReservationAction, ReservationService},
    notifications::{Notification, Notifier},
    orders::OrderId,
    pricing::money_from_major,
    quotations::QuotationId,
    shipping::{DeliveryCost, DeliveryCostProvider, DeliveryCostRequest, DeliveryType},
};

const DELIVERY_CALCULATOR: &str = "delivery-calculator";
const INVENTORY_TRACKER: &str = "inventory-tracker";
const ORDER_NOTIFICATIONS: &str = "order-notifications";
const QUOTATION_NOTIFICATIONS: &str = "quotation-notifications";
const QUOTATION_CRM_SYNC: &str = "quotation-crm-sync";

/// Errors building the client.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// No base URL was configured.
    #[error("edge functions URL is not configured")]
    MissingUrl,

    /// The HTTP client could not be built.
    #[error("could not build HTTP client")]
    Client(#[from] reqwest::Error),
}

/// HTTP client for the storefront's edge functions.
#[derive(Clone)]
pub struct EdgeFunctionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for EdgeFunctionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeFunctionsClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl EdgeFunctionsClient {
    /// Creates a client for functions served under `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::Client`] if the TLS backend cannot be initialised.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EdgeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::MissingUrl`] when no URL is configured.
    pub fn from_config(config: &EdgeConfig, timeout: Duration) -> Result<Self, EdgeError> {
        let base_url = config
            .functions_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(EdgeError::MissingUrl)?;

        Self::new(base_url, config.functions_key.clone(), timeout)
    }

    fn endpoint(&self, function: &str) -> String {
        format!("{}/functions/v1/{function}", self.base_url)
    }

    /// Calls `function` with `body` and unwraps the `data` envelope.
    async fn invoke<B, R>(&self, function: &'static str, body: &B) -> Result<R, CollaboratorError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(self.endpoint(function)).json(body);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| self.transport(&error))?;
        let status = response.status();
        let text = response.text().await.map_err(|error| self.transport(&error))?;

        debug!(function, status = status.as_u16(), "edge function answered");

        if status.is_success() {
            return serde_json::from_str::<Envelope<R>>(&text)
                .ok()
                .and_then(|envelope| envelope.data)
                .ok_or_else(|| {
                    CollaboratorError::Rejected(format!("{function} returned no data"))
                });
        }

        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
            .ok()
            .and_then(|envelope| envelope.error)
            .map_or_else(|| format!("{function} answered {status}"), |error| {
                format!("{}: {}", error.code, error.message)
            });

        Err(match status {
            StatusCode::CONFLICT => CollaboratorError::Conflict(message),
            StatusCode::NOT_FOUND => CollaboratorError::NotFound,
            _ => CollaboratorError::Rejected(message),
        })
    }

    fn transport(&self, error: &reqwest::Error) -> CollaboratorError {
        if error.is_timeout() {
            CollaboratorError::Timeout(self.timeout)
        } else {
            CollaboratorError::Unavailable(error.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,

    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct DeliveryCostBody<'a> {
    postal_code: Option<&'a str>,
    city: Option<&'a str>,
    delivery_type: DeliveryType,
    #[serde(with = "rust_decimal::serde::float")]
    cart_total: Decimal,
}

#[derive(Debug, Deserialize)]
struct DeliveryCostAnswer {
    #[serde(with = "rust_decimal::serde::float")]
    delivery_cost: Decimal,

    #[serde(default)]
    free_delivery: bool,
}

#[derive(Debug, Serialize)]
struct ReservationBody {
    order_id: OrderId,
    action: ReservationAction,
}

#[derive(Debug, Serialize)]
struct OrderNotificationBody<'a> {
    order_id: Uuid,
    notification_type: &'a str,
    recipient_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotationNotificationBody<'a> {
    quotation_id: Uuid,
    event_type: &'a str,
    recipient_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CrmSyncBody {
    quotation_id: QuotationId,
    sync_type: SyncType,
}

/// Acknowledgement bodies are not inspected.
#[derive(Debug, Deserialize)]
struct Ack {}

#[async_trait]
impl DeliveryCostProvider for EdgeFunctionsClient {
    async fn delivery_cost(
        &self,
        request: DeliveryCostRequest,
    ) -> Result<DeliveryCost, CollaboratorError> {
        let currency = request.cart_total.currency();

        let body = DeliveryCostBody {
            postal_code: request.postal_code.as_deref(),
            city: request.city.as_deref(),
            delivery_type: request.delivery_type,
            cart_total: *request.cart_total.amount(),
        };

        let answer: DeliveryCostAnswer = self.invoke(DELIVERY_CALCULATOR, &body).await?;

        Ok(DeliveryCost {
            cost: money_from_major(answer.delivery_cost, currency),
            free_delivery: answer.free_delivery,
        })
    }
}

#[async_trait]
impl ReservationService for EdgeFunctionsClient {
    async fn apply(
        &self,
        order_id: OrderId,
        action: ReservationAction,
    ) -> Result<(), CollaboratorError> {
        let body = ReservationBody {
            order_id,
            action,
        };

        self.invoke::<_, Ack>(INVENTORY_TRACKER, &body).await?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for EdgeFunctionsClient {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        let event = notification.event.as_str();
        let recipient = notification.recipient.as_str();

        if notification.event.is_quotation_event() {
            let body = QuotationNotificationBody {
                quotation_id: notification.entity_id,
                event_type: event,
                recipient_type: recipient,
            };

            self.invoke::<_, Ack>(QUOTATION_NOTIFICATIONS, &body).await?;
        } else {
            let body = OrderNotificationBody {
                order_id: notification.entity_id,
                notification_type: event,
                recipient_type: recipient,
            };

            self.invoke::<_, Ack>(ORDER_NOTIFICATIONS, &body).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CrmSync for EdgeFunctionsClient {
    async fn sync_quotation(
        &self,
        quotation_id: QuotationId,
        sync_type: SyncType,
    ) -> Result<(), CollaboratorError> {
        let body = CrmSyncBody {
            quotation_id,
            sync_type,
        };

        self.invoke::<_, Ack>(QUOTATION_CRM_SYNC, &body).await?;

        Ok(())
    }
}
