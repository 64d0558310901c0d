//! # POS Backend
//!
//! The seam between checkout logic and the network.
//!
//! ## Backend Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   SaleSubmitter / inventory loader                                      │
//! │            │                                                            │
//! │            │  Arc<dyn PosBackend>                                       │
//! │            ▼                                                            │
//! │   ┌─────────────────┐        ┌─────────────────────────────────┐       │
//! │   │  HttpBackend    │  HTTP  │  POS backend                    │       │
//! │   │  (reqwest)      │───────►│  GET  /customer/stock           │       │
//! │   │                 │        │  POST /customer/sell            │       │
//! │   └─────────────────┘        └─────────────────────────────────┘       │
//! │                                                                         │
//! │   Tests plug in fakes that implement the same trait.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Handling
//! - 2xx: body decoded as an envelope; `success = false` → rejection, whatever
//!   `data` holds; undecodable → `Malformed`
//! - non-2xx: `Rejected` with the status and the body's `message` if any
//! - transport failure: `Network` or `Timeout`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::context::SessionContext;
use crate::error::{BackendError, BackendResult, ClientError, ClientResult};
use crate::wire::{ApiEnvelope, ErrorBody, SaleOutcome, SaleRequest, StockListResponse, StockRecord};

const STOCK_PATH: &str = "customer/stock";
const SELL_PATH: &str = "customer/sell";

// =============================================================================
// Backend Trait
// =============================================================================

/// Everything the client needs from the POS backend.
///
/// The session is passed on every call; implementations hold no credentials.
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// Fetches the current stock list.
    async fn fetch_inventory(&self, session: &SessionContext) -> BackendResult<Vec<StockRecord>>;

    /// Commits one sale. Called at most once per checkout attempt.
    async fn commit_sale(
        &self,
        session: &SessionContext,
        request: &SaleRequest,
    ) -> BackendResult<SaleOutcome>;
}

// =============================================================================
// HTTP Backend
// =============================================================================

/// `PosBackend` over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    stock_url: Url,
    sell_url: Url,
    inventory_timeout: std::time::Duration,
}

impl HttpBackend {
    /// Builds the client from configuration.
    ///
    /// The overall sale timeout is enforced by the submitter, not here, so a
    /// slow backend surfaces as `NetworkTimeout` with the configured bound.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base = base_url(&config.api.base_url)?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        Ok(HttpBackend {
            client,
            stock_url: base.join(STOCK_PATH)?,
            sell_url: base.join(SELL_PATH)?,
            inventory_timeout: config.inventory_timeout(),
        })
    }

    fn headers(&self, session: &SessionContext) -> BackendResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&session.bearer())
            .map_err(|e| BackendError::Network(format!("invalid auth header: {e}")))?;
        headers.insert(AUTHORIZATION, value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Decodes a 2xx body or turns a non-2xx one into `Rejected`.
    async fn decode<T: DeserializeOwned>(resp: Response) -> BackendResult<T> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_status_message(status));
            warn!(status = status.as_u16(), message = %message, "Backend returned error status");
            return Err(BackendError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Undecodable backend response");
            BackendError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl PosBackend for HttpBackend {
    async fn fetch_inventory(&self, session: &SessionContext) -> BackendResult<Vec<StockRecord>> {
        debug!(url = %self.stock_url, "Fetching stock list");
        let resp = self
            .client
            .get(self.stock_url.clone())
            .headers(self.headers(session)?)
            .timeout(self.inventory_timeout)
            .send()
            .await?;

        let body: StockListResponse = Self::decode(resp).await?;
        body.into_records()
    }

    async fn commit_sale(
        &self,
        session: &SessionContext,
        request: &SaleRequest,
    ) -> BackendResult<SaleOutcome> {
        debug!(url = %self.sell_url, items = request.items.len(), "Posting sale");
        let resp = self
            .client
            .post(self.sell_url.clone())
            .headers(self.headers(session)?)
            .json(request)
            .send()
            .await?;

        let envelope: ApiEnvelope = Self::decode(resp).await?;
        SaleOutcome::from_envelope(envelope).inspect_err(|e| {
            error!(error = %e, "Sale response carried no usable sale record");
        })
    }
}

/// Parses the base URL and makes sure `join` appends instead of replacing
/// the last path segment.
fn base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Session expired. Sign in again".to_string(),
        other => format!(
            "Server returned {}",
            other.canonical_reason().unwrap_or(other.as_str())
        ),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
