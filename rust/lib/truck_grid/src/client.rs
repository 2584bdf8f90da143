//! HTTP implementation of [`TruckService`].
//!
//! # Usage
//!
//! ```ignore
//! use truck_grid::HttpTruckService;
//!
//! let service = HttpTruckService::new("http://localhost:8080", "trucks");
//! let page = service.list_trucks(25, 0, "number DESC", "brand+=+Volvo").await?;
//! ```

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GridConfig;
use crate::error::ApiError;
use crate::model::{Truck, TruckId};
use crate::service::TruckService;

/// Count endpoint answer: either `{"count": n}` or a bare integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountResponse {
    Wrapped { count: u64 },
    Bare(u64),
}

impl CountResponse {
    fn value(self) -> u64 {
        match self {
            CountResponse::Wrapped { count } => count,
            CountResponse::Bare(n) => n,
        }
    }
}

/// JSON-over-HTTP truck service.
///
/// Paths: `{base_url}/{resource}` for the collection, `/{id}` for one
/// truck, `/count` for the row count.
pub struct HttpTruckService {
    http: reqwest::Client,
    base_url: String,
    resource: String,
}

impl HttpTruckService {
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resource: resource.into().trim_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.base_url.clone(), config.resource.clone())
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, self.resource)
    }

    fn item_url(&self, id: TruckId) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    fn count_url(&self) -> String {
        format!("{}/count", self.collection_url())
    }

    /// Map a non-2xx response to `ApiError::Server`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server { status: code, message: body });
        }
        Ok(resp)
    }

    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }
}

#[async_trait::async_trait]
impl TruckService for HttpTruckService {
    async fn list_trucks(
        &self,
        limit: usize,
        offset: usize,
        order: &str,
        filter: &str,
    ) -> Result<Vec<Truck>, ApiError> {
        debug!(limit, offset, order, filter, "GET trucks");
        let limit = limit.to_string();
        let offset = offset.to_string();
        let resp = self
            .http
            .get(self.collection_url())
            .query(&[
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
                ("order", order),
                ("filter", filter),
            ])
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn count_trucks(&self, filter: &str) -> Result<u64, ApiError> {
        let resp = self
            .http
            .get(self.count_url())
            .query(&[("filter", filter)])
            .send()
            .await?;
        Self::parse::<CountResponse>(resp).await.map(CountResponse::value)
    }

    async fn update_truck(&self, truck: &Truck) -> Result<(), ApiError> {
        let resp = self.http.put(self.item_url(truck.id)).json(truck).send().await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn insert_truck(&self, truck: &Truck) -> Result<(), ApiError> {
        let resp = self.http.post(self.collection_url()).json(truck).send().await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn delete_truck(&self, id: TruckId) -> Result<(), ApiError> {
        let resp = self.http.delete(self.item_url(id)).send().await?;
        Self::check(resp).await.map(|_| ())
    }
}
