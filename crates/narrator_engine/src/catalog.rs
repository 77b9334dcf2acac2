use std::time::Duration;

use narrator_core::ModelEntry;
use narrator_logging::{narrator_info, narrator_warn};
use serde::Deserialize;

use crate::{CatalogUnavailable, ServiceEndpoints};

#[async_trait::async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Entries in server order.
    async fn fetch_all(&self) -> Result<Vec<ModelEntry>, CatalogUnavailable>;
}

#[derive(Debug, Deserialize)]
struct WireModel {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "display_name", alias = "displayName")]
    name: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestModelCatalog {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    timeout: Duration,
}

impl ReqwestModelCatalog {
    pub fn new(client: reqwest::Client, endpoints: ServiceEndpoints, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ModelCatalog for ReqwestModelCatalog {
    async fn fetch_all(&self) -> Result<Vec<ModelEntry>, CatalogUnavailable> {
        let unavailable = |reason: String| CatalogUnavailable { reason };

        let response = self
            .client
            .get(self.endpoints.models())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("http status {}", status.as_u16())));
        }
        let wire: Vec<WireModel> = response
            .json()
            .await
            .map_err(|err| unavailable(err.to_string()))?;

        let total = wire.len();
        let entries: Vec<ModelEntry> = wire
            .into_iter()
            .filter_map(|model| {
                let entry = ModelEntry::new(model.id.clone(), model.name);
                if entry.is_none() {
                    narrator_warn!("skipping catalog entry with blank fields: id={:?}", model.id);
                }
                entry
            })
            .collect();

        narrator_info!("model catalog loaded: {} of {} entries usable", entries.len(), total);
        Ok(entries)
    }
}
