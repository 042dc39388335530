//! Price lookup for pre-filling the comparison form.
//!
//! Nothing in `core` depends on this module: a successful lookup only ever
//! produces candidate values for a [`PurchaseDraft`].

mod chain;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::PurchaseDraft;

pub use chain::{Acceptance, PriceChain};
pub use http::{
    DEFAULT_CATALOG_BASE_URL, DEFAULT_FALLBACK_BASE_URL, DEFAULT_SCRAPE_PROXY_URL,
    DEFAULT_SCRAPE_SITE_URL, HttpCatalog, ScrapeProxySource, VariantDetailsSource,
    VersionPriceSource, extract_embedded_number,
};

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no {0} in response")]
    MissingData(&'static str),
    #[error("{source_name} returned no usable prices")]
    Unacceptable { source_name: String },
    #[error("no price source returned usable prices")]
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub make_id: String,
    pub model_id: String,
    pub variant_id: String,
    pub city_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub ex_showroom_price: f64,
    pub on_road_price: f64,
    pub insurance_price: Option<f64>,
    pub name: Option<String>,
    pub city: String,
    pub source: String,
}

impl PriceQuote {
    /// Copies positive prices into the draft. Insurance is only taken when
    /// the source reported a positive premium.
    pub fn apply_to(&self, draft: &mut PurchaseDraft) {
        if self.ex_showroom_price > 0.0 {
            draft.ex_showroom_price = Some(self.ex_showroom_price);
        }
        if self.on_road_price > 0.0 {
            draft.on_road_price = Some(self.on_road_price);
        }
        if let Some(insurance) = self.insurance_price.filter(|v| *v > 0.0) {
            draft.annual_insurance = Some(insurance);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, request: &PriceRequest) -> Result<PriceQuote, PricingError>;
}

/// Manufacturer, model, variant and city listings used to build a
/// [`PriceRequest`].
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn makes(&self) -> Result<Vec<CatalogEntry>, PricingError>;

    async fn models(&self, make_id: &str) -> Result<Vec<CatalogEntry>, PricingError>;

    async fn variants(&self, model_id: &str) -> Result<Vec<CatalogEntry>, PricingError>;

    async fn cities(&self) -> Result<Vec<CatalogEntry>, PricingError>;
}
