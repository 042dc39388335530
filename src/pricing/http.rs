use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Catalog, CatalogEntry, PriceQuote, PriceRequest, PriceSource, PricingError};

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://cdn-api.cardekho.com/v1";
pub const DEFAULT_FALLBACK_BASE_URL: &str = "https://www.cardekho.com/api/v1";
pub const DEFAULT_SCRAPE_PROXY_URL: &str = "https://api.allorigins.win/raw";
pub const DEFAULT_SCRAPE_SITE_URL: &str = "https://www.cardekho.com";

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, PricingError> {
    debug!(%url, "GET");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PricingError::Status(status.as_u16()));
    }
    Ok(response.json::<T>().await?)
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VariantDetailsEnvelope {
    variant_details: Option<VariantDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VariantDetails {
    ex_showroom_price: Option<f64>,
    on_road_price: Option<f64>,
    insurance_price: Option<f64>,
    name: Option<String>,
}

/// Primary source: the catalog's variant-details endpoint, which also
/// reports an insurance premium.
pub struct VariantDetailsSource {
    client: Client,
    base_url: String,
}

impl VariantDetailsSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl PriceSource for VariantDetailsSource {
    fn name(&self) -> &str {
        "variant-details"
    }

    async fn fetch(&self, request: &PriceRequest) -> Result<PriceQuote, PricingError> {
        let mut url = Url::parse(&format!("{}/variant-details", self.base_url))
            .map_err(|e| PricingError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("variantId", &request.variant_id)
            .append_pair("cityId", &request.city_id);

        let envelope: VariantDetailsEnvelope = get_json(&self.client, url.as_str()).await?;
        let details = envelope
            .variant_details
            .ok_or(PricingError::MissingData("variantDetails"))?;

        Ok(PriceQuote {
            ex_showroom_price: details.ex_showroom_price.unwrap_or(0.0),
            on_road_price: details.on_road_price.unwrap_or(0.0),
            insurance_price: details.insurance_price,
            name: details.name.filter(|n| !n.is_empty()),
            city: request.city_id.clone(),
            source: self.name().to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VersionPrice {
    ex_showroom_price: Option<f64>,
    on_road_price: Option<f64>,
}

pub struct VersionPriceSource {
    client: Client,
    base_url: String,
}

impl VersionPriceSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    // Ids go in as single path segments so `/`, `?` and `..` stay inside them.
    fn url(&self, request: &PriceRequest) -> Result<Url, PricingError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| PricingError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| PricingError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "version",
                request.variant_id.as_str(),
                "price",
                "city",
                request.city_id.as_str(),
            ]);
        Ok(url)
    }
}

#[async_trait]
impl PriceSource for VersionPriceSource {
    fn name(&self) -> &str {
        "version-price"
    }

    async fn fetch(&self, request: &PriceRequest) -> Result<PriceQuote, PricingError> {
        let url = self.url(request)?;
        let price: VersionPrice = get_json(&self.client, url.as_str()).await?;
        Ok(PriceQuote {
            ex_showroom_price: price.ex_showroom_price.unwrap_or(0.0),
            on_road_price: price.on_road_price.unwrap_or(0.0),
            insurance_price: None,
            name: None,
            city: request.city_id.clone(),
            source: self.name().to_string(),
        })
    }
}

/// Last resort: fetches the public variant page through a CORS proxy and
/// reads the prices embedded in the page's serialized state.
pub struct ScrapeProxySource {
    client: Client,
    proxy_url: String,
    site_url: String,
}

impl ScrapeProxySource {
    pub fn new(client: Client, proxy_url: &str, site_url: &str) -> Self {
        Self {
            client,
            proxy_url: proxy_url.to_string(),
            site_url: trim_base(site_url),
        }
    }

    fn url(&self, request: &PriceRequest) -> Result<Url, PricingError> {
        let page = format!(
            "{}/{}-cars/{}/{}",
            self.site_url, request.make_id, request.model_id, request.variant_id
        );
        let mut url =
            Url::parse(&self.proxy_url).map_err(|e| PricingError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("url", &page);
        Ok(url)
    }
}

#[async_trait]
impl PriceSource for ScrapeProxySource {
    fn name(&self) -> &str {
        "scrape-proxy"
    }

    async fn fetch(&self, request: &PriceRequest) -> Result<PriceQuote, PricingError> {
        let url = self.url(request)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PricingError::Status(status.as_u16()));
        }
        let html = response.text().await?;

        Ok(PriceQuote {
            ex_showroom_price: extract_embedded_number(&html, "exShowroomPrice").unwrap_or(0.0),
            on_road_price: extract_embedded_number(&html, "onRoadPrice").unwrap_or(0.0),
            insurance_price: None,
            name: None,
            city: request.city_id.clone(),
            source: self.name().to_string(),
        })
    }
}

/// Finds the first `"key": 123456` (or `"key":"12,34,567"`) pair in a page
/// and parses its value. Grouping commas are ignored.
pub fn extract_embedded_number(page: &str, key: &str) -> Option<f64> {
    let needle = format!("\"{key}\"");
    let mut search_from = 0;
    while let Some(offset) = page[search_from..].find(&needle) {
        let after_key = search_from + offset + needle.len();
        search_from = after_key;

        let rest = page[after_key..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();
        let rest = rest.strip_prefix('"').unwrap_or(rest);
        let digits: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
            .filter(|c| *c != ',')
            .collect();
        if let Ok(value) = digits.parse::<f64>() {
            return Some(value);
        }
    }
    None
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogListing {
    manufacturers: Vec<RawCatalogEntry>,
    models: Vec<RawCatalogEntry>,
    variants: Vec<RawCatalogEntry>,
    cities: Vec<RawCatalogEntry>,
}

// Upstream ids are sometimes numeric.
#[derive(Debug, Deserialize)]
struct RawCatalogEntry {
    id: serde_json::Value,
    name: String,
}

impl From<RawCatalogEntry> for CatalogEntry {
    fn from(raw: RawCatalogEntry) -> Self {
        let id = match raw.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        CatalogEntry { id, name: raw.name }
    }
}

fn into_entries(raw: Vec<RawCatalogEntry>) -> Vec<CatalogEntry> {
    raw.into_iter().map(CatalogEntry::from).collect()
}

pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    async fn listing(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
    ) -> Result<CatalogListing, PricingError> {
        let mut url = Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|e| PricingError::InvalidUrl(e.to_string()))?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        get_json(&self.client, url.as_str()).await
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn makes(&self) -> Result<Vec<CatalogEntry>, PricingError> {
        Ok(into_entries(self.listing("makes", None).await?.manufacturers))
    }

    async fn models(&self, make_id: &str) -> Result<Vec<CatalogEntry>, PricingError> {
        let listing = self.listing("models", Some(("makeId", make_id))).await?;
        Ok(into_entries(listing.models))
    }

    async fn variants(&self, model_id: &str) -> Result<Vec<CatalogEntry>, PricingError> {
        let listing = self.listing("variants", Some(("modelId", model_id))).await?;
        Ok(into_entries(listing.variants))
    }

    async fn cities(&self) -> Result<Vec<CatalogEntry>, PricingError> {
        Ok(into_entries(self.listing("cities", None).await?.cities))
    }
}
