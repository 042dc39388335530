use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    ComparisonResult, FormattedComparison, INVALID_INPUT_MESSAGE, PurchaseDraft, PurchaseInputs,
    RATE_EX_SHOWROOM, RATE_ON_ROAD, RESIDUAL_VALUE_FRACTION, RateConfig, compare_with,
    format_comparison, validate_rates,
};
use crate::pricing::{
    Acceptance, Catalog, CatalogEntry, DEFAULT_CATALOG_BASE_URL, DEFAULT_FALLBACK_BASE_URL,
    DEFAULT_SCRAPE_PROXY_URL, DEFAULT_SCRAPE_SITE_URL, HttpCatalog, PriceChain, PriceQuote,
    PriceRequest, PricingError, ScrapeProxySource, VariantDetailsSource, VersionPriceSource,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const SELECT_ALL_MESSAGE: &str = "Please select all car details and city";
const PRICES_UNAVAILABLE_MESSAGE: &str = "Could not fetch price data. Please enter prices manually.";
const CATALOG_UNAVAILABLE_MESSAGE: &str = "Failed to fetch catalog data. Please try again later.";

#[derive(Parser, Debug)]
#[command(
    name = "carloan",
    about = "Compare financing a car's ex-showroom price against its on-road price"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one comparison and exit
    Compare(CompareArgs),
    /// Serve the web calculator and JSON API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, help = "Ex-showroom price")]
    pub ex_showroom_price: f64,
    #[arg(long, help = "On-road price")]
    pub on_road_price: f64,
    #[arg(long, help = "Loan tenure in whole years")]
    pub tenure_years: f64,
    #[arg(long, default_value_t = 0.0)]
    pub downpayment: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual insurance premium")]
    pub annual_insurance: f64,
    #[arg(long, help = "Print the comparison as JSON")]
    pub json: bool,
    #[command(flatten)]
    pub rates: RateArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "CARLOAN_PORT", default_value_t = 8080)]
    pub port: u16,
    #[command(flatten)]
    pub rates: RateArgs,
    #[command(flatten)]
    pub sources: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    #[arg(
        long,
        env = "CARLOAN_EX_SHOWROOM_RATE",
        default_value_t = RATE_EX_SHOWROOM,
        help = "Annual interest rate in percent when financing the ex-showroom price"
    )]
    pub ex_showroom_rate: f64,
    #[arg(
        long,
        env = "CARLOAN_ON_ROAD_RATE",
        default_value_t = RATE_ON_ROAD,
        help = "Annual interest rate in percent when financing the on-road price"
    )]
    pub on_road_rate: f64,
    #[arg(
        long,
        env = "CARLOAN_RESIDUAL_VALUE_PERCENT",
        default_value_t = RESIDUAL_VALUE_FRACTION * 100.0,
        help = "Residual value of the financed ex-showroom amount at end of term, in percent"
    )]
    pub residual_value_percent: f64,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long, env = "CARLOAN_CATALOG_BASE_URL", default_value = DEFAULT_CATALOG_BASE_URL)]
    pub catalog_base_url: String,
    #[arg(long, env = "CARLOAN_FALLBACK_BASE_URL", default_value = DEFAULT_FALLBACK_BASE_URL)]
    pub fallback_base_url: String,
    #[arg(long, env = "CARLOAN_SCRAPE_PROXY_URL", default_value = DEFAULT_SCRAPE_PROXY_URL)]
    pub scrape_proxy_url: String,
    #[arg(long, env = "CARLOAN_SCRAPE_SITE_URL", default_value = DEFAULT_SCRAPE_SITE_URL)]
    pub scrape_site_url: String,
    #[arg(long, env = "CARLOAN_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,
}

pub struct AppState {
    rates: RateConfig,
    catalog: Arc<dyn Catalog>,
    prices: PriceChain,
}

impl AppState {
    pub fn new(rates: RateConfig, catalog: Arc<dyn Catalog>, prices: PriceChain) -> Self {
        Self {
            rates,
            catalog,
            prices,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    inputs: PurchaseInputs,
    rates: RateConfig,
    result: ComparisonResult,
    formatted: FormattedComparison,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ModelsQuery {
    make_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VariantsQuery {
    model_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PricesQuery {
    make_id: Option<String>,
    model_id: Option<String>,
    variant_id: Option<String>,
    city_id: Option<String>,
}

impl PricesQuery {
    fn into_request(self) -> Option<PriceRequest> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(PriceRequest {
            make_id: present(self.make_id)?,
            model_id: present(self.model_id)?,
            variant_id: present(self.variant_id)?,
            city_id: present(self.city_id)?,
        })
    }
}

pub fn build_rates(args: &RateArgs) -> Result<RateConfig, String> {
    let rates = RateConfig {
        ex_showroom_rate_percent: args.ex_showroom_rate,
        on_road_rate_percent: args.on_road_rate,
        residual_value_fraction: args.residual_value_percent / 100.0,
    };
    validate_rates(&rates).map_err(|e| e.to_string())?;
    Ok(rates)
}

pub fn build_state(args: &ServeArgs) -> Result<AppState, String> {
    let rates = build_rates(&args.rates)?;
    if args.sources.http_timeout_secs == 0 {
        return Err("--http-timeout-secs must be > 0".to_string());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.sources.http_timeout_secs))
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;

    let sources = &args.sources;
    let prices = PriceChain::new()
        .with_source(
            VariantDetailsSource::new(client.clone(), &sources.catalog_base_url),
            Acceptance::BothPrices,
        )
        .with_source(
            VersionPriceSource::new(client.clone(), &sources.fallback_base_url),
            Acceptance::AnyPrice,
        )
        .with_source(
            ScrapeProxySource::new(
                client.clone(),
                &sources.scrape_proxy_url,
                &sources.scrape_site_url,
            ),
            Acceptance::AnyPrice,
        );
    let catalog = Arc::new(HttpCatalog::new(client, &sources.catalog_base_url));

    Ok(AppState::new(rates, catalog, prices))
}

/// Runs a single comparison for the command line.
pub fn run_compare(args: &CompareArgs) -> Result<String, String> {
    let rates = build_rates(&args.rates)?;
    let draft = PurchaseDraft {
        ex_showroom_price: Some(args.ex_showroom_price),
        on_road_price: Some(args.on_road_price),
        tenure_years: Some(args.tenure_years),
        downpayment: Some(args.downpayment),
        annual_insurance: Some(args.annual_insurance),
    };
    let response = build_compare_response(draft, &rates)
        .map_err(|e| format!("{INVALID_INPUT_MESSAGE} ({e})"))?;

    if args.json {
        serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
    } else {
        Ok(render_report(&response))
    }
}

fn build_compare_response(
    draft: PurchaseDraft,
    rates: &RateConfig,
) -> Result<CompareResponse, crate::core::ValidationError> {
    let inputs = draft.into_inputs()?;
    let result = compare_with(&inputs, rates)?;
    Ok(CompareResponse {
        inputs,
        rates: *rates,
        formatted: format_comparison(&result, inputs.tenure_years),
        result,
    })
}

fn render_report(response: &CompareResponse) -> String {
    let f = &response.formatted;
    let mut out = String::new();
    out.push_str("Ex-Showroom Purchase\n");
    out.push_str(&format!("  EMI: {}\n", f.emi_ex_showroom));
    out.push_str(&format!("  Residual Value: {}\n", f.residual_value_ex_showroom));
    out.push_str(&format!(
        "  Total Cost (EMI + Downpayment + Residual Value): {}\n",
        f.total_cost_ex_showroom
    ));
    out.push('\n');
    out.push_str("On-Road Purchase\n");
    out.push_str(&format!("  EMI: {}\n", f.emi_on_road));
    out.push_str(&format!(
        "  Insurance ({}): {}\n",
        f.insurance_label, f.total_insurance_cost
    ));
    out.push_str(&format!(
        "  Total Cost (EMI + Downpayment + Insurance): {}\n",
        f.total_cost_on_road
    ));
    out.push('\n');
    out.push_str("Comparison\n");
    out.push_str(&format!(
        "  Savings (On-Road vs Ex-Showroom): {}\n",
        f.savings
    ));
    out
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "car loan comparison API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/catalog/makes", get(makes_handler))
        .route("/api/catalog/models", get(models_handler))
        .route("/api/catalog/variants", get(variants_handler))
        .route("/api/catalog/cities", get(cities_handler))
        .route("/api/prices", get(prices_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn compare_get_handler(
    State(state): State<Arc<AppState>>,
    Query(draft): Query<PurchaseDraft>,
) -> Response {
    compare_handler_impl(&state, draft)
}

async fn compare_post_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<PurchaseDraft>,
) -> Response {
    compare_handler_impl(&state, draft)
}

fn compare_handler_impl(state: &AppState, draft: PurchaseDraft) -> Response {
    match build_compare_response(draft, &state.rates) {
        Ok(response) => {
            debug!(
                tenure_years = response.inputs.tenure_years,
                savings = response.result.savings,
                "comparison computed"
            );
            json_response(StatusCode::OK, response)
        }
        Err(e) => error_response(
            StatusCode::BAD_REQUEST,
            INVALID_INPUT_MESSAGE,
            Some(e.to_string()),
        ),
    }
}

async fn makes_handler(State(state): State<Arc<AppState>>) -> Response {
    catalog_response(state.catalog.makes().await, "manufacturers")
}

async fn cities_handler(State(state): State<Arc<AppState>>) -> Response {
    catalog_response(state.catalog.cities().await, "cities")
}

async fn models_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> Response {
    let Some(make_id) = query.make_id.filter(|s| !s.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "makeId is required", None);
    };
    catalog_response(state.catalog.models(&make_id).await, "models")
}

async fn variants_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VariantsQuery>,
) -> Response {
    let Some(model_id) = query.model_id.filter(|s| !s.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "modelId is required", None);
    };
    catalog_response(state.catalog.variants(&model_id).await, "variants")
}

fn catalog_response(
    listing: Result<Vec<CatalogEntry>, PricingError>,
    what: &'static str,
) -> Response {
    match listing {
        Ok(entries) => json_response(StatusCode::OK, CatalogResponse { entries }),
        Err(e) => {
            warn!(error = %e, "failed to fetch {what}");
            error_response(
                StatusCode::BAD_GATEWAY,
                CATALOG_UNAVAILABLE_MESSAGE,
                Some(e.to_string()),
            )
        }
    }
}

async fn prices_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> Response {
    let Some(request) = query.into_request() else {
        return error_response(StatusCode::BAD_REQUEST, SELECT_ALL_MESSAGE, None);
    };
    prices_response(state.prices.fetch(&request).await)
}

fn prices_response(quote: Result<PriceQuote, PricingError>) -> Response {
    match quote {
        Ok(quote) => json_response(StatusCode::OK, quote),
        Err(e) => error_response(
            StatusCode::BAD_GATEWAY,
            PRICES_UNAVAILABLE_MESSAGE,
            Some(e.to_string()),
        ),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str, detail: Option<String>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            detail,
        },
    )
}
