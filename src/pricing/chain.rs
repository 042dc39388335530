use tracing::{debug, warn};

use super::{PriceQuote, PriceRequest, PriceSource, PricingError};

/// What a source's quote must contain before the chain stops at it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Acceptance {
    BothPrices,
    AnyPrice,
}

impl Acceptance {
    fn accepts(self, quote: &PriceQuote) -> bool {
        match self {
            Acceptance::BothPrices => quote.ex_showroom_price > 0.0 && quote.on_road_price > 0.0,
            Acceptance::AnyPrice => quote.ex_showroom_price > 0.0 || quote.on_road_price > 0.0,
        }
    }
}

/// Ranked price sources, tried one at a time until a quote is accepted.
#[derive(Default)]
pub struct PriceChain {
    sources: Vec<(Box<dyn PriceSource>, Acceptance)>,
}

impl PriceChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(
        mut self,
        source: impl PriceSource + 'static,
        acceptance: Acceptance,
    ) -> Self {
        self.sources.push((Box::new(source), acceptance));
        self
    }

    pub async fn fetch(&self, request: &PriceRequest) -> Result<PriceQuote, PricingError> {
        for (source, acceptance) in &self.sources {
            let outcome = source.fetch(request).await.and_then(|quote| {
                if acceptance.accepts(&quote) {
                    Ok(quote)
                } else {
                    Err(PricingError::Unacceptable {
                        source_name: source.name().to_string(),
                    })
                }
            });

            match outcome {
                Ok(quote) => {
                    debug!(
                        source = source.name(),
                        variant = %request.variant_id,
                        city = %request.city_id,
                        "price quote accepted"
                    );
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "price source failed, trying next");
                }
            }
        }

        Err(PricingError::Exhausted)
    }
}
