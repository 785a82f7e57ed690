//! Streaming-first quote provider with REST fallback.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;

use super::QuoteSource;
use crate::application::ports::{QuoteError, QuoteProviderPort, ValidatedQuote};
use crate::config::ExecutionConfig;
use crate::domain::pricing::Quote;
use crate::domain::shared::Symbol;

/// Prefers a validated streaming quote; otherwise serves a REST snapshot
/// flagged as fallback.
///
/// Streaming quotes must be fresh, inside the maximum spread and show at
/// least the minimum displayed size on both sides. REST snapshots carry no
/// depth, so only their prices are checked.
pub struct FallbackQuoteProvider {
    stream: Option<Arc<dyn QuoteSource>>,
    rest: Arc<dyn QuoteSource>,
    config: Arc<ExecutionConfig>,
}

impl FallbackQuoteProvider {
    /// Create a provider over a streaming and a REST source.
    pub fn new(
        stream: Option<Arc<dyn QuoteSource>>,
        rest: Arc<dyn QuoteSource>,
        config: Arc<ExecutionConfig>,
    ) -> Self {
        Self { stream, rest, config }
    }

    /// Create a provider with no streaming source; every quote is a fallback.
    pub fn rest_only(rest: Arc<dyn QuoteSource>, config: Arc<ExecutionConfig>) -> Self {
        Self::new(None, rest, config)
    }

    fn check_stream_quote(&self, quote: &Quote) -> Result<(), String> {
        if !quote.has_valid_prices() {
            return Err(format!("invalid prices bid={} ask={}", quote.bid, quote.ask));
        }

        let max_age = TimeDelta::seconds(
            i64::try_from(self.config.quote_freshness_seconds).unwrap_or(i64::MAX),
        );
        let age = quote.age(Utc::now());
        if age > max_age {
            return Err(format!("stale by {}ms", age.num_milliseconds()));
        }

        match quote.spread_percent() {
            Some(spread) if spread <= self.config.max_spread_percent => {}
            Some(spread) => return Err(format!("spread {}% too wide", spread.round_dp(4))),
            None => return Err("no mid price".to_string()),
        }

        let min_size = self.config.min_size_for(quote.symbol.as_str());
        if quote.bid_size < min_size || quote.ask_size < min_size {
            return Err(format!(
                "displayed size {}x{} below {min_size}",
                quote.bid_size, quote.ask_size
            ));
        }
        Ok(())
    }

    async fn stream_quote(&self, symbol: &Symbol, order_size: Option<Decimal>) -> Option<Quote> {
        let stream = self.stream.as_ref()?;
        match stream.latest_quote(symbol).await {
            Ok(Some(quote)) => match self.check_stream_quote(&quote) {
                Ok(()) => Some(quote),
                Err(reason) => {
                    tracing::warn!(
                        symbol = %symbol,
                        order_size = ?order_size,
                        reason = %reason,
                        "Streaming quote rejected, falling back to REST"
                    );
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(symbol = %symbol, "No streaming quote, falling back to REST");
                None
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Streaming source failed, falling back to REST");
                None
            }
        }
    }
}

#[async_trait]
impl QuoteProviderPort for FallbackQuoteProvider {
    async fn get_quote_with_validation(
        &self,
        symbol: &Symbol,
        order_size: Option<Decimal>,
    ) -> Result<ValidatedQuote, QuoteError> {
        if let Some(quote) = self.stream_quote(symbol, order_size).await {
            return Ok(ValidatedQuote {
                quote,
                used_fallback: false,
            });
        }

        match self.rest.latest_quote(symbol).await? {
            Some(quote) if quote.has_valid_prices() => Ok(ValidatedQuote {
                quote,
                used_fallback: true,
            }),
            Some(quote) => Err(QuoteError::Unavailable {
                symbol: symbol.to_string(),
                reason: format!("REST quote has invalid prices bid={} ask={}", quote.bid, quote.ask),
            }),
            None => Err(QuoteError::Unavailable {
                symbol: symbol.to_string(),
                reason: "no quote from any source".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::MockQuoteSource;
    use rust_decimal_macros::dec;

    struct Sources {
        stream: Arc<MockQuoteSource>,
        rest: Arc<MockQuoteSource>,
        provider: FallbackQuoteProvider,
    }

    fn sources(config: ExecutionConfig) -> Sources {
        let stream = Arc::new(MockQuoteSource::new());
        let rest = Arc::new(MockQuoteSource::new());
        let provider = FallbackQuoteProvider::new(
            Some(Arc::clone(&stream) as Arc<dyn QuoteSource>),
            Arc::clone(&rest) as Arc<dyn QuoteSource>,
            Arc::new(config),
        );
        Sources { stream, rest, provider }
    }

    fn quote(symbol: &str, bid: Decimal, ask: Decimal, size: Decimal) -> Quote {
        Quote::new(Symbol::new(symbol), bid, ask, size, size)
    }

    #[tokio::test]
    async fn healthy_stream_quote_is_preferred() {
        let s = sources(ExecutionConfig::default());
        s.stream.set_quote(quote("AAPL", dec!(100.00), dec!(100.05), dec!(500)));
        s.rest.set_quote(quote("AAPL", dec!(99), dec!(101), dec!(0)));

        let validated = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), Some(dec!(10)))
            .await
            .unwrap();

        assert!(!validated.used_fallback);
        assert_eq!(validated.quote.bid, dec!(100.00));
        assert_eq!(s.rest.request_count(), 0);
    }

    #[tokio::test]
    async fn stale_stream_quote_falls_back() {
        let s = sources(ExecutionConfig::default());
        s.stream.set_quote(
            quote("AAPL", dec!(100.00), dec!(100.05), dec!(500)).at(Utc::now() - TimeDelta::seconds(30)),
        );
        s.rest.set_quote(quote("AAPL", dec!(100.01), dec!(100.06), dec!(0)));

        let validated = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await
            .unwrap();

        assert!(validated.used_fallback);
        assert_eq!(validated.quote.bid, dec!(100.01));
    }

    #[tokio::test]
    async fn wide_stream_quote_falls_back() {
        let s = sources(ExecutionConfig::default());
        s.stream.set_quote(quote("AAPL", dec!(100), dec!(102), dec!(500)));
        s.rest.set_quote(quote("AAPL", dec!(100), dec!(102), dec!(0)));

        let validated = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await
            .unwrap();

        assert!(validated.used_fallback);
    }

    #[tokio::test]
    async fn thin_book_uses_low_liquidity_override() {
        let s = sources(ExecutionConfig {
            low_liquidity_symbols: vec!["TINY".to_string()],
            ..ExecutionConfig::default()
        });
        s.stream.set_quote(quote("TINY", dec!(10.00), dec!(10.02), dec!(20)));
        s.stream.set_quote(quote("AAPL", dec!(100.00), dec!(100.05), dec!(20)));
        s.rest.set_quote(quote("AAPL", dec!(100.00), dec!(100.05), dec!(0)));

        let tiny = s
            .provider
            .get_quote_with_validation(&Symbol::new("TINY"), None)
            .await
            .unwrap();
        let aapl = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await
            .unwrap();

        assert!(!tiny.used_fallback);
        assert!(aapl.used_fallback);
    }

    #[tokio::test]
    async fn stream_error_falls_back() {
        let s = sources(ExecutionConfig::default());
        s.stream.set_error(Some(QuoteError::ConnectionError {
            message: "disconnected".to_string(),
        }));
        s.rest.set_quote(quote("AAPL", dec!(100), dec!(100.05), dec!(0)));

        let validated = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await
            .unwrap();

        assert!(validated.used_fallback);
    }

    #[tokio::test]
    async fn crossed_rest_quote_is_unavailable() {
        let s = sources(ExecutionConfig::default());
        s.rest.set_quote(quote("AAPL", dec!(101), dec!(100), dec!(0)));

        let result = s
            .provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await;

        assert!(matches!(result, Err(QuoteError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn rest_only_always_reports_fallback() {
        let rest = Arc::new(MockQuoteSource::new());
        rest.set_quote(quote("AAPL", dec!(100), dec!(100.05), dec!(1000)));
        let provider = FallbackQuoteProvider::rest_only(rest, Arc::new(ExecutionConfig::default()));

        let validated = provider
            .get_quote_with_validation(&Symbol::new("AAPL"), None)
            .await
            .unwrap();

        assert!(validated.used_fallback);
    }
}
