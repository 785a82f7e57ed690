//! Mock quote source for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::QuoteSource;
use crate::application::ports::QuoteError;
use crate::domain::pricing::Quote;
use crate::domain::shared::Symbol;

#[derive(Debug, Default)]
struct SourceState {
    quotes: HashMap<Symbol, Quote>,
    error: Option<QuoteError>,
    requests: usize,
}

/// In-memory quote source.
#[derive(Debug, Default)]
pub struct MockQuoteSource {
    state: Mutex<SourceState>,
}

impl MockQuoteSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the quote for `quote.symbol`.
    pub fn set_quote(&self, quote: Quote) {
        self.state.lock().quotes.insert(quote.symbol.clone(), quote);
    }

    /// Forget the quote for `symbol`.
    pub fn remove_quote(&self, symbol: &Symbol) {
        self.state.lock().quotes.remove(symbol);
    }

    /// Fail every request with `error` until cleared with `None`.
    pub fn set_error(&self, error: Option<QuoteError>) {
        self.state.lock().error = error;
    }

    /// Number of `latest_quote` calls served.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.lock().requests
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn latest_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, QuoteError> {
        let mut state = self.state.lock();
        state.requests += 1;
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        Ok(state.quotes.get(symbol).cloned())
    }
}
