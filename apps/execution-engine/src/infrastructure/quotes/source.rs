use async_trait::async_trait;

use crate::application::ports::QuoteError;
use crate::domain::pricing::Quote;
use crate::domain::shared::Symbol;

/// Raw, unvalidated quote feed (streaming cache or REST snapshot).
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest quote for `symbol`, or `None` if the source has none.
    async fn latest_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, QuoteError>;
}
