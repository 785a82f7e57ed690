//! Quote Adapters
//!
//! Raw quote sources and the validating provider that implements
//! `QuoteProviderPort` on top of them.

pub mod fallback;
pub mod mock;
mod source;

pub use fallback::FallbackQuoteProvider;
pub use mock::MockQuoteSource;
pub use source::QuoteSource;
