//! Pricing Value Objects

mod liquidity_analysis;
mod price_metadata;
mod pricing_policy;
mod quote;

pub use liquidity_analysis::LiquidityAnalysis;
pub(crate) use price_metadata::spread_percent;
pub use price_metadata::{
    FALLBACK_CONFIDENCE, FALLBACK_LIQUIDITY_SCORE, PriceMetadata, PricingMethod,
};
pub use pricing_policy::PricingPolicy;
pub use quote::Quote;
