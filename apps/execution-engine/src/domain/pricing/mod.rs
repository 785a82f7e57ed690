//! Pricing Bounded Context
//!
//! Quote snapshots and the pure price computations built on them.

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::PricingError;
pub use services::{LiquidityAnalyzer, PriceRecommendation, PricingCalculator, TopOfBookAnalyzer};
pub use value_objects::{
    FALLBACK_CONFIDENCE, FALLBACK_LIQUIDITY_SCORE, LiquidityAnalysis, PriceMetadata, PricingMethod,
    PricingPolicy, Quote,
};
