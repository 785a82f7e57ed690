//! Pricing Domain Services

mod liquidity_analyzer;
mod pricing_calculator;

pub use liquidity_analyzer::{LiquidityAnalyzer, TopOfBookAnalyzer};
pub use pricing_calculator::{PriceRecommendation, PricingCalculator};
