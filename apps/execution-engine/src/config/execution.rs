//! Order execution configuration: quote validation, pricing offsets and
//! repeg timing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::PricingPolicy;

/// Execution configuration, loaded once per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum quote spread as a percent of mid (0.5 means 0.5%).
    #[serde(default = "default_max_spread_percent")]
    pub max_spread_percent: Decimal,
    /// Repeg prices closer than this percent to a tried price count as repeats.
    #[serde(default = "default_repeg_threshold_percent")]
    pub repeg_threshold_percent: Decimal,
    /// Repegs per order before escalating to market.
    #[serde(default = "default_max_repegs_per_order")]
    pub max_repegs_per_order: u32,
    /// Minimum displayed bid and ask size (shares).
    #[serde(default = "default_min_bid_ask_size")]
    pub min_bid_ask_size: Decimal,
    /// Minimum displayed size for symbols in `low_liquidity_symbols`.
    #[serde(default = "default_low_liquidity_min_size")]
    pub low_liquidity_min_size: Decimal,
    /// Symbols validated against the lower size threshold.
    #[serde(default)]
    pub low_liquidity_symbols: Vec<String>,
    /// Maximum age of a streaming quote (seconds).
    #[serde(default = "default_quote_freshness_seconds")]
    pub quote_freshness_seconds: u64,
    /// Timeout for a single broker call (seconds).
    #[serde(default = "default_order_placement_timeout_seconds")]
    pub order_placement_timeout_seconds: u64,
    /// Time an order rests before it may be repegged (seconds).
    #[serde(default = "default_fill_wait_seconds")]
    pub fill_wait_seconds: u64,
    /// Offset above the bid when anchoring buys (cents).
    #[serde(default = "default_anchor_offset_cents")]
    pub bid_anchor_offset_cents: Decimal,
    /// Offset below the ask when anchoring sells (cents).
    #[serde(default = "default_anchor_offset_cents")]
    pub ask_anchor_offset_cents: Decimal,
    /// Allow repeg prices to cross the spread.
    #[serde(default)]
    pub allow_cross_spread_repeg: bool,
    /// Use broker-native replace instead of cancel and resubmit.
    #[serde(default)]
    pub use_replace_orders: bool,
    /// Minutes after the open during which placements are deferred.
    #[serde(default = "default_market_open_delay_minutes")]
    pub market_open_delay_minutes: u32,
    /// Quote fetch attempts per placement.
    #[serde(default = "default_quote_retry_attempts")]
    pub quote_retry_attempts: u32,
    /// Base backoff between quote attempts (milliseconds, linear).
    #[serde(default = "default_quote_retry_backoff_ms")]
    pub quote_retry_backoff_ms: u64,
    /// Place single-attempt touch orders for extended-hours trading.
    #[serde(default)]
    pub extended_hours: bool,
    /// Symbols that only trade in whole shares.
    #[serde(default)]
    pub non_fractionable_symbols: Vec<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_spread_percent: default_max_spread_percent(),
            repeg_threshold_percent: default_repeg_threshold_percent(),
            max_repegs_per_order: default_max_repegs_per_order(),
            min_bid_ask_size: default_min_bid_ask_size(),
            low_liquidity_min_size: default_low_liquidity_min_size(),
            low_liquidity_symbols: Vec::new(),
            quote_freshness_seconds: default_quote_freshness_seconds(),
            order_placement_timeout_seconds: default_order_placement_timeout_seconds(),
            fill_wait_seconds: default_fill_wait_seconds(),
            bid_anchor_offset_cents: default_anchor_offset_cents(),
            ask_anchor_offset_cents: default_anchor_offset_cents(),
            allow_cross_spread_repeg: false,
            use_replace_orders: false,
            market_open_delay_minutes: default_market_open_delay_minutes(),
            quote_retry_attempts: default_quote_retry_attempts(),
            quote_retry_backoff_ms: default_quote_retry_backoff_ms(),
            extended_hours: false,
            non_fractionable_symbols: Vec::new(),
        }
    }
}

impl ExecutionConfig {
    /// Pricing policy derived from the offsets and repeg settings.
    #[must_use]
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            bid_anchor_offset: self.bid_anchor_offset_cents / Decimal::ONE_HUNDRED,
            ask_anchor_offset: self.ask_anchor_offset_cents / Decimal::ONE_HUNDRED,
            allow_cross_spread_repeg: self.allow_cross_spread_repeg,
            repeg_threshold_percent: self.repeg_threshold_percent,
        }
    }

    /// Minimum displayed size required for `symbol`.
    #[must_use]
    pub fn min_size_for(&self, symbol: &str) -> Decimal {
        if self
            .low_liquidity_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(symbol))
        {
            self.low_liquidity_min_size
        } else {
            self.min_bid_ask_size
        }
    }
}

const fn default_max_spread_percent() -> Decimal {
    dec!(0.50)
}

const fn default_repeg_threshold_percent() -> Decimal {
    dec!(0.10)
}

const fn default_max_repegs_per_order() -> u32 {
    3
}

const fn default_min_bid_ask_size() -> Decimal {
    dec!(100)
}

const fn default_low_liquidity_min_size() -> Decimal {
    dec!(10)
}

const fn default_quote_freshness_seconds() -> u64 {
    5
}

const fn default_order_placement_timeout_seconds() -> u64 {
    30
}

const fn default_fill_wait_seconds() -> u64 {
    10
}

const fn default_anchor_offset_cents() -> Decimal {
    Decimal::ONE
}

const fn default_market_open_delay_minutes() -> u32 {
    5
}

const fn default_quote_retry_attempts() -> u32 {
    3
}

const fn default_quote_retry_backoff_ms() -> u64 {
    300
}
