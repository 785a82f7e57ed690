//! Portfolio Consolidator Domain Service

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::portfolio_coordination::value_objects::{ConflictResolution, CoordinationPolicy};
use crate::domain::shared::Symbol;

/// Turns resolved allocations into a target portfolio.
///
/// Drops dust allocations, scales an over-allocated book down to the
/// configured target and parks an under-allocated residual in the cash proxy.
#[derive(Debug, Clone, Default)]
pub struct PortfolioConsolidator {
    policy: CoordinationPolicy,
}

impl PortfolioConsolidator {
    /// Create a consolidator for the given policy.
    #[must_use]
    pub const fn new(policy: CoordinationPolicy) -> Self {
        Self { policy }
    }

    /// Build the target portfolio from per-symbol resolutions.
    #[must_use]
    pub fn consolidate(&self, resolutions: &[ConflictResolution]) -> BTreeMap<Symbol, Decimal> {
        let mut portfolio: BTreeMap<Symbol, Decimal> = BTreeMap::new();
        for resolution in resolutions {
            if resolution.final_allocation.abs() < self.policy.min_allocation {
                tracing::debug!(
                    symbol = %resolution.symbol,
                    allocation = %resolution.final_allocation,
                    "Dropping allocation below floor"
                );
                continue;
            }
            *portfolio.entry(resolution.symbol.clone()).or_default() += resolution.final_allocation;
        }

        let gross: Decimal = portfolio.values().map(|a| a.abs()).sum();

        if gross > Decimal::ONE {
            let scale_factor = self.policy.over_allocation_target / gross;
            for allocation in portfolio.values_mut() {
                *allocation *= scale_factor;
            }
            tracing::info!(
                gross_allocation = %gross,
                scale_factor = %scale_factor.round_dp(6),
                "Scaled over-allocated portfolio"
            );
        } else if gross < self.policy.under_allocation_threshold {
            let residual = Decimal::ONE - gross;
            *portfolio.entry(self.policy.cash_symbol.clone()).or_default() += residual;
            tracing::info!(
                gross_allocation = %gross,
                cash_symbol = %self.policy.cash_symbol,
                residual = %residual,
                "Assigned unallocated residual to cash proxy"
            );
        }

        portfolio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio_coordination::value_objects::ResolutionMethod;
    use rust_decimal_macros::dec;

    fn resolution(symbol: &str, allocation: Decimal) -> ConflictResolution {
        ConflictResolution {
            symbol: Symbol::new(symbol),
            final_allocation: allocation,
            contributing_strategies: vec!["s".to_string()],
            resolution_method: ResolutionMethod::SingleIntent,
            confidence: dec!(0.5),
            warnings: Vec::new(),
        }
    }

    fn gross(portfolio: &BTreeMap<Symbol, Decimal>) -> Decimal {
        portfolio.values().map(|a| a.abs()).sum()
    }

    #[test]
    fn over_allocation_scales_to_target() {
        let portfolio = PortfolioConsolidator::default().consolidate(&[
            resolution("AAPL", dec!(0.6)),
            resolution("MSFT", dec!(0.4)),
            resolution("NVDA", dec!(0.4)),
        ]);

        assert_eq!(gross(&portfolio).round_dp(10), dec!(0.98));
        assert_eq!(portfolio[&Symbol::new("AAPL")].round_dp(10), dec!(0.42));
        assert_eq!(portfolio[&Symbol::new("MSFT")].round_dp(10), dec!(0.28));
        assert!(!portfolio.contains_key(&Symbol::new("BIL")));
    }

    #[test]
    fn under_allocation_goes_to_cash() {
        let portfolio = PortfolioConsolidator::default()
            .consolidate(&[resolution("AAPL", dec!(0.5)), resolution("MSFT", dec!(0.2))]);

        assert_eq!(portfolio[&Symbol::new("BIL")], dec!(0.3));
        assert_eq!(gross(&portfolio), Decimal::ONE);
    }

    #[test]
    fn nearly_full_portfolio_is_left_alone() {
        let portfolio = PortfolioConsolidator::default()
            .consolidate(&[resolution("AAPL", dec!(0.5)), resolution("MSFT", dec!(0.46))]);

        assert_eq!(portfolio.len(), 2);
        assert_eq!(gross(&portfolio), dec!(0.96));
    }

    #[test]
    fn dust_allocations_are_dropped() {
        let portfolio = PortfolioConsolidator::default().consolidate(&[
            resolution("AAPL", dec!(0.97)),
            resolution("PENNY", dec!(0.0005)),
        ]);

        assert!(!portfolio.contains_key(&Symbol::new("PENNY")));
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn empty_book_is_all_cash() {
        let portfolio = PortfolioConsolidator::default().consolidate(&[]);
        assert_eq!(portfolio[&Symbol::new("BIL")], Decimal::ONE);
    }
}
