//! Conflict Resolver Domain Service
//!
//! Merges the intents of independent strategies into one allocation per
//! symbol.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::portfolio_coordination::value_objects::{
    ConflictResolution, CoordinationPolicy, PositionIntent, ResolutionMethod,
};
use crate::domain::shared::Symbol;

/// Resolves per-symbol disagreements between strategies.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    policy: CoordinationPolicy,
}

impl ConflictResolver {
    /// Create a resolver for the given policy.
    #[must_use]
    pub const fn new(policy: CoordinationPolicy) -> Self {
        Self { policy }
    }

    /// Resolve every symbol, ordered by symbol.
    ///
    /// Symbols with a single intent pass through unchanged.
    #[must_use]
    pub fn resolve(&self, intents: &[PositionIntent]) -> Vec<ConflictResolution> {
        let mut by_symbol: BTreeMap<&Symbol, Vec<&PositionIntent>> = BTreeMap::new();
        for intent in intents {
            by_symbol.entry(intent.symbol()).or_default().push(intent);
        }

        by_symbol
            .into_iter()
            .map(|(symbol, group)| self.resolve_symbol(symbol, &group))
            .collect()
    }

    /// Resolve the intents for one symbol.
    #[must_use]
    pub fn resolve_symbol(&self, symbol: &Symbol, group: &[&PositionIntent]) -> ConflictResolution {
        let contributing_strategies: Vec<String> = group
            .iter()
            .map(|intent| intent.strategy_name().to_string())
            .collect();

        if let [only] = group {
            return ConflictResolution {
                symbol: symbol.clone(),
                final_allocation: only.target_allocation(),
                contributing_strategies,
                resolution_method: ResolutionMethod::SingleIntent,
                confidence: only.confidence(),
                warnings: Vec::new(),
            };
        }

        let count = Decimal::from(group.len().max(1));
        let mean_confidence = group.iter().map(|i| i.confidence()).sum::<Decimal>() / count;
        let has_long = group.iter().any(|i| i.target_allocation() > Decimal::ZERO);
        let has_short = group.iter().any(|i| i.target_allocation() < Decimal::ZERO);

        if has_long && has_short {
            let net: Decimal = group.iter().map(|i| i.target_allocation()).sum();
            let confidence = mean_confidence * self.policy.opposing_confidence_penalty;
            let warning = format!(
                "strategies {} disagree on direction for {symbol}; netted to {net}",
                contributing_strategies.join(", ")
            );
            tracing::warn!(
                symbol = %symbol,
                net_allocation = %net,
                confidence = %confidence,
                "Opposing strategy intents netted"
            );
            return ConflictResolution {
                symbol: symbol.clone(),
                final_allocation: net,
                contributing_strategies,
                resolution_method: ResolutionMethod::NetOpposing,
                confidence,
                warnings: vec![warning],
            };
        }

        let weight: Decimal = group.iter().map(|i| i.confidence()).sum();
        let average = if weight > Decimal::ZERO {
            group
                .iter()
                .map(|i| i.target_allocation() * i.confidence())
                .sum::<Decimal>()
                / weight
        } else {
            group.iter().map(|i| i.target_allocation()).sum::<Decimal>() / count
        };

        let mut warnings = Vec::new();
        let cap = self.policy.max_concentration;
        let final_allocation = if average.abs() > cap {
            let capped = if average.is_sign_negative() { -cap } else { cap };
            tracing::warn!(
                symbol = %symbol,
                allocation = %average,
                cap = %cap,
                "Resolved allocation capped at concentration limit"
            );
            warnings.push(format!(
                "allocation {average} for {symbol} capped at concentration limit {cap}"
            ));
            capped
        } else {
            average
        };

        ConflictResolution {
            symbol: symbol.clone(),
            final_allocation,
            contributing_strategies,
            resolution_method: ResolutionMethod::ConfidenceWeighted,
            confidence: mean_confidence,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn intent(symbol: &str, allocation: Decimal, strategy: &str, confidence: Decimal) -> PositionIntent {
        PositionIntent::new(symbol, allocation, strategy, confidence).unwrap()
    }

    #[test]
    fn single_intent_passes_through() {
        let resolutions = ConflictResolver::default()
            .resolve(&[intent("AAPL", dec!(0.30), "momentum", dec!(0.6))]);

        assert_eq!(resolutions.len(), 1);
        let r = &resolutions[0];
        assert_eq!(r.final_allocation, dec!(0.30));
        assert_eq!(r.resolution_method, ResolutionMethod::SingleIntent);
        assert!(!r.is_contested());
    }

    #[test]
    fn same_sign_intents_use_confidence_weighted_average() {
        let resolutions = ConflictResolver::default().resolve(&[
            intent("AAPL", dec!(0.10), "momentum", dec!(0.8)),
            intent("AAPL", dec!(0.15), "value", dec!(0.9)),
        ]);

        let r = &resolutions[0];
        assert_eq!(r.resolution_method, ResolutionMethod::ConfidenceWeighted);
        assert_eq!(r.final_allocation.round_dp(4), dec!(0.1265));
        assert_eq!(r.confidence, dec!(0.85));
        assert!(r.warnings.is_empty());
        assert_eq!(r.contributing_strategies, vec!["momentum", "value"]);
    }

    #[test]
    fn opposing_intents_net_with_penalty() {
        let resolutions = ConflictResolver::default().resolve(&[
            intent("TSLA", dec!(0.10), "momentum", dec!(0.8)),
            intent("TSLA", dec!(-0.04), "mean_reversion", dec!(0.6)),
        ]);

        let r = &resolutions[0];
        assert_eq!(r.resolution_method, ResolutionMethod::NetOpposing);
        assert_eq!(r.final_allocation, dec!(0.06));
        assert_eq!(r.confidence, dec!(0.49));
        assert!(r.confidence <= dec!(0.7));
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn same_sign_average_is_capped() {
        let resolutions = ConflictResolver::default().resolve(&[
            intent("NVDA", dec!(-0.30), "a", dec!(0.5)),
            intent("NVDA", dec!(-0.20), "b", dec!(0.5)),
        ]);

        let r = &resolutions[0];
        assert_eq!(r.final_allocation, dec!(-0.15));
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn zero_confidence_falls_back_to_simple_average() {
        let resolutions = ConflictResolver::default().resolve(&[
            intent("MSFT", dec!(0.04), "a", Decimal::ZERO),
            intent("MSFT", dec!(0.08), "b", Decimal::ZERO),
        ]);

        assert_eq!(resolutions[0].final_allocation, dec!(0.06));
    }

    #[test]
    fn resolutions_are_ordered_by_symbol() {
        let resolutions = ConflictResolver::default().resolve(&[
            intent("MSFT", dec!(0.05), "a", dec!(0.5)),
            intent("AAPL", dec!(0.05), "a", dec!(0.5)),
        ]);
        let symbols: Vec<_> = resolutions.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }
}
