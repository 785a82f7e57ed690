//! Portfolio Coordination Domain Services

mod conflict_resolver;
mod portfolio_consolidator;

pub use conflict_resolver::ConflictResolver;
pub use portfolio_consolidator::PortfolioConsolidator;
