//! pgxguard-common — Shared types and errors used across all PGxGuard crates.

pub mod error;
pub mod phenotype;
pub mod report;
pub mod variant;

// Re-export commonly used types
pub use error::{PgxError, Result};
pub use phenotype::{Phenotype, RiskDirection};
pub use variant::{Effect, Zygosity};
