//! Hierarchical cost rollup
//!
//! A change to a line or a purchase cost seeds the root finder, which walks
//! used-in edges up to every top-level assembly above the change. Each of
//! those roots is then recomputed top-down by the [`Propagator`], which
//! persists fresh line and node costs bottom-up:
//!
//! ```text
//! line.cost       = mean(analog.total_cost)   (0 with no analogs)
//! line.line_total = line.quantity * line.cost
//! material_cost   = sum(line.line_total)
//! total_cost      = purchase_cost + material_cost
//! ```

mod check;
mod error;
mod guard;
mod propagate;
mod roots;
mod trigger;

pub use check::{verify, Violation};
pub use error::RollupError;
pub use guard::ensure_acyclic;
pub use propagate::Propagator;
pub use roots::{direct_parents, find_roots};
pub use trigger::{on_change, propagate_from, ChangeEvent, RollupOutcome, RootTotal};

use crate::core::config::{Config, DEFAULT_MAX_DEPTH};

/// Knobs of the rollup engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupSettings {
    /// Deepest nesting followed before giving up; capped at
    /// [`crate::core::config::MAX_DEPTH_LIMIT`]
    pub max_depth: usize,
    /// Reject analogs whose family differs from the line's
    pub enforce_family_analogs: bool,
}

impl Default for RollupSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            enforce_family_analogs: false,
        }
    }
}

impl RollupSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.max_depth(),
            enforce_family_analogs: config.enforce_family_analogs(),
        }
    }
}

/// Float comparison for stored costs
pub fn costs_match(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-9 * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs_match() {
        assert!(costs_match(0.1 + 0.2, 0.3));
        assert!(costs_match(1e12 + 0.0001, 1e12));
        assert!(!costs_match(13.0, 17.0));
        assert!(!costs_match(0.0, 1e-6));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            max_depth: Some(12),
            enforce_family_analogs: Some(true),
            ..Default::default()
        };
        let settings = RollupSettings::from_config(&config);
        assert_eq!(settings.max_depth, 12);
        assert!(settings.enforce_family_analogs);
        assert_eq!(RollupSettings::default().max_depth, 256);
    }
}
