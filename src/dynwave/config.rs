//! Global routing configuration.

use crate::constants::GRAVITY;
use crate::network::ForceMainEqn;

/// How much of the two inertial momentum terms to retain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InertialDamping {
    /// Keep the inertial terms in full.
    #[default]
    None,
    /// Scale the inertial terms down as the Froude number approaches 1.
    Partial,
    /// Drop the inertial terms entirely.
    Full,
}

/// Which condition triggers the normal-flow limitation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalFlowLimit {
    /// Water-surface slope flatter than the conduit slope.
    Slope,
    /// Upstream Froude number at or above 1.
    Froude,
    /// Either condition.
    #[default]
    Both,
}

/// Configuration shared by every conduit update in a sub-iteration.
///
/// Read-only while a sweep is running; treat it as part of the project's
/// immutable state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutingConfig {
    pub inertial_damping: InertialDamping,
    pub normal_flow_limit: NormalFlowLimit,
    /// Friction law for full-flowing force mains.
    pub force_main_eqn: ForceMainEqn,
    /// Gravitational acceleration; defaults to US customary units.
    pub gravity: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            inertial_damping: InertialDamping::default(),
            normal_flow_limit: NormalFlowLimit::default(),
            force_main_eqn: ForceMainEqn::default(),
            gravity: GRAVITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RoutingConfig::default();
        assert_eq!(cfg.inertial_damping, InertialDamping::None);
        assert_eq!(cfg.normal_flow_limit, NormalFlowLimit::Both);
        assert_eq!(cfg.force_main_eqn, ForceMainEqn::HazenWilliams);
        assert!((cfg.gravity - 32.2).abs() < 1e-12);
    }
}
