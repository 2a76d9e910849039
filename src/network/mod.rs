//! Network records consumed by the routing kernel.
//!
//! A [`Project`] is the explicit context a routing step borrows: node and
//! link arrays plus the global routing configuration. The kernel writes
//! only to the link it is updating; nodes are read-only during a
//! sub-iteration (their heads are advanced by the outer iteration between
//! sub-iterations).

pub mod culvert;
pub mod forcemain;

mod link;

pub use culvert::{CulvertParams, InletForm};
pub use forcemain::ForceMainEqn;

use crate::constants::{GRAVITY, PHI};
use crate::dynwave::{FlowClass, RoutingConfig};
use crate::types::{LinkIndex, NodeIndex};
use crate::xsect::Xsect;

/// What a node is; outfalls alter offset handling and flap-gate checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Ordinary junction (manhole).
    Junction,
    /// Terminal node discharging to an external water body.
    Outfall {
        /// One-way gate that blocks flow entering the network from the
        /// receiving water.
        has_flap_gate: bool,
    },
}

/// Point-mass of water volume between conduits.
#[derive(Clone, Debug)]
pub struct Node {
    /// Elevation of the node bottom (ft).
    pub invert_elev: f64,
    /// Current-iteration water depth above the invert (ft).
    pub new_depth: f64,
    pub kind: NodeKind,
}

impl Node {
    /// Junction node at the given invert elevation, initially dry.
    pub fn junction(invert_elev: f64) -> Self {
        Self {
            invert_elev,
            new_depth: 0.0,
            kind: NodeKind::Junction,
        }
    }

    /// Outfall node at the given invert elevation, initially dry.
    pub fn outfall(invert_elev: f64) -> Self {
        Self {
            invert_elev,
            new_depth: 0.0,
            kind: NodeKind::Outfall {
                has_flap_gate: false,
            },
        }
    }

    /// Outfall with a flap gate against reverse inflow.
    pub fn gated_outfall(invert_elev: f64) -> Self {
        Self {
            invert_elev,
            new_depth: 0.0,
            kind: NodeKind::Outfall {
                has_flap_gate: true,
            },
        }
    }

    /// Whether the node is an outfall.
    #[inline]
    pub fn is_outfall(&self) -> bool {
        matches!(self.kind, NodeKind::Outfall { .. })
    }

    /// Water-surface elevation (head) at the node (ft).
    #[inline]
    pub fn head(&self) -> f64 {
        self.invert_elev + self.new_depth
    }
}

/// Degree to which a closed conduit is pressurized at its two ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FullState {
    /// Free surface at both ends.
    #[default]
    NotFull,
    /// Upstream end flowing full.
    UpstreamFull,
    /// Downstream end flowing full.
    DownstreamFull,
    /// Entire conduit pressurized.
    BothFull,
}

impl FullState {
    /// Classify from end areas against the full-flow area.
    pub fn from_areas(a1: f64, a2: f64, a_full: f64) -> Self {
        if a1 >= a_full && a2 >= a_full {
            FullState::BothFull
        } else if a1 >= a_full {
            FullState::UpstreamFull
        } else if a2 >= a_full {
            FullState::DownstreamFull
        } else {
            FullState::NotFull
        }
    }
}

/// Per-conduit constants and per-iteration flow state.
///
/// `rough_factor` and `beta` are precomputed from Manning's `n` and the
/// conduit slope in the constructor; all fields stay public so a caller
/// with its own preprocessing can overwrite them.
#[derive(Clone, Debug)]
pub struct Conduit {
    /// Physical conduit length (ft).
    pub length: f64,
    /// Courant-modified length used by the momentum equation (ft);
    /// never less than `length`.
    pub mod_length: f64,
    /// Conduit slope (ft/ft).
    pub slope: f64,
    /// Number of identical parallel barrels; flow and volume scale
    /// linearly with it.
    pub barrels: f64,
    /// Friction factor `g·(n/φ)²` from Manning's n.
    pub rough_factor: f64,
    /// Normal-flow conveyance coefficient `(φ/n)·√slope`.
    pub beta: f64,
    /// Pressurized-friction roughness: Hazen–Williams C-factor or
    /// Darcy–Weisbach roughness height (ft), depending on
    /// [`ForceMainEqn`].
    pub fm_roughness: f64,
    /// Entrance / exit / distributed minor-loss coefficients.
    pub c_loss_inlet: f64,
    pub c_loss_outlet: f64,
    pub c_loss_avg: f64,
    /// Whether any minor-loss coefficient is nonzero.
    pub has_losses: bool,
    /// Evaporation loss rate for the current step (cfs per barrel).
    pub evap_loss_rate: f64,
    /// Seepage loss rate for the current step (cfs per barrel).
    pub seep_loss_rate: f64,
    /// Inlet-control parameters when the conduit acts as a culvert.
    pub culvert: Option<CulvertParams>,

    /// Current-iteration flow estimates at the two ends (cfs, one barrel).
    pub q1: f64,
    pub q2: f64,
    /// Mid-conduit area, current iteration (ft²).
    pub a1: f64,
    /// Mid-conduit area carried over from the previous time step (ft²).
    pub a2: f64,
    /// Surcharge state from the latest update.
    pub full_state: FullState,
}

impl Conduit {
    /// Conduit constants from Manning's `n` and slope (US units).
    pub fn new(length: f64, manning_n: f64, slope: f64) -> Self {
        debug_assert!(length > 0.0 && manning_n > 0.0 && slope > 0.0);
        Self {
            length,
            mod_length: length,
            slope,
            barrels: 1.0,
            rough_factor: GRAVITY * (manning_n / PHI) * (manning_n / PHI),
            beta: PHI / manning_n * slope.sqrt(),
            fm_roughness: 120.0,
            c_loss_inlet: 0.0,
            c_loss_outlet: 0.0,
            c_loss_avg: 0.0,
            has_losses: false,
            evap_loss_rate: 0.0,
            seep_loss_rate: 0.0,
            culvert: None,
            q1: 0.0,
            q2: 0.0,
            a1: 0.0,
            a2: 0.0,
            full_state: FullState::NotFull,
        }
    }

    /// Set the Courant-modified length (stability-lengthened).
    pub fn with_mod_length(mut self, mod_length: f64) -> Self {
        self.mod_length = mod_length.max(self.length);
        self
    }

    /// Set the number of parallel barrels.
    pub fn with_barrels(mut self, barrels: f64) -> Self {
        debug_assert!(barrels >= 1.0);
        self.barrels = barrels;
        self
    }

    /// Set minor-loss coefficients at inlet, outlet and mid-conduit.
    pub fn with_losses(mut self, inlet: f64, outlet: f64, avg: f64) -> Self {
        self.c_loss_inlet = inlet;
        self.c_loss_outlet = outlet;
        self.c_loss_avg = avg;
        self.has_losses = inlet > 0.0 || outlet > 0.0 || avg > 0.0;
        self
    }

    /// Set culvert inlet-control parameters.
    pub fn with_culvert(mut self, params: CulvertParams) -> Self {
        self.culvert = Some(params);
        self
    }

    /// Carry the current mid-conduit area into the next time step.
    pub fn advance_time_step(&mut self) {
        self.a2 = self.a1;
    }
}

/// A conduit link between two nodes, including its routing outputs.
#[derive(Clone, Debug)]
pub struct Link {
    /// Upstream node.
    pub node1: NodeIndex,
    /// Downstream node.
    pub node2: NodeIndex,
    /// Drop from node 1's invert to the conduit invert (ft).
    pub offset1: f64,
    /// Drop from node 2's invert to the conduit invert (ft).
    pub offset2: f64,
    pub xsect: Xsect,
    pub conduit: Conduit,
    /// One-way gate on the link itself.
    pub has_flap_gate: bool,
    /// Nominal flow direction (+1 or -1) the flap gate honors.
    pub direction: f64,
    /// External control setting; 0 closes the conduit entirely.
    pub setting: f64,
    /// User-supplied flow cap per barrel (cfs); 0 disables it.
    pub q_limit: f64,
    /// Flow from the previous time step (cfs, all barrels).
    pub old_flow: f64,

    // Outputs of the latest sub-iteration.
    pub flow_class: FlowClass,
    pub froude: f64,
    /// Mid-conduit depth (ft).
    pub new_depth: f64,
    /// Stored volume (ft³, all barrels).
    pub new_volume: f64,
    /// Flow rate (cfs, all barrels).
    pub new_flow: f64,
    /// Derivative of flow with respect to head (ft²/s, all barrels).
    pub dqdh: f64,
    /// Free-surface area contributed to the upstream node (ft²).
    pub surf_area1: f64,
    /// Free-surface area contributed to the downstream node (ft²).
    pub surf_area2: f64,
    /// Latest flow was capped by culvert inlet control.
    pub inlet_control: bool,
    /// Latest flow was capped by the normal-flow check.
    pub normal_flow: bool,
}

impl Link {
    /// New conduit link, fully open, with zero invert offsets.
    pub fn new(node1: NodeIndex, node2: NodeIndex, xsect: Xsect, conduit: Conduit) -> Self {
        Self {
            node1,
            node2,
            offset1: 0.0,
            offset2: 0.0,
            xsect,
            conduit,
            has_flap_gate: false,
            direction: 1.0,
            setting: 1.0,
            q_limit: 0.0,
            old_flow: 0.0,
            flow_class: FlowClass::Subcritical,
            froude: 0.0,
            new_depth: 0.0,
            new_volume: 0.0,
            new_flow: 0.0,
            dqdh: 0.0,
            surf_area1: 0.0,
            surf_area2: 0.0,
            inlet_control: false,
            normal_flow: false,
        }
    }

    /// Set invert offsets above the end-node inverts.
    pub fn with_offsets(mut self, offset1: f64, offset2: f64) -> Self {
        self.offset1 = offset1;
        self.offset2 = offset2;
        self
    }

    /// Add a flap gate honoring the link's nominal direction.
    pub fn with_flap_gate(mut self) -> Self {
        self.has_flap_gate = true;
        self
    }

    /// Set a user flow cap per barrel (cfs).
    pub fn with_flow_limit(mut self, q_limit: f64) -> Self {
        self.q_limit = q_limit;
        self
    }

    /// Carry this sub-iteration's results into the next time step.
    pub fn advance_time_step(&mut self) {
        self.old_flow = self.new_flow;
        self.conduit.advance_time_step();
    }
}

/// Explicit routing context: configuration plus the node and link arrays
/// a sub-iteration borrows.
#[derive(Clone, Debug, Default)]
pub struct Project {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub config: RoutingConfig,
}

impl Project {
    /// Empty project with the given configuration.
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            config,
        }
    }

    /// Append a node, returning its index.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        NodeIndex::new(self.nodes.len() - 1)
    }

    /// Append a link, returning its index.
    pub fn add_link(&mut self, link: Link) -> LinkIndex {
        self.links.push(link);
        LinkIndex::new(self.links.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_state_from_areas() {
        assert_eq!(FullState::from_areas(1.0, 1.0, 2.0), FullState::NotFull);
        assert_eq!(FullState::from_areas(2.0, 1.0, 2.0), FullState::UpstreamFull);
        assert_eq!(
            FullState::from_areas(1.0, 2.5, 2.0),
            FullState::DownstreamFull
        );
        assert_eq!(FullState::from_areas(2.0, 2.0, 2.0), FullState::BothFull);
    }

    #[test]
    fn test_conduit_precomputed_constants() {
        let c = Conduit::new(100.0, 0.013, 0.01);
        // rough_factor = g (n/φ)²
        let expected = GRAVITY * (0.013 / PHI) * (0.013 / PHI);
        assert!((c.rough_factor - expected).abs() < 1e-12);
        // beta = φ/n √s
        let beta = PHI / 0.013 * 0.01f64.sqrt();
        assert!((c.beta - beta).abs() < 1e-9);
    }

    #[test]
    fn test_mod_length_never_shrinks() {
        let c = Conduit::new(100.0, 0.013, 0.01).with_mod_length(50.0);
        assert_eq!(c.mod_length, 100.0);
    }

    #[test]
    fn test_node_head() {
        let mut n = Node::junction(10.0);
        n.new_depth = 2.5;
        assert!((n.head() - 12.5).abs() < 1e-12);
        assert!(!n.is_outfall());
        assert!(Node::outfall(0.0).is_outfall());
    }

    #[test]
    fn test_losses_flag() {
        let c = Conduit::new(10.0, 0.013, 0.001).with_losses(0.5, 0.0, 0.0);
        assert!(c.has_losses);
        let c = Conduit::new(10.0, 0.013, 0.001).with_losses(0.0, 0.0, 0.0);
        assert!(!c.has_losses);
    }
}
