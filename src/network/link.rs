//! Hydraulic helper queries on a link.
//!
//! These are the narrow collaborators the momentum integrator calls:
//! Froude number, normal and critical depth for a given discharge, the
//! evaporation/seepage loss rate, and the flap-gate check.

use crate::constants::FUDGE;
use crate::network::{Link, Node, NodeKind};

impl Link {
    /// Froude number at velocity `v` and depth `y`.
    ///
    /// Uses the hydraulic depth `A/W`. A closed conduit within `FUDGE` of
    /// its crown is friction-controlled rather than wave-controlled, so
    /// the result there is 0.
    pub fn froude_number(&self, v: f64, y: f64, gravity: f64) -> f64 {
        if y <= FUDGE {
            return 0.0;
        }
        if !self.xsect.is_open() && self.xsect.y_full - y <= FUDGE {
            return 0.0;
        }
        let w = self.xsect.w_of_y(y);
        if w <= FUDGE {
            return 0.0;
        }
        let y_hyd = self.xsect.a_of_y(y) / w;
        v.abs() / (gravity * y_hyd).sqrt()
    }

    /// Normal (steady uniform) flow depth for discharge `q` (ft).
    ///
    /// Inverts the section factor through the conveyance coefficient:
    /// `A·R^(2/3) = |q|/β`. Force mains are full whenever they flow.
    pub fn normal_depth(&self, q: f64) -> f64 {
        if self.xsect.is_force_main() {
            return self.xsect.y_full;
        }
        let q = q.abs();
        if q <= 0.0 {
            return 0.0;
        }
        self.xsect.y_of_section_factor(q / self.conduit.beta)
    }

    /// Critical flow depth for discharge `q` (ft).
    pub fn critical_depth(&self, q: f64, gravity: f64) -> f64 {
        self.xsect.critical_depth(q, gravity)
    }

    /// Evaporation + seepage loss rate for the step (cfs per barrel).
    ///
    /// The loss cannot exceed the flow that is available to lose.
    pub fn loss_rate(&self, q: f64) -> f64 {
        let rate = self.conduit.evap_loss_rate + self.conduit.seep_loss_rate;
        if rate > 0.0 {
            rate.min(q.abs())
        } else {
            0.0
        }
    }

    /// Whether a flap gate blocks flow `q` through this link.
    ///
    /// Checks the link's own gate against its nominal direction, then any
    /// outfall flap gate at the end the flow would enter from.
    pub fn flap_gate_closed(&self, nodes: &[Node], q: f64) -> bool {
        if self.has_flap_gate && q * self.direction < 0.0 {
            return true;
        }
        let inflow_node = if q < 0.0 {
            Some(self.node2)
        } else if q > 0.0 {
            Some(self.node1)
        } else {
            None
        };
        if let Some(n) = inflow_node {
            if let NodeKind::Outfall { has_flap_gate: true } = nodes[n].kind {
                return true;
            }
        }
        false
    }
}
