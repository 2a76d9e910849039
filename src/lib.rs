//! # dynwave
//!
//! A dynamic-wave flow routing kernel for stormwater conduit networks.
//!
//! This crate provides the per-conduit core of a hydraulic simulator:
//! - Cross-section geometry (circular, rectangular, trapezoidal,
//!   triangular, force main, and tabulated custom shapes)
//! - Flow-regime classification (dry, subcritical, supercritical, and
//!   critical- or dry-ended states)
//! - Free-surface area distribution to the end nodes
//! - A finite-difference Saint-Venant momentum integrator with inertial
//!   damping, upstream weighting, friction and minor losses,
//!   under-relaxation, and flow-limitation checks (culvert inlet
//!   control, normal-flow capping, flap gates, dry-node cutoffs)
//! - A symbolic math expression evaluator (infix formulas compiled to
//!   postfix programs)
//!
//! The outer head-balancing iteration, input parsing, and reporting are
//! the caller's business: the kernel consumes node heads and per-conduit
//! constants and returns a new flow, depth, volume, and a flow-head
//! derivative through the link records.
//!
//! Units are US customary (feet, seconds, cfs) by default; the numerics
//! are unit-agnostic as long as the configuration's gravity and the
//! conduit constants agree.

pub mod constants;
pub mod dynwave;
pub mod mathexpr;
pub mod network;
pub mod types;
pub mod xsect;

// Re-export main types for convenience
pub use constants::{FUDGE, GRAVITY, MAX_VELOCITY};
pub use dynwave::{
    classify, update_all_conduits, update_conduit_flow, Classification, FlowClass,
    InertialDamping, NormalFlowLimit, RoutingConfig,
};
#[cfg(feature = "parallel")]
pub use dynwave::update_all_conduits_parallel;
pub use mathexpr::{BuildError, MathExpr, Opcode};
pub use network::{
    Conduit, CulvertParams, ForceMainEqn, FullState, InletForm, Link, Node, NodeKind, Project,
};
pub use types::{LinkIndex, NodeIndex};
pub use xsect::{ShapeCurve, Xsect, XsectShape};
