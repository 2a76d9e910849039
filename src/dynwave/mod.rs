//! Dynamic-wave conduit flow routing.
//!
//! The kernel advances one conduit through one sub-iteration of the
//! outer head-balancing loop: read the endpoint heads, classify the flow
//! regime, distribute free-surface area to the end nodes, assemble the
//! finite-difference momentum equation, solve for the new flow, apply
//! the flow-limitation gates, and under-relax against the previous
//! iterate. See [`update_conduit_flow`] for the full sequence.

mod classify;
mod config;
mod momentum;
mod routing;
mod surface;

pub use classify::{classify, Classification, FlowClass};
pub use config::{InertialDamping, NormalFlowLimit, RoutingConfig};
pub use momentum::update_conduit_flow;
pub use routing::update_all_conduits;
#[cfg(feature = "parallel")]
pub use routing::update_all_conduits_parallel;
