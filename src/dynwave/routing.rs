//! Whole-project conduit sweeps.
//!
//! One sweep runs the momentum integrator over every conduit link of a
//! project. Within a sub-iteration the node records are read-only and
//! each link is written only by its own update, so the sweep order does
//! not matter and the links may also be processed concurrently (enable
//! the `parallel` feature).

use tracing::trace;

use crate::dynwave::momentum::update_conduit_flow;
use crate::network::Project;
use crate::types::LinkIndex;

#[cfg(feature = "parallel")]
use crate::dynwave::momentum::update_link;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Update every conduit link for one sub-iteration.
///
/// `steps`, `omega` and `dt` are passed through to
/// [`update_conduit_flow`](crate::dynwave::update_conduit_flow).
pub fn update_all_conduits(project: &mut Project, steps: usize, omega: f64, dt: f64) {
    debug_assert!(dt > 0.0, "time step must be positive");
    debug_assert!(omega > 0.0 && omega <= 1.0, "omega must be in (0, 1]");

    for j in 0..project.links.len() {
        update_conduit_flow(project, LinkIndex::new(j), steps, omega, dt);
    }
    trace!(
        links = project.links.len(),
        steps,
        "conduit sweep complete"
    );
}

/// Parallel version of [`update_all_conduits`] using rayon.
///
/// Safe because every update owns its link exclusively and reads nodes
/// and configuration immutably.
#[cfg(feature = "parallel")]
pub fn update_all_conduits_parallel(project: &mut Project, steps: usize, omega: f64, dt: f64) {
    debug_assert!(dt > 0.0, "time step must be positive");
    debug_assert!(omega > 0.0 && omega <= 1.0, "omega must be in (0, 1]");

    let nodes = &project.nodes;
    let config = &project.config;
    project
        .links
        .par_iter_mut()
        .for_each(|link| update_link(link, nodes, config, steps, omega, dt));
    trace!(
        links = project.links.len(),
        steps,
        "parallel conduit sweep complete"
    );
}
