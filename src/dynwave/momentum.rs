//! The conduit momentum-equation integrator.
//!
//! One call advances one conduit through one sub-iteration of the outer
//! head-balancing loop, solving a finite-difference form of the
//! Saint-Venant momentum equation
//!
//! ∂Q/∂t + ∂(Q²/A)/∂x + g·A·∂H/∂x + g·A·Sf + g·A·hL = 0
//!
//! for the new flow. The discrete update collects six terms:
//!
//! 1. friction slope (Manning, or a pressurized law for full force mains)
//! 2. energy slope `g·A·(h2 − h1)/L`
//! 3. local inertia `2·v·(aMid − aOld)`
//! 4. convective inertia `v²·(a2 − a1)/L`
//! 5. minor (entrance/exit/fitting) losses
//! 6. evaporation and seepage momentum loss
//!
//! terms 1 and 5 divide the update (they act on the new flow); the rest
//! add to it. The candidate flow then runs a gauntlet of limitations:
//! culvert inlet control, the normal-flow cap, under-relaxation with a
//! sign-change snap, the user flow cap, flap gates, and dry-node chokes.

use crate::constants::{sign, FUDGE, MAX_VELOCITY};
use crate::dynwave::surface::find_surf_area;
use crate::dynwave::{FlowClass, InertialDamping, NormalFlowLimit, RoutingConfig};
use crate::network::{culvert, forcemain, FullState, Link, Node, Project};
use crate::types::LinkIndex;

/// Update one conduit's flow for the current sub-iteration.
///
/// `steps` is the sub-iteration index (0 skips under-relaxation), `omega`
/// the under-relaxation weight in `(0, 1]`, and `dt` the time step in
/// seconds. Results land on the link: `new_flow`, `new_depth`,
/// `new_volume`, `dqdh`, `froude`, `flow_class`, the two surface areas,
/// and the limitation flags, plus the conduit's `q1`/`q2`/`a1` and
/// surcharge state.
pub fn update_conduit_flow(
    project: &mut Project,
    j: LinkIndex,
    steps: usize,
    omega: f64,
    dt: f64,
) {
    let nodes = &project.nodes;
    let config = &project.config;
    let link = &mut project.links[j];
    update_link(link, nodes, config, steps, omega, dt);
}

/// Per-link body of [`update_conduit_flow`], free of the project borrow
/// so sweeps can iterate links directly.
pub(crate) fn update_link(
    link: &mut Link,
    nodes: &[Node],
    config: &RoutingConfig,
    steps: usize,
    omega: f64,
    dt: f64,
) {
    let is_closed = link.setting == 0.0;

    let barrels = link.conduit.barrels;
    let q_old = link.old_flow / barrels;
    let q_last = link.conduit.q1;

    // Current heads at both ends, floored at the conduit inverts.
    let node1 = &nodes[link.node1];
    let node2 = &nodes[link.node2];
    let z1 = node1.invert_elev + link.offset1;
    let z2 = node2.invert_elev + link.offset2;
    let h1 = node1.head().max(z1);
    let h2 = node2.head().max(z2);

    // Unadjusted end depths, clamped to the conduit barrel.
    let y_full = link.xsect.y_full;
    let y1 = (h1 - z1).clamp(FUDGE, y_full);
    let y2 = (h2 - z2).clamp(FUDGE, y_full);

    let a_old = link.conduit.a2.max(FUDGE);

    // Courant-modified length, not the physical one.
    let length = link.conduit.mod_length;

    // Distribute surface area off the previous iterate's flow; this sets
    // the flow class and may pin an end depth to critical or the floor.
    let (h1, h2, y1, y2) = find_surf_area(
        link,
        nodes,
        config.gravity,
        q_last,
        length,
        h1,
        h2,
        y1,
        y2,
    );

    // End areas, upstream hydraulic radius, and midpoint properties.
    let a1 = link.xsect.a_of_y(y1);
    let a2 = link.xsect.a_of_y(y2);
    let r1 = link.xsect.r_of_y(y1);
    let y_mid = 0.5 * (y1 + y2);
    let a_mid = link.xsect.a_of_y(y_mid);
    let r_mid = link.xsect.r_of_y(y_mid);

    let is_full = y1 >= y_full && y2 >= y_full;

    // Dry regime, closed by control, or a degenerate section: no flow.
    if link.flow_class.is_dry() || is_closed || a_mid <= FUDGE {
        link.conduit.a1 = 0.5 * (a1 + a2);
        link.conduit.q1 = 0.0;
        link.conduit.q2 = 0.0;
        link.dqdh = config.gravity * dt * a_mid / length * barrels;
        link.froude = 0.0;
        link.new_depth = y_mid.min(y_full);
        link.new_volume = link.conduit.a1 * link.conduit.length * barrels;
        link.new_flow = 0.0;
        return;
    }

    // Velocity from the previous flow estimate, magnitude-capped.
    let mut v = q_last / a_mid;
    if v.abs() > MAX_VELOCITY {
        v = MAX_VELOCITY * sign(q_last);
    }

    link.froude = link.froude_number(v, y_mid, config.gravity);
    if link.flow_class == FlowClass::Subcritical && link.froude > 1.0 {
        link.flow_class = FlowClass::Supercritical;
    }

    // Inertial damping factor: full inertia below Fr 0.5, none above 1.
    let mut sigma = if link.froude <= 0.5 {
        1.0
    } else if link.froude >= 1.0 {
        0.0
    } else {
        2.0 * (1.0 - link.froude)
    };

    // Upstream weighting of area and hydraulic radius.
    let mut rho = 1.0;
    if !is_full && q_last > 0.0 && h1 >= h2 {
        rho = sigma;
    }
    let a_wtd = a1 + (a_mid - a1) * rho;
    let r_wtd = r1 + (r_mid - r1) * rho;

    // Global damping override; a surcharged closed conduit is always
    // fully damped.
    match config.inertial_damping {
        InertialDamping::None => sigma = 1.0,
        InertialDamping::Full => sigma = 0.0,
        InertialDamping::Partial => {}
    }
    if is_full && !link.xsect.is_open() {
        sigma = 0.0;
    }

    // 1. friction slope term
    let dq1 = if link.xsect.is_force_main() && is_full {
        dt * forcemain::friction_slope(
            &link.conduit,
            config.force_main_eqn,
            v.abs(),
            r_mid,
            config.gravity,
        )
    } else {
        dt * link.conduit.rough_factor / r_wtd.powf(4.0 / 3.0) * v.abs()
    };

    // 2. energy slope term
    let dq2 = dt * config.gravity * a_wtd * (h2 - h1) / length;

    // 3 & 4. inertial terms
    let mut dq3 = 0.0;
    let mut dq4 = 0.0;
    if sigma > 0.0 {
        dq3 = 2.0 * v * (a_mid - a_old) * sigma;
        dq4 = dt * v * v * (a2 - a1) / length * sigma;
    }

    // 5. minor losses term
    let dq5 = if link.conduit.has_losses {
        find_local_losses(link, a1, a2, a_mid, q_last) / 2.0 / length * dt
    } else {
        0.0
    };

    // 6. evaporation and seepage losses per unit length
    let dq6 = link.loss_rate(q_old) * 2.5 * dt * v / link.conduit.length;

    // Combine terms into the new conduit flow.
    let denom = 1.0 + dq1 + dq5;
    let mut q = (q_old - dq2 + dq3 + dq4 - dq6) / denom;

    // Derivative of flow w.r.t. head, for the outer iteration.
    link.dqdh = 1.0 / denom * config.gravity * dt * a_wtd / length * barrels;

    // Flow limitations apply to downstream-directed flow.
    link.inlet_control = false;
    link.normal_flow = false;
    if q > 0.0 {
        if let (Some(params), false) = (link.conduit.culvert, is_full) {
            // Inlet-controlled culvert flow.
            let yhw = h1 - (node1.invert_elev + link.offset1);
            let (q_capped, capped) = culvert::capped_inflow(
                &link.xsect,
                link.conduit.slope,
                &params,
                q,
                yhw,
                config.gravity,
            );
            q = q_capped;
            link.inlet_control = capped;
        } else if y1 < y_full
            && matches!(
                link.flow_class,
                FlowClass::Subcritical | FlowClass::Supercritical
            )
        {
            q = check_normal_flow(link, nodes, config, q, y1, y2, a1, r1);
        }
    }

    // Under-relax against the previous iterate; a change of flow
    // direction must pass through (almost) zero first.
    if steps > 0 {
        q = (1.0 - omega) * q_last + omega * q;
        if q * q_last < 0.0 {
            q = 0.001 * sign(q);
        }
    }

    // User-supplied flow cap.
    if link.q_limit > 0.0 && q.abs() > link.q_limit {
        q = sign(q) * link.q_limit;
    }

    // Reverse flow against a closed flap gate.
    if link.flap_gate_closed(nodes, q) {
        q = 0.0;
    }

    // No flow out of a dry node.
    if q > FUDGE && node1.new_depth <= FUDGE {
        q = FUDGE;
    }
    if q < -FUDGE && node2.new_depth <= FUDGE {
        q = -FUDGE;
    }

    // Save new area, flow, depth and volume.
    link.conduit.a1 = a_mid;
    link.conduit.q1 = q;
    link.conduit.q2 = q;
    link.new_depth = y_mid.min(y_full);
    let a_avg = (0.5 * (a1 + a2)).min(link.xsect.a_full);
    link.conduit.full_state = FullState::from_areas(a1, a2, link.xsect.a_full);
    link.new_volume = a_avg * link.conduit.length * barrels;
    link.new_flow = q * barrels;
}

/// Minor-loss contribution to the momentum equation (ft/s).
///
/// Each coefficient scales the velocity head at its own section; a
/// section too small to define a velocity is skipped.
fn find_local_losses(link: &Link, a1: f64, a2: f64, a_mid: f64, q: f64) -> f64 {
    let q = q.abs();
    let mut losses = 0.0;
    if a1 > FUDGE {
        losses += link.conduit.c_loss_inlet * q / a1;
    }
    if a2 > FUDGE {
        losses += link.conduit.c_loss_outlet * q / a2;
    }
    if a_mid > FUDGE {
        losses += link.conduit.c_loss_avg * q / a_mid;
    }
    losses
}

/// Replace a dynamic flow with normal flow when the limitation applies.
///
/// The slope trigger fires when the water surface slopes against the
/// conduit; the Froude trigger when the upstream end runs supercritical.
/// A conduit touching an outfall always uses the slope trigger and never
/// the Froude one.
#[allow(clippy::too_many_arguments)]
fn check_normal_flow(
    link: &mut Link,
    nodes: &[Node],
    config: &RoutingConfig,
    q: f64,
    y1: f64,
    y2: f64,
    a1: f64,
    r1: f64,
) -> f64 {
    let has_outfall = nodes[link.node1].is_outfall() || nodes[link.node2].is_outfall();
    let limit = config.normal_flow_limit;
    let mut check = false;

    // Water-surface slope flatter than the conduit slope.
    if matches!(limit, NormalFlowLimit::Slope | NormalFlowLimit::Both) || has_outfall {
        if y1 < y2 {
            check = true;
        }
    }

    // Supercritical at the upstream end.
    if !check
        && matches!(limit, NormalFlowLimit::Froude | NormalFlowLimit::Both)
        && !has_outfall
        && y1 > FUDGE
        && y2 > FUDGE
    {
        let froude1 = link.froude_number(q / a1, y1, config.gravity);
        if froude1 >= 1.0 {
            check = true;
        }
    }

    if check {
        let q_norm = link.conduit.beta * a1 * r1.powf(2.0 / 3.0);
        if q_norm < q {
            link.normal_flow = true;
            return q_norm;
        }
    }
    q
}
