//! Pressurized friction for force mains.
//!
//! Once a force main runs full, open-channel Manning friction no longer
//! applies; the momentum integrator swaps its friction term for one of
//! the two classic pressurized-pipe laws. Both functions return the
//! quantity `g·Sf/|v|` (1/s) that the flow-update denominator consumes,
//! matching the Manning term `g·(n/φ)²·|v| / R^(4/3)`.

use crate::network::Conduit;

/// Kinematic viscosity of water at about 60 °F (ft²/s).
const KIN_VISCOSITY: f64 = 1.08e-5;

/// Friction law applied to full-flowing force mains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForceMainEqn {
    /// Hazen–Williams; the conduit roughness is the C-factor.
    #[default]
    HazenWilliams,
    /// Darcy–Weisbach; the conduit roughness is the equivalent sand
    /// roughness height (ft).
    DarcyWeisbach,
}

/// Friction-slope term `g·Sf/|v|` for a full force main (1/s).
///
/// `v_abs` is the velocity magnitude and `r` the hydraulic radius at the
/// conduit midpoint.
pub fn friction_slope(
    conduit: &Conduit,
    eqn: ForceMainEqn,
    v_abs: f64,
    r: f64,
    gravity: f64,
) -> f64 {
    if v_abs <= 0.0 || r <= 0.0 {
        return 0.0;
    }
    match eqn {
        ForceMainEqn::HazenWilliams => {
            // Sf = [v / (1.318·C·R^0.63)]^1.852
            let c = conduit.fm_roughness;
            gravity * v_abs.powf(0.852) / (1.318 * c).powf(1.852) / r.powf(1.167)
        }
        ForceMainEqn::DarcyWeisbach => {
            let f = friction_factor(conduit.fm_roughness, v_abs, r);
            // Sf = f·v² / (8·g·R)
            f * v_abs / (8.0 * r)
        }
    }
}

/// Darcy friction factor from roughness height and flow state.
///
/// Laminar below Re = 2000, Swamee–Jain above Re = 4000, linear blend in
/// between.
fn friction_factor(rough_height: f64, v_abs: f64, r: f64) -> f64 {
    let re = v_abs * 4.0 * r / KIN_VISCOSITY;
    if re < 10.0 {
        return 64.0 / 10.0;
    }
    let laminar = 64.0 / re;
    if re < 2000.0 {
        return laminar;
    }
    let turbulent = swamee_jain(rough_height, r, re.max(4000.0));
    if re > 4000.0 {
        return turbulent;
    }
    let t = (re - 2000.0) / 2000.0;
    laminar + t * (turbulent - laminar)
}

fn swamee_jain(rough_height: f64, r: f64, re: f64) -> f64 {
    // Relative roughness uses the equivalent diameter D = 4R.
    let arg = rough_height / (3.7 * 4.0 * r) + 5.74 / re.powf(0.9);
    0.25 / arg.log10().powi(2)
}
