//! Culvert inlet control.
//!
//! A culvert flowing under inlet control passes no more flow than its
//! entrance can accept at the available headwater depth, regardless of
//! what the momentum equation says the barrel could carry. The capacity
//! curves follow the FHWA HDS-5 inlet-control equations:
//!
//! - unsubmerged (HW/D ≤ 1.0), form 1:
//!   `HW/D = Hc/D + K·(Q/(A·D^0.5))^M` with `Hc` the specific head at
//!   critical depth
//! - unsubmerged, form 2: `HW/D = K·(Q/(A·D^0.5))^M`
//! - submerged (HW/D ≥ 1.2):
//!   `HW/D = c·(Q/(A·D^0.5))² + Y − 0.5·S`
//!
//! Between the two zones the discharge is interpolated linearly in
//! headwater depth. The K/M/c/Y coefficients are supplied per conduit
//! from the published FHWA tables for the inlet's shape and edge
//! condition.

use crate::constants::FUDGE;
use crate::xsect::Xsect;

/// Which form of the unsubmerged inlet-control equation applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InletForm {
    /// Referenced to the specific head at critical depth.
    Form1,
    /// Referenced directly to the headwater depth.
    Form2,
}

/// FHWA inlet-control coefficients for one culvert entrance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CulvertParams {
    pub form: InletForm,
    /// Unsubmerged coefficient K.
    pub k: f64,
    /// Unsubmerged exponent M.
    pub m: f64,
    /// Submerged coefficient c.
    pub c: f64,
    /// Submerged intercept Y.
    pub y: f64,
}

/// Apply inlet control to a candidate flow.
///
/// `yhw` is the headwater depth above the culvert entrance invert and
/// `q` the dynamic-wave flow (both per barrel, `q > 0`). Returns the
/// possibly capped flow and whether the cap bound.
pub(crate) fn capped_inflow(
    xsect: &Xsect,
    slope: f64,
    params: &CulvertParams,
    q: f64,
    yhw: f64,
    gravity: f64,
) -> (f64, bool) {
    let capacity = inlet_capacity(xsect, slope, params, yhw, gravity);
    if capacity < q {
        (capacity, true)
    } else {
        (q, false)
    }
}

/// Inlet-control discharge capacity at headwater depth `yhw` (cfs).
pub fn inlet_capacity(
    xsect: &Xsect,
    slope: f64,
    params: &CulvertParams,
    yhw: f64,
    gravity: f64,
) -> f64 {
    if yhw <= FUDGE {
        return 0.0;
    }
    let d = xsect.y_full;
    if yhw <= d {
        unsubmerged_discharge(xsect, params, yhw, gravity)
    } else if yhw >= 1.2 * d {
        submerged_discharge(xsect, slope, params, yhw)
    } else {
        // Transition zone: interpolate between the unsubmerged capacity
        // at HW = D and the submerged capacity at HW = 1.2·D.
        let q1 = unsubmerged_discharge(xsect, params, d, gravity);
        let q2 = submerged_discharge(xsect, slope, params, 1.2 * d);
        q1 + (q2 - q1) * (yhw - d) / (0.2 * d)
    }
}

fn submerged_discharge(xsect: &Xsect, slope: f64, params: &CulvertParams, yhw: f64) -> f64 {
    let d = xsect.y_full;
    let arg = (yhw / d - params.y + 0.5 * slope) / params.c;
    if arg <= 0.0 {
        return 0.0;
    }
    xsect.a_full * d.sqrt() * arg.sqrt()
}

fn unsubmerged_discharge(xsect: &Xsect, params: &CulvertParams, yhw: f64, gravity: f64) -> f64 {
    let d = xsect.y_full;
    match params.form {
        InletForm::Form2 => {
            let arg = yhw / d / params.k;
            if arg <= 0.0 {
                return 0.0;
            }
            xsect.a_full * d.sqrt() * arg.powf(1.0 / params.m)
        }
        InletForm::Form1 => {
            // Headwater is implicit in Q through the critical-head term;
            // bracket the discharge and bisect on required headwater.
            let required = |q: f64| form1_headwater(xsect, params, q, gravity);
            let mut hi = xsect.a_full * (gravity * d).sqrt();
            let mut grew = 0;
            while required(hi) < yhw && grew < 60 {
                hi *= 2.0;
                grew += 1;
            }
            let mut lo = 0.0;
            for _ in 0..40 {
                let mid = 0.5 * (lo + hi);
                if required(mid) < yhw {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            0.5 * (lo + hi)
        }
    }
}

/// Headwater depth the form-1 equation requires for discharge `q`.
fn form1_headwater(xsect: &Xsect, params: &CulvertParams, q: f64, gravity: f64) -> f64 {
    if q <= 0.0 {
        return 0.0;
    }
    let d = xsect.y_full;
    let yc = xsect.critical_depth(q, gravity);
    let ac = xsect.a_of_y(yc).max(FUDGE);
    let vc = q / ac;
    let hc = yc + vc * vc / (2.0 * gravity);
    let x = q / (xsect.a_full * d.sqrt());
    hc + params.k * x.powf(params.m) * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GRAVITY;

    /// Concrete pipe, square edge with headwall (FHWA chart 1, scale 1).
    fn square_edge() -> CulvertParams {
        CulvertParams {
            form: InletForm::Form1,
            k: 0.0098,
            m: 2.0,
            c: 0.0398,
            y: 0.67,
        }
    }

    #[test]
    fn test_no_headwater_no_capacity() {
        let xs = Xsect::circular(2.0);
        assert_eq!(inlet_capacity(&xs, 0.01, &square_edge(), 0.0, GRAVITY), 0.0);
    }

    #[test]
    fn test_capacity_monotone_in_headwater() {
        let xs = Xsect::circular(2.0);
        let p = square_edge();
        let mut last = 0.0;
        for i in 1..=30 {
            let yhw = 0.1 * i as f64;
            let cap = inlet_capacity(&xs, 0.01, &p, yhw, GRAVITY);
            assert!(
                cap >= last,
                "capacity dropped at yhw = {yhw}: {cap} < {last}"
            );
            last = cap;
        }
    }

    #[test]
    fn test_transition_is_continuous() {
        let xs = Xsect::circular(2.0);
        let p = square_edge();
        let d = xs.y_full;
        let eps = 1e-6;
        let below = inlet_capacity(&xs, 0.01, &p, d - eps, GRAVITY);
        let at = inlet_capacity(&xs, 0.01, &p, d, GRAVITY);
        let above = inlet_capacity(&xs, 0.01, &p, 1.2 * d + eps, GRAVITY);
        let at_sub = inlet_capacity(&xs, 0.01, &p, 1.2 * d, GRAVITY);
        assert!((below - at).abs() < 1e-3);
        assert!((above - at_sub).abs() < 1e-3);
    }

    #[test]
    fn test_cap_binds_only_when_smaller() {
        let xs = Xsect::circular(2.0);
        let p = square_edge();
        // Deep headwater: large capacity, small q passes through.
        let (q, capped) = capped_inflow(&xs, 0.01, &p, 0.5, 3.0, GRAVITY);
        assert_eq!(q, 0.5);
        assert!(!capped);
        // Shallow headwater: a large dynamic flow gets capped.
        let (q, capped) = capped_inflow(&xs, 0.01, &p, 100.0, 0.5, GRAVITY);
        assert!(capped);
        assert!(q < 100.0);
        assert!(q >= 0.0);
    }

    #[test]
    fn test_form2_explicit_inverse() {
        let xs = Xsect::circular(3.0);
        let p = CulvertParams {
            form: InletForm::Form2,
            k: 0.0145,
            m: 1.75,
            c: 0.0419,
            y: 0.64,
        };
        let d = xs.y_full;
        let yhw = 0.8 * d;
        let q = unsubmerged_discharge(&xs, &p, yhw, GRAVITY);
        // Forward equation recovers the headwater ratio.
        let x = q / (xs.a_full * d.sqrt());
        let hw_ratio = p.k * x.powf(p.m);
        assert!((hw_ratio - yhw / d).abs() < 1e-9);
    }
}
