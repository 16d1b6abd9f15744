use nalgebra::{Rotation3, Vector3};
use std::f64::consts::PI;

use crate::constants::{Kilometer, Radian, DPI};
use crate::skyfit_errors::SkyfitError;

/// Returns the principal value of an angle in radians, in [0, 2π).
pub fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Returns the principal difference between two angles, in [-π, π].
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let a = principal_angle(a);
    let b = principal_angle(b);

    let mut diff = a - b;
    if diff > PI {
        diff -= DPI;
    } else if diff < -PI {
        diff += DPI;
    }
    diff
}

/// Solve Kepler's equation `E - e·sin(E) = M` for the eccentric anomaly using
/// Newton's method.
///
/// The loop stops when the update falls below `eps` or after `max_iter`
/// iterations. On non-convergence the last iterate is returned; callers must
/// treat the result as a best-effort approximation, never as a hard guarantee.
pub fn solve_eccentric_anomaly(
    mean_anomaly: Radian,
    eccentricity: f64,
    eps: f64,
    max_iter: usize,
) -> Radian {
    // High eccentricities converge poorly from E0 = M; π is a safer start.
    let mut ecc_anomaly = if eccentricity > 0.8 { PI } else { mean_anomaly };

    for _ in 0..max_iter {
        let f = ecc_anomaly - eccentricity * ecc_anomaly.sin() - mean_anomaly;
        let fp = 1.0 - eccentricity * ecc_anomaly.cos();
        let delta = -f / fp;
        ecc_anomaly += delta;
        if delta.abs() < eps {
            break;
        }
    }

    ecc_anomaly
}

/// True anomaly from the eccentric anomaly, for elliptical motion only.
///
/// Uses the half-angle form `ν = 2·atan2(√(1+e)·sin(E/2), √(1−e)·cos(E/2))`,
/// which stays finite near E = π. Eccentricities outside [0, 1) are rejected
/// before any trigonometry runs (the hyperbolic branch would produce NaN).
pub fn true_anomaly(eccentric_anomaly: Radian, eccentricity: f64) -> Result<Radian, SkyfitError> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(SkyfitError::InvalidEccentricity(eccentricity));
    }

    let half = eccentric_anomaly / 2.0;
    Ok(2.0 * ((1.0 + eccentricity).sqrt() * half.sin()).atan2((1.0 - eccentricity).sqrt() * half.cos()))
}

/// Orbital radius at a given true anomaly: `r = a(1−e²)/(1+e·cos ν)`.
pub fn orbital_radius(semi_major_axis: Kilometer, eccentricity: f64, true_anomaly: Radian) -> Kilometer {
    semi_major_axis * (1.0 - eccentricity.powi(2)) / (1.0 + eccentricity * true_anomaly.cos())
}

/// Rotate a point from the perifocal (orbital-plane) frame into the reference
/// frame, composing the standard 3-1-3 Euler sequence
/// `Rz(Ω) · Rx(i) · Rz(ω)`.
pub fn perifocal_to_reference(
    point: &Vector3<f64>,
    inclination: Radian,
    periapsis_argument: Radian,
    node_longitude: Radian,
) -> Vector3<f64> {
    let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), node_longitude)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), periapsis_argument);
    rot * point
}

#[cfg(test)]
mod kepler_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eccentric_anomaly_satisfies_kepler_equation() {
        // Sweep M over [0, 2π) for a grid of elliptical eccentricities and
        // check the returned fixed point against the equation itself.
        for e10 in 0..10 {
            let e = e10 as f64 / 10.0;
            for m10 in 0..63 {
                let m = m10 as f64 / 10.0;
                let ecc_anomaly = solve_eccentric_anomaly(m, e, 1e-9, 1000);
                let residual = ecc_anomaly - e * ecc_anomaly.sin() - m;
                assert!(
                    residual.abs() < 1e-6,
                    "e={e}, M={m}: residual {residual}"
                );
            }
        }
    }

    #[test]
    fn test_true_anomaly_rejects_non_elliptical() {
        assert_eq!(
            true_anomaly(0.5, 1.0),
            Err(SkyfitError::InvalidEccentricity(1.0))
        );
        assert_eq!(
            true_anomaly(0.5, 1.7),
            Err(SkyfitError::InvalidEccentricity(1.7))
        );
        assert_eq!(
            true_anomaly(0.5, -0.1),
            Err(SkyfitError::InvalidEccentricity(-0.1))
        );
    }

    #[test]
    fn test_true_anomaly_circular_is_identity() {
        for m10 in 0..63 {
            let ecc_anomaly = m10 as f64 / 10.0;
            let nu = true_anomaly(ecc_anomaly, 0.0).unwrap();
            assert_relative_eq!(angle_diff(nu, ecc_anomaly), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_orbital_radius_bounds() {
        let a = 8000.0;
        let e = 0.3;
        // Periapsis at ν = 0, apoapsis at ν = π.
        assert_relative_eq!(orbital_radius(a, e, 0.0), a * (1.0 - e), epsilon = 1e-9);
        assert_relative_eq!(orbital_radius(a, e, PI), a * (1.0 + e), epsilon = 1e-9);
        // Circular orbit has constant radius.
        assert_relative_eq!(orbital_radius(a, 0.0, 1.234), a, epsilon = 1e-9);
    }

    #[test]
    fn test_perifocal_rotation() {
        let p = Vector3::new(1.0, 0.0, 0.0);

        // No rotation at all.
        let out = perifocal_to_reference(&p, 0.0, 0.0, 0.0);
        assert_relative_eq!((out - p).norm(), 0.0, epsilon = 1e-12);

        // 90° inclination maps the in-plane y axis onto z.
        let q = Vector3::new(0.0, 1.0, 0.0);
        let out = perifocal_to_reference(&q, PI / 2.0, 0.0, 0.0);
        assert_relative_eq!((out - Vector3::new(0.0, 0.0, 1.0)).norm(), 0.0, epsilon = 1e-12);

        // ω = 90° rotates periapsis onto the y axis.
        let out = perifocal_to_reference(&p, 0.0, PI / 2.0, 0.0);
        assert_relative_eq!((out - Vector3::new(0.0, 1.0, 0.0)).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_helpers() {
        assert_relative_eq!(principal_angle(-0.5), DPI - 0.5, epsilon = 1e-12);
        assert_relative_eq!(principal_angle(DPI + 0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(angle_diff(0.1, DPI - 0.1), 0.2, epsilon = 1e-12);
    }
}
