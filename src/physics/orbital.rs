use crate::constants::{MU_EARTH, PI, SECONDS_PER_DAY, WGS84_A};
use nalgebra as na;

pub struct OrbitalMechanics;

#[allow(non_snake_case)]
impl OrbitalMechanics {
    /// Semi-major axis [km] from a mean motion given in revolutions per day.
    pub fn semi_major_axis_from_mean_motion(mean_motion_rev_per_day: f64) -> f64 {
        let n = mean_motion_rev_per_day * 2.0 * PI / SECONDS_PER_DAY; // rad/s
        (MU_EARTH / (n * n)).cbrt()
    }

    /// Mean motion [rad/s] of an orbit with semi-major axis `a` [km]
    pub fn mean_motion(a: f64) -> f64 {
        (MU_EARTH / a.powi(3)).sqrt()
    }

    /// Apoapsis and periapsis radii [km] from semi-major axis and eccentricity
    pub fn compute_apsides(a: f64, e: f64) -> (f64, f64) {
        (a * (1.0 + e), a * (1.0 - e))
    }

    /// Apoapsis and periapsis altitudes above the WGS84 equatorial radius [km]
    pub fn apsis_altitudes(a: f64, e: f64) -> (f64, f64) {
        let (ra, rp) = Self::compute_apsides(a, e);
        (ra - WGS84_A, rp - WGS84_A)
    }

    pub fn eccentric_to_true_anomaly(E: f64, e: f64) -> f64 {
        if e < 1e-11 {
            return E;
        }

        let mut nu = ((1.0 - e * e).sqrt() * E.sin()).atan2(E.cos() - e);
        if nu < 0.0 {
            nu += 2.0 * PI;
        }
        nu
    }

    /// Solves Kepler's equation for the eccentric anomaly.
    pub fn mean_to_eccentric_anomaly(M: f64, e: f64, tolerance: f64, max_iterations: i32) -> f64 {
        let M = M.rem_euclid(2.0 * PI);
        if e < 1e-11 {
            return M;
        }

        // Initial guess
        let mut E = if M < PI { M + e / 2.0 } else { M - e / 2.0 };

        // Newton-Raphson iteration
        for _ in 0..max_iterations {
            let delta = (E - e * E.sin() - M) / (1.0 - e * E.cos());
            E -= delta;
            if delta.abs() <= tolerance {
                break;
            }
        }

        if E < 0.0 {
            E += 2.0 * PI;
        }
        E
    }

    /// Converts Keplerian orbital elements to Cartesian state vectors
    /// Input elements: [a, e, i, Omega, omega, nu]
    ///   a: semi-major axis [km]
    ///   e: eccentricity [-]
    ///   i: inclination [rad]
    ///   Omega: right ascension of ascending node [rad]
    ///   omega: argument of periapsis [rad]
    ///   nu: true anomaly [rad]
    /// Returns: (position, velocity) in the inertial frame [km, km/s]
    pub fn keplerian_to_cartesian(
        elements: &na::Vector6<f64>,
    ) -> (na::Vector3<f64>, na::Vector3<f64>) {
        let mu = MU_EARTH;
        let (a, e, i, omega_cap, omega, nu) = (
            elements[0],
            elements[1],
            elements[2],
            elements[3],
            elements[4],
            elements[5],
        );

        let p = a * (1.0 - e * e);
        let r_mag = p / (1.0 + e * nu.cos());

        let r_orbital = na::Vector3::new(r_mag * nu.cos(), r_mag * nu.sin(), 0.0);
        let v_orbital = na::Vector3::new(
            -(mu / p).sqrt() * nu.sin(),
            (mu / p).sqrt() * (e + nu.cos()),
            0.0,
        );

        let rot_omega = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), omega);
        let rot_i = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), i);
        let rot_omega_cap = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), omega_cap);

        let transform = rot_omega_cap * rot_i * rot_omega;
        (transform * r_orbital, transform * v_orbital)
    }
}
