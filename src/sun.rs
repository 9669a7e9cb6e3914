use glam::Vec3;

use crate::params::Parameters;

/// Builds a vector from spherical coordinates with the polar angle `phi`
/// measured from +Y and the azimuth `theta` measured around Y from +Z.
pub fn from_spherical(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi_radius = phi.sin() * radius;
    Vec3::new(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}

/// Unit vector pointing at the sun for the given elevation/azimuth pair.
pub fn sun_direction(elevation_deg: f32, azimuth_deg: f32) -> Vec3 {
    let phi = (90.0 - elevation_deg).to_radians();
    let theta = azimuth_deg.to_radians();
    from_spherical(1.0, phi, theta)
}

pub fn sun_direction_for(params: &Parameters) -> Vec3 {
    sun_direction(params.elevation, params.azimuth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_sun_behind_points_down_negative_z() {
        let sun = sun_direction(0.5, 180.0);
        assert!(sun.x.abs() < 1e-6);
        assert!((sun.y - 0.0087).abs() < 1e-4);
        assert!((sun.z + 0.99996).abs() < 1e-4);
    }

    #[test]
    fn direction_is_unit_over_the_whole_range() {
        let mut elevation = 0.0;
        while elevation <= 90.0 {
            let mut azimuth = -180.0;
            while azimuth <= 180.0 {
                let sun = sun_direction(elevation, azimuth);
                assert!(
                    (sun.length() - 1.0).abs() < 1e-5,
                    "non-unit sun at elevation={elevation} azimuth={azimuth}"
                );
                azimuth += 7.5;
            }
            elevation += 2.5;
        }
    }

    #[test]
    fn zenith_ignores_azimuth() {
        for azimuth in [-180.0, -45.0, 0.0, 90.0] {
            let sun = sun_direction(90.0, azimuth);
            assert!((sun - Vec3::Y).length() < 1e-6);
        }
    }
}
