//! Conversion of viewpoint angles into the camera placement the renderer
//! expects: a world-space location and an XYZ Euler rotation.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::viewpoint::Viewpoint;

/// Orientation of a camera sitting on the +X axis and looking at the origin,
/// in degrees per axis.
const BASE_ROTATION_DEG: DVec3 = DVec3::new(90.0, 0.0, 90.0);

/// Camera location and XYZ Euler rotation (radians) for one viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub location: DVec3,
    pub rotation: DVec3,
}

/// Converts object-centered spherical coordinates into a world location.
///
/// `azimuth` and `elevation` are in degrees; the result has the same unit as
/// `distance`.
pub fn camera_location(azimuth: f64, elevation: f64, distance: f64) -> DVec3 {
    let phi = elevation.to_radians();
    let theta = azimuth.to_radians();
    DVec3::new(
        distance * phi.cos() * theta.cos(),
        distance * phi.cos() * theta.sin(),
        distance * phi.sin(),
    )
}

/// Returns the camera rotation as XYZ-ordered Euler angles in radians.
///
/// Elevation tilts the camera down around X and azimuth swings it around Z.
/// `tilt` is accepted for symmetry with [`Viewpoint`] but does not affect the
/// result: camera roll is always zero.
pub fn camera_rotation(azimuth: f64, elevation: f64, _tilt: f64) -> DVec3 {
    let degrees = DVec3::new(
        BASE_ROTATION_DEG.x - elevation,
        BASE_ROTATION_DEG.y,
        BASE_ROTATION_DEG.z + azimuth,
    );
    DVec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

pub fn camera_pose(viewpoint: &Viewpoint) -> CameraPose {
    CameraPose {
        location: camera_location(viewpoint.azimuth, viewpoint.elevation, viewpoint.distance),
        rotation: camera_rotation(viewpoint.azimuth, viewpoint.elevation, viewpoint.tilt),
    }
}

/// Parses a numeric token such as `"45"` or `" 1.5e1 "`.
pub fn parse_scalar(value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| Error::NotNumeric {
        value: value.to_string(),
    })
}
