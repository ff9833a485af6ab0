//! Viewpoints and the per-object sample sets handed to the renderer.

use std::collections::btree_map::{self, BTreeMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::camera::{self, CameraPose};
use crate::error::{Error, Result};

/// Camera placement relative to an object's local origin.
///
/// Azimuth and elevation are object-centered spherical angles in degrees,
/// tilt is the camera roll in degrees and distance is expressed in the
/// object's working units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub azimuth: f64,
    pub elevation: f64,
    pub tilt: f64,
    pub distance: f64,
}

impl Viewpoint {
    pub const fn new(azimuth: f64, elevation: f64, tilt: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            tilt,
            distance,
        }
    }

    /// Builds a viewpoint from exactly four numeric tokens in
    /// `azimuth elevation tilt distance` order.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self> {
        let [azimuth, elevation, tilt, distance] = tokens else {
            return Err(Error::InvalidViewpoint(format!(
                "expected 4 values (azimuth elevation tilt distance), found {}",
                tokens.len()
            )));
        };
        Ok(Self::new(
            camera::parse_scalar(azimuth)?,
            camera::parse_scalar(elevation)?,
            camera::parse_scalar(tilt)?,
            camera::parse_scalar(distance)?,
        ))
    }

    /// Checks that every component is finite and the distance is positive.
    pub fn validate(&self) -> Result<()> {
        let components = [self.azimuth, self.elevation, self.tilt, self.distance];
        if components.iter().any(|value| !value.is_finite()) {
            return Err(Error::InvalidViewpoint(format!(
                "non-finite component in {self:?}"
            )));
        }
        if self.distance <= 0.0 {
            return Err(Error::InvalidViewpoint(format!(
                "distance must be positive, found {}",
                self.distance
            )));
        }
        Ok(())
    }

    /// Azimuth wrapped into `[0, 360)`.
    pub fn normalized_azimuth(&self) -> f64 {
        let wrapped = self.azimuth.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if wrapped >= 360.0 { 0.0 } else { wrapped }
    }

    pub fn camera_pose(&self) -> CameraPose {
        camera::camera_pose(self)
    }
}

/// One object file and the viewpoints it should be rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub path: PathBuf,
    pub viewpoints: Vec<Viewpoint>,
}

impl Model {
    pub fn new(path: impl Into<PathBuf>, viewpoints: Vec<Viewpoint>) -> Self {
        Self {
            path: path.into(),
            viewpoints,
        }
    }
}

/// Every sampled object of one run, keyed by object id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleSet {
    models: BTreeMap<String, Model>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, object_id: &str) -> Option<&Model> {
        self.models.get(object_id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Model> {
        self.models.iter()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Total number of viewpoints across all models.
    pub fn viewpoint_count(&self) -> usize {
        self.models.values().map(|model| model.viewpoints.len()).sum()
    }
}

impl FromIterator<(String, Model)> for SampleSet {
    fn from_iter<I: IntoIterator<Item = (String, Model)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = (&'a String, &'a Model);
    type IntoIter = btree_map::Iter<'a, String, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tokens_coerces_numeric_strings() {
        let vp = Viewpoint::from_tokens(&["45", "30.5", "0", "1.2"]).unwrap();
        assert_eq!(vp, Viewpoint::new(45.0, 30.5, 0.0, 1.2));
    }

    #[test]
    fn from_tokens_rejects_wrong_arity() {
        assert!(Viewpoint::from_tokens(&["1", "2", "3"]).is_err());
        assert!(Viewpoint::from_tokens(&["1", "2", "3", "4", "5"]).is_err());
    }

    #[test]
    fn from_tokens_rejects_non_numeric() {
        let err = Viewpoint::from_tokens(&["north", "2", "3", "4"]).unwrap_err();
        assert!(matches!(err, Error::NotNumeric { .. }));
    }

    #[test]
    fn validate_requires_positive_distance() {
        assert!(Viewpoint::new(0.0, 0.0, 0.0, 1.0).validate().is_ok());
        assert!(Viewpoint::new(0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(Viewpoint::new(f64::NAN, 0.0, 0.0, 1.0).validate().is_err());
    }

    #[test]
    fn normalized_azimuth_wraps() {
        assert_eq!(Viewpoint::new(370.0, 0.0, 0.0, 1.0).normalized_azimuth(), 10.0);
        assert_eq!(Viewpoint::new(-90.0, 0.0, 0.0, 1.0).normalized_azimuth(), 270.0);
    }

    #[test]
    fn sample_set_counts_viewpoints() {
        let vp = Viewpoint::new(0.0, 15.0, 0.0, 1.0);
        let set: SampleSet = [
            ("a".to_string(), Model::new("a/model.obj", vec![vp; 2])),
            ("b".to_string(), Model::new("b/model.obj", vec![vp; 3])),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.viewpoint_count(), 5);
        assert_eq!(set.object_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
