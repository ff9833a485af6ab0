//! Random selection of dataset objects and of the viewpoints each one is
//! rendered from.

use std::collections::btree_map::{BTreeMap, Entry};
use std::path::PathBuf;

use log::{debug, info};
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::objects::ObjectCatalog;
use crate::viewpoint::{Model, SampleSet, Viewpoint};

/// Closed interval `[min, max]` used by the sampling policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Rejects empty ranges and ranges that uniform sampling cannot draw
    /// from, such as ones whose width overflows.
    fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(Error::InvalidPolicy(format!(
                "{name} range [{}, {}] is empty or not finite",
                self.min, self.max
            )));
        }
        if self.min < self.max {
            Uniform::new(self.min, self.max)
                .and(Uniform::new_inclusive(self.min, self.max))
                .map_err(|err| {
                    Error::InvalidPolicy(format!(
                        "{name} range [{}, {}] cannot be sampled: {err}",
                        self.min, self.max
                    ))
                })?;
        }
        Ok(())
    }

    fn sample_closed<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }

    fn sample_half_open<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..self.max)
        }
    }
}

/// Distribution that random viewpoints are drawn from.
///
/// Azimuth is drawn from the half-open interval `[min, max)` so that a full
/// turn never produces both 0 and 360; the other components are closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewpointPolicy {
    pub azimuth: Interval,
    pub elevation: Interval,
    pub tilt: Interval,
    pub distance: Interval,
}

impl Default for ViewpointPolicy {
    fn default() -> Self {
        Self {
            azimuth: Interval::new(0.0, 360.0),
            elevation: Interval::new(15.0, 60.0),
            tilt: Interval::fixed(0.0),
            distance: Interval::fixed(1.0),
        }
    }
}

impl ViewpointPolicy {
    /// Wider distribution covering views from below and varying distances.
    pub fn variety() -> Self {
        Self {
            elevation: Interval::new(-30.0, 90.0),
            distance: Interval::new(0.8, 2.0),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.azimuth.validate("azimuth")?;
        self.elevation.validate("elevation")?;
        self.tilt.validate("tilt")?;
        self.distance.validate("distance")?;
        if self.distance.min <= 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "distance must be positive, range starts at {}",
                self.distance.min
            )));
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Viewpoint {
        Viewpoint::new(
            self.azimuth.sample_half_open(rng),
            self.elevation.sample_closed(rng),
            self.tilt.sample_closed(rng),
            self.distance.sample_closed(rng),
        )
    }
}

/// Draws random objects from a dataset and random viewpoints for each.
#[derive(Debug)]
pub struct Sampler<R = StdRng> {
    catalog: ObjectCatalog,
    policy: ViewpointPolicy,
    rng: R,
}

impl Sampler<StdRng> {
    /// Creates a sampler seeded from the operating system.
    pub fn new(catalog: ObjectCatalog, policy: ViewpointPolicy) -> Result<Self> {
        Self::with_rng(catalog, policy, StdRng::from_os_rng())
    }

    /// Creates a sampler whose draws are reproducible for a given seed.
    pub fn seeded(catalog: ObjectCatalog, policy: ViewpointPolicy, seed: u64) -> Result<Self> {
        Self::with_rng(catalog, policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Sampler<R> {
    pub fn with_rng(catalog: ObjectCatalog, policy: ViewpointPolicy, rng: R) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            catalog,
            policy,
            rng,
        })
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ViewpointPolicy {
        &self.policy
    }

    /// Picks `count` distinct object files, keyed by object id.
    pub fn sample_objects(&mut self, count: usize) -> Result<BTreeMap<String, PathBuf>> {
        let population = self.catalog.collect_paths()?;
        if count > population.len() {
            return Err(Error::InsufficientPopulation {
                requested: count,
                available: population.len(),
            });
        }

        let indices = rand::seq::index::sample(&mut self.rng, population.len(), count);
        let mut objects = BTreeMap::new();
        for index in indices {
            let path = &population[index];
            let object_id = self.catalog.object_id(path)?;
            debug!("sampled object {object_id} ({})", path.display());
            match objects.entry(object_id) {
                Entry::Vacant(slot) => {
                    slot.insert(path.clone());
                }
                Entry::Occupied(slot) => {
                    return Err(Error::DuplicateObjectId {
                        id: slot.key().clone(),
                        first: slot.get().clone(),
                        second: path.clone(),
                    });
                }
            }
        }
        info!(
            "sampled {} of {} objects under {}",
            objects.len(),
            population.len(),
            self.catalog.root().display()
        );
        Ok(objects)
    }

    /// Draws `per_object` viewpoints from the policy for every object.
    ///
    /// Draws are independent, so an object may receive the same viewpoint
    /// twice.
    pub fn sample_viewpoints(
        &mut self,
        objects: &BTreeMap<String, PathBuf>,
        per_object: usize,
    ) -> SampleSet {
        let Self { policy, rng, .. } = self;
        objects
            .iter()
            .map(|(object_id, path)| {
                let viewpoints = (0..per_object).map(|_| policy.sample(rng)).collect();
                (object_id.clone(), Model::new(path.clone(), viewpoints))
            })
            .collect()
    }

    /// Draws `per_object` viewpoints for every object from a fixed pool,
    /// e.g. one loaded from viewpoint files.
    pub fn sample_viewpoints_from(
        &mut self,
        objects: &BTreeMap<String, PathBuf>,
        pool: &[Viewpoint],
        per_object: usize,
    ) -> Result<SampleSet> {
        if pool.is_empty() && per_object > 0 {
            return Err(Error::EmptyViewpointPool);
        }
        let rng = &mut self.rng;
        Ok(objects
            .iter()
            .map(|(object_id, path)| {
                let viewpoints = (0..per_object)
                    .filter_map(|_| pool.choose(rng).copied())
                    .collect();
                (object_id.clone(), Model::new(path.clone(), viewpoints))
            })
            .collect())
    }

    /// Samples `object_count` objects with `per_object` viewpoints each.
    pub fn sample(&mut self, object_count: usize, per_object: usize) -> Result<SampleSet> {
        let objects = self.sample_objects(object_count)?;
        Ok(self.sample_viewpoints(&objects, per_object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::DEFAULT_OBJECT_FILE;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn make_dataset(count: usize) -> TempDir {
        let dir = tempfile::tempdir().expect("tmp dir");
        for i in 0..count {
            let object_dir = dir.path().join("02958343").join(format!("obj{i:02}"));
            fs::create_dir_all(&object_dir).expect("create object dir");
            fs::write(object_dir.join(DEFAULT_OBJECT_FILE), "").expect("write obj");
        }
        dir
    }

    fn sampler(dir: &TempDir, seed: u64) -> Sampler {
        let catalog = ObjectCatalog::new(dir.path(), DEFAULT_OBJECT_FILE);
        Sampler::seeded(catalog, ViewpointPolicy::default(), seed).unwrap()
    }

    #[test]
    fn sample_objects_without_replacement() {
        let dir = make_dataset(10);
        let mut sampler = sampler(&dir, 1);
        let population: BTreeSet<String> = (0..10).map(|i| format!("02958343/obj{i:02}")).collect();
        for k in 0..=10 {
            let objects = sampler.sample_objects(k).unwrap();
            assert_eq!(objects.len(), k);
            assert!(objects.keys().all(|id| population.contains(id)));
            for (id, path) in &objects {
                assert_eq!(path, &dir.path().join(id).join(DEFAULT_OBJECT_FILE));
            }
        }
    }

    #[test]
    fn sample_objects_rejects_oversized_request() {
        let dir = make_dataset(3);
        let err = sampler(&dir, 1).sample_objects(4).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientPopulation {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn default_policy_stays_in_bounds() {
        let dir = make_dataset(2);
        let mut sampler = sampler(&dir, 5);
        let objects = sampler.sample_objects(2).unwrap();
        let set = sampler.sample_viewpoints(&objects, 5000);
        for (_, model) in &set {
            for vp in &model.viewpoints {
                assert!((0.0..360.0).contains(&vp.azimuth), "{vp:?}");
                assert!((15.0..=60.0).contains(&vp.elevation), "{vp:?}");
                assert_eq!(vp.tilt, 0.0);
                assert_eq!(vp.distance, 1.0);
            }
        }
    }

    #[test]
    fn variety_policy_stays_in_bounds() {
        let policy = ViewpointPolicy::variety();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5000 {
            let vp = policy.sample(&mut rng);
            assert!((-30.0..=90.0).contains(&vp.elevation));
            assert!((0.8..=2.0).contains(&vp.distance));
            assert!(vp.validate().is_ok());
        }
    }

    #[test]
    fn sample_produces_requested_shape() {
        let dir = make_dataset(10);
        let set = sampler(&dir, 42).sample(3, 2).unwrap();
        assert_eq!(set.len(), 3);
        for (_, model) in &set {
            assert_eq!(model.viewpoints.len(), 2);
            assert!(model.path.ends_with(DEFAULT_OBJECT_FILE));
        }
    }

    #[test]
    fn seeded_samplers_agree() {
        let dir = make_dataset(10);
        let first = sampler(&dir, 9).sample(4, 3).unwrap();
        let second = sampler(&dir, 9).sample(4, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn pool_sampling_draws_from_pool() {
        let dir = make_dataset(4);
        let mut sampler = sampler(&dir, 2);
        let objects = sampler.sample_objects(4).unwrap();
        let pool = [
            Viewpoint::new(10.0, 20.0, 0.0, 1.0),
            Viewpoint::new(200.0, 45.0, 0.0, 1.5),
        ];
        let set = sampler.sample_viewpoints_from(&objects, &pool, 6).unwrap();
        assert_eq!(set.viewpoint_count(), 24);
        for (_, model) in &set {
            assert!(model.viewpoints.iter().all(|vp| pool.contains(vp)));
        }
        assert!(matches!(
            sampler.sample_viewpoints_from(&objects, &[], 1),
            Err(Error::EmptyViewpointPool)
        ));
    }

    #[test]
    fn overly_wide_ranges_are_rejected() {
        let policy = ViewpointPolicy {
            azimuth: Interval::new(-1.7e308, 1.7e308),
            ..ViewpointPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(Error::InvalidPolicy(_))));

        let policy = ViewpointPolicy {
            azimuth: Interval::new(-1.0e6, 1.0e6),
            ..ViewpointPolicy::default()
        };
        assert!(policy.validate().is_ok());
        let mut rng = StdRng::seed_from_u64(11);
        assert!(policy.sample(&mut rng).azimuth.abs() <= 1.0e6);
    }

    #[cfg(unix)]
    #[test]
    fn unrepresentable_object_ids_fail_sampling() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().expect("tmp dir");
        let plain = dir.path().join("a");
        let odd = plain.join(OsStr::from_bytes(b"\xFF\xFE"));
        fs::create_dir_all(&odd).expect("create object dirs");
        fs::write(plain.join(DEFAULT_OBJECT_FILE), "").expect("write obj");
        fs::write(odd.join(DEFAULT_OBJECT_FILE), "").expect("write obj");

        let catalog = ObjectCatalog::new(dir.path(), DEFAULT_OBJECT_FILE);
        let mut sampler = Sampler::seeded(catalog, ViewpointPolicy::default(), 0).unwrap();
        assert!(matches!(
            sampler.sample_objects(2),
            Err(Error::ObjectId(_))
        ));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let dir = make_dataset(1);
        let catalog = ObjectCatalog::new(dir.path(), DEFAULT_OBJECT_FILE);
        let policy = ViewpointPolicy {
            distance: Interval::fixed(0.0),
            ..ViewpointPolicy::default()
        };
        assert!(matches!(
            Sampler::seeded(catalog, policy, 0),
            Err(Error::InvalidPolicy(_))
        ));
    }
}
