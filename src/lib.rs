//! Preparation of randomized rendering jobs for 3D object datasets.
//!
//! The crate samples object files and camera viewpoints, converts the
//! viewpoints into camera placements and hands the result to an external
//! renderer through a job file. The renderer itself (and the scripts it
//! runs) live outside of the crate; this side only writes inputs and waits
//! for the renderer to exit.

pub mod camera;
pub mod config;
pub mod error;
pub mod job_file;
pub mod loader;
pub mod objects;
pub mod orchestrator;
pub mod sampler;
pub mod viewpoint;

pub use camera::{camera_location, camera_pose, camera_rotation, CameraPose};
pub use config::{Config, RenderSettings};
pub use error::{Error, Result};
pub use loader::{load_viewpoint, load_viewpoints, read_viewpoints, ViewpointReader};
pub use objects::ObjectCatalog;
pub use orchestrator::{
    ExitReport, Invocation, JobFiles, Launcher, Orchestrator, ProcessLauncher, RenderStage,
};
pub use sampler::{Interval, Sampler, ViewpointPolicy};
pub use viewpoint::{Model, SampleSet, Viewpoint};
