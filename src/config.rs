//! TOML run configuration and the render settings passed through to the
//! render scripts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::objects::{ObjectCatalog, DEFAULT_OBJECT_FILE};
use crate::sampler::ViewpointPolicy;

/// Settings for one sampling and rendering run.
///
/// Every field has a default, so a config file only needs the values that
/// differ. Paths are used as given (relative paths resolve against the
/// working directory).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub sampling: SamplingConfig,
    pub renderer: RendererConfig,
    pub output: OutputConfig,
    pub render: RenderSettings,
}

impl Config {
    /// Reads a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_toml(path, &text)
    }

    pub(crate) fn from_toml(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn catalog(&self) -> ObjectCatalog {
        ObjectCatalog::new(&self.dataset.root, &self.dataset.object_file)
    }

    /// Location of the serialized sample set shared with the render scripts.
    pub fn job_file(&self) -> PathBuf {
        self.output.temp_dir.join(&self.output.job_file)
    }

    /// Location of the serialized render settings shared with the render
    /// scripts.
    pub fn settings_file(&self) -> PathBuf {
        self.output.temp_dir.join(&self.output.settings_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub root: PathBuf,
    pub object_file: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: Path::new("objs").join("02958343"),
            object_file: DEFAULT_OBJECT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    pub objects: usize,
    pub viewpoints_per_object: usize,
    pub seed: Option<u64>,
    /// Draw viewpoints from these files instead of the random policy.
    pub viewpoint_files: Vec<PathBuf>,
    pub policy: ViewpointPolicy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            objects: 5,
            viewpoints_per_object: 5,
            seed: None,
            viewpoint_files: Vec::new(),
            policy: ViewpointPolicy::default(),
        }
    }
}

/// External renderer executable and the scripts it runs per stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub executable: PathBuf,
    pub color_script: PathBuf,
    pub depth_script: PathBuf,
    pub pose_script: PathBuf,
    /// Extra arguments inserted before `--python <script>`.
    pub extra_args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("blender"),
            color_script: PathBuf::from("render_rgb.py"),
            depth_script: PathBuf::from("render_depth.py"),
            pose_script: PathBuf::from("render_pose.py"),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub rgb_dir: PathBuf,
    pub depth_dir: PathBuf,
    pub pose_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub job_file: String,
    pub settings_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let out = PathBuf::from("out");
        Self {
            rgb_dir: out.join("syn_rgb"),
            depth_dir: out.join("syn_depth"),
            pose_dir: out.join("syn_pose"),
            temp_dir: out.join("tmp_data"),
            job_file: "result.json".to_string(),
            settings_file: "render_settings.json".to_string(),
        }
    }
}

/// Renderer parameters. These are handed to the render scripts untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub background_image_dir: Option<PathBuf>,
    pub scale_space: String,
    pub use_film_transparent: bool,
    pub rotation_mode: String,
    pub depth_clip_start: f64,
    pub depth_clip_end: f64,
    pub rgb: ImageFormat,
    pub depth: ImageFormat,
    pub depth_use_overwrite: bool,
    pub depth_use_file_extension: bool,
    pub engine: String,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_percentage: u32,
    pub gpu_render_enable: bool,
    pub hilbert_spiral: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background_image_dir: None,
            scale_space: "RENDER_SIZE".to_string(),
            use_film_transparent: true,
            rotation_mode: "XYZ".to_string(),
            depth_clip_start: 0.0,
            depth_clip_end: 3.0,
            rgb: ImageFormat::new("RGB", "8", "PNG"),
            depth: ImageFormat::new("BW", "8", "PNG"),
            depth_use_overwrite: true,
            depth_use_file_extension: true,
            engine: "BLENDER_RENDER".to_string(),
            resolution_x: 128,
            resolution_y: 128,
            resolution_percentage: 100,
            gpu_render_enable: false,
            hilbert_spiral: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageFormat {
    pub color_mode: String,
    pub color_depth: String,
    pub file_format: String,
}

impl ImageFormat {
    fn new(color_mode: &str, color_depth: &str, file_format: &str) -> Self {
        Self {
            color_mode: color_mode.to_string(),
            color_depth: color_depth.to_string(),
            file_format: file_format.to_string(),
        }
    }
}
