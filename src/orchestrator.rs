//! Drives the external renderer: writes the job files, then runs the color,
//! depth and pose stages one after another.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::job_file;
use crate::loader;
use crate::sampler::Sampler;
use crate::viewpoint::{SampleSet, Viewpoint};

/// Environment variable holding the path of the sampled models file.
pub const JOB_FILE_ENV: &str = "RENDER_SAMPLER_RESULT";
/// Environment variable holding the path of the render settings file.
pub const SETTINGS_FILE_ENV: &str = "RENDER_SAMPLER_SETTINGS";
/// Environment variable holding the directory a stage writes into.
pub const OUTPUT_DIR_ENV: &str = "RENDER_SAMPLER_OUTPUT_DIR";

/// One pass of the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStage {
    Color,
    Depth,
    Pose,
}

impl RenderStage {
    /// Stages in the order they run.
    pub const ALL: [RenderStage; 3] = [RenderStage::Color, RenderStage::Depth, RenderStage::Pose];

    pub fn name(self) -> &'static str {
        match self {
            RenderStage::Color => "color",
            RenderStage::Depth => "depth",
            RenderStage::Pose => "pose",
        }
    }

    pub fn script(self, config: &Config) -> &Path {
        match self {
            RenderStage::Color => &config.renderer.color_script,
            RenderStage::Depth => &config.renderer.depth_script,
            RenderStage::Pose => &config.renderer.pose_script,
        }
    }

    pub fn output_dir(self, config: &Config) -> &Path {
        match self {
            RenderStage::Color => &config.output.rgb_dir,
            RenderStage::Depth => &config.output.depth_dir,
            RenderStage::Pose => &config.output.pose_dir,
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paths of the files the render scripts read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFiles {
    pub samples: PathBuf,
    pub settings: PathBuf,
}

/// Fully resolved renderer command line for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: RenderStage,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(String, PathBuf)>,
}

/// How a renderer process ended. `code` is `None` when it was killed by a
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
}

impl ExitReport {
    pub const fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Starts renderer processes and waits for them to exit.
pub trait Launcher {
    fn launch(&self, invocation: &Invocation) -> Result<ExitReport>;
}

/// Runs the renderer as a child process, inheriting stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<ExitReport> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .status()
            .map_err(|source| Error::Launch {
                stage: invocation.stage,
                program: invocation.program.display().to_string(),
                source,
            })?;
        Ok(ExitReport {
            code: status.code(),
        })
    }
}

/// Samples a run, writes the job files and drives the three render stages.
///
/// Stages run one after another and block until the renderer exits. There
/// is no timeout: a renderer that hangs stalls the run.
#[derive(Debug)]
pub struct Orchestrator<L = ProcessLauncher> {
    config: Config,
    launcher: L,
}

impl Orchestrator<ProcessLauncher> {
    pub fn new(config: Config) -> Self {
        Self::with_launcher(config, ProcessLauncher)
    }
}

impl<L: Launcher> Orchestrator<L> {
    pub fn with_launcher(config: Config, launcher: L) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn job_files(&self) -> JobFiles {
        JobFiles {
            samples: self.config.job_file(),
            settings: self.config.settings_file(),
        }
    }

    /// Builds a sample set from the configured counts. When viewpoint files
    /// are configured, viewpoints are drawn from their contents instead of
    /// the random policy.
    pub fn sample<R: Rng>(&self, sampler: &mut Sampler<R>) -> Result<SampleSet> {
        let sampling = &self.config.sampling;
        if sampling.viewpoint_files.is_empty() {
            return sampler.sample(sampling.objects, sampling.viewpoints_per_object);
        }

        let pool = load_viewpoint_pool(&sampling.viewpoint_files)?;
        info!(
            "loaded {} viewpoints from {} file(s)",
            pool.len(),
            sampling.viewpoint_files.len()
        );
        let objects = sampler.sample_objects(sampling.objects)?;
        sampler.sample_viewpoints_from(&objects, &pool, sampling.viewpoints_per_object)
    }

    /// Creates the temp directory and the per-stage output directories.
    pub fn create_output_dirs(&self) -> Result<()> {
        let output = &self.config.output;
        for dir in [
            &output.temp_dir,
            &output.rgb_dir,
            &output.depth_dir,
            &output.pose_dir,
        ] {
            fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
        }
        Ok(())
    }

    /// Creates the output directories and writes the job files.
    pub fn prepare(&self, samples: &SampleSet) -> Result<JobFiles> {
        self.create_output_dirs()?;

        let files = self.job_files();
        job_file::write_sample_set(&files.samples, samples)?;
        job_file::write_render_settings(&files.settings, &self.config.render)?;
        info!(
            "wrote {} models ({} viewpoints) to {}",
            samples.len(),
            samples.viewpoint_count(),
            files.samples.display()
        );
        Ok(files)
    }

    pub fn invocation(&self, stage: RenderStage, files: &JobFiles) -> Invocation {
        let renderer = &self.config.renderer;
        let mut args: Vec<OsString> = vec!["--background".into()];
        args.extend(renderer.extra_args.iter().map(OsString::from));
        args.push("--python".into());
        args.push(stage.script(&self.config).into());

        Invocation {
            stage,
            program: renderer.executable.clone(),
            args,
            env: vec![
                (JOB_FILE_ENV.to_string(), files.samples.clone()),
                (SETTINGS_FILE_ENV.to_string(), files.settings.clone()),
                (
                    OUTPUT_DIR_ENV.to_string(),
                    stage.output_dir(&self.config).to_path_buf(),
                ),
            ],
        }
    }

    /// Runs one stage and fails if the renderer does not exit cleanly.
    pub fn run_stage(&self, stage: RenderStage, files: &JobFiles) -> Result<()> {
        let invocation = self.invocation(stage, files);
        info!(
            "running {stage} stage: {} {}",
            invocation.program.display(),
            invocation
                .args
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let report = self.launcher.launch(&invocation)?;
        if !report.is_success() {
            warn!("{stage} stage failed with {:?}", report.code);
            return Err(Error::RendererFailed {
                stage,
                code: report.code,
            });
        }
        info!("{stage} stage finished");
        Ok(())
    }

    /// Runs the color, depth and pose stages in order, stopping at the
    /// first failure. Missing output directories are created first.
    pub fn render(&self, files: &JobFiles) -> Result<()> {
        self.create_output_dirs()?;
        for stage in RenderStage::ALL {
            self.run_stage(stage, files)?;
        }
        Ok(())
    }

    /// Samples, writes the job files and renders.
    pub fn run<R: Rng>(&self, sampler: &mut Sampler<R>) -> Result<SampleSet> {
        let samples = self.sample(sampler)?;
        let files = self.prepare(&samples)?;
        self.render(&files)?;
        Ok(samples)
    }
}

fn load_viewpoint_pool(paths: &[PathBuf]) -> Result<Vec<Viewpoint>> {
    let mut pool = Vec::new();
    for reader in loader::load_viewpoints(paths) {
        for viewpoint in reader? {
            let viewpoint = viewpoint?;
            viewpoint.validate()?;
            pool.push(viewpoint);
        }
    }
    Ok(pool)
}
