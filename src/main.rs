use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use render_sampler::{
    job_file, Config, JobFiles, Orchestrator, SampleSet, Sampler, ViewpointPolicy,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(name = "render-sampler")]
#[command(about = "Sample dataset objects and viewpoints and drive an external renderer")]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Renderer executable, overrides the config
    #[arg(long, global = true)]
    renderer: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sample, write the job files and run the color, depth and pose stages
    Run(SampleArgs),
    /// Sample and write the job files without rendering
    Sample(SampleArgs),
    /// Render an existing job file again
    Render {
        /// Job file to render, defaults to the configured one
        #[arg(long = "job-file")]
        job: Option<PathBuf>,
    },
    /// Print the camera location and rotation of every viewpoint in a job file
    Poses {
        #[arg(long = "job-file")]
        job: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Number of objects to sample
    #[arg(long)]
    objects: Option<usize>,

    /// Number of viewpoints per object
    #[arg(long)]
    viewpoints: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Dataset root directory
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Draw viewpoints from this file instead of at random (repeatable)
    #[arg(long = "viewpoint-file")]
    viewpoint_files: Vec<PathBuf>,

    /// Viewpoint distribution preset
    #[arg(long, value_enum)]
    policy: Option<PolicyPreset>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyPreset {
    Default,
    Variety,
}

impl SampleArgs {
    fn apply(&self, config: &mut Config) {
        let sampling = &mut config.sampling;
        if let Some(objects) = self.objects {
            sampling.objects = objects;
        }
        if let Some(viewpoints) = self.viewpoints {
            sampling.viewpoints_per_object = viewpoints;
        }
        if self.seed.is_some() {
            sampling.seed = self.seed;
        }
        if let Some(dataset) = &self.dataset {
            config.dataset.root = dataset.clone();
        }
        if !self.viewpoint_files.is_empty() {
            config.sampling.viewpoint_files = self.viewpoint_files.clone();
        }
        match self.policy {
            Some(PolicyPreset::Default) => config.sampling.policy = ViewpointPolicy::default(),
            Some(PolicyPreset::Variety) => config.sampling.policy = ViewpointPolicy::variety(),
            None => {}
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(renderer) = &cli.renderer {
        config.renderer.executable = renderer.clone();
    }

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            let orchestrator = Orchestrator::new(config);
            println!("Sampling data...");
            let samples = sample(&orchestrator)?;
            print_summary(&samples);
            let files = orchestrator
                .prepare(&samples)
                .context("failed to write job files")?;
            println!("Wrote job file {}", files.samples.display());
            orchestrator.render(&files).context("rendering failed")?;
            println!("Rendering finished");
        }
        Commands::Sample(args) => {
            args.apply(&mut config);
            let orchestrator = Orchestrator::new(config);
            let samples = sample(&orchestrator)?;
            print_summary(&samples);
            let files = orchestrator
                .prepare(&samples)
                .context("failed to write job files")?;
            println!("Wrote job file {}", files.samples.display());
        }
        Commands::Render { job } => {
            let orchestrator = Orchestrator::new(config);
            let files = existing_job_files(&orchestrator, job)?;
            orchestrator.render(&files).context("rendering failed")?;
            println!("Rendering finished");
        }
        Commands::Poses { job } => {
            let path = job.unwrap_or_else(|| config.job_file());
            let samples = job_file::read_sample_set(&path)
                .with_context(|| format!("failed to read job file {}", path.display()))?;
            print_poses(&samples);
        }
    }
    Ok(())
}

fn sample(orchestrator: &Orchestrator) -> Result<SampleSet> {
    let config = orchestrator.config();
    let catalog = config.catalog();
    let policy = config.sampling.policy;
    let mut sampler = match config.sampling.seed {
        Some(seed) => Sampler::seeded(catalog, policy, seed)?,
        None => Sampler::new(catalog, policy)?,
    };
    orchestrator
        .sample(&mut sampler)
        .with_context(|| format!("failed to sample {}", config.dataset.root.display()))
}

fn existing_job_files(orchestrator: &Orchestrator, job: Option<PathBuf>) -> Result<JobFiles> {
    let mut files = orchestrator.job_files();
    if let Some(path) = job {
        files.samples = path;
    }
    let samples = job_file::read_sample_set(&files.samples)
        .with_context(|| format!("failed to read job file {}", files.samples.display()))?;
    info!(
        "rendering {} models from {}",
        samples.len(),
        files.samples.display()
    );
    if files.settings.exists() {
        job_file::read_render_settings(&files.settings).with_context(|| {
            format!("failed to read render settings {}", files.settings.display())
        })?;
    } else {
        job_file::write_render_settings(&files.settings, &orchestrator.config().render)
            .context("failed to write render settings")?;
    }
    Ok(files)
}

fn print_summary(samples: &SampleSet) {
    println!(
        "Sampled {} objects ({} viewpoints)",
        samples.len(),
        samples.viewpoint_count()
    );
    for (object_id, model) in samples {
        println!(" - {} ({} viewpoints)", object_id, model.viewpoints.len());
    }
}

fn print_poses(samples: &SampleSet) {
    for (object_id, model) in samples {
        println!("{object_id}");
        for viewpoint in &model.viewpoints {
            let pose = viewpoint.camera_pose();
            println!(
                " az={:.2} el={:.2} loc=({:.4}, {:.4}, {:.4}) rot=({:.4}, {:.4}, {:.4})",
                viewpoint.normalized_azimuth(),
                viewpoint.elevation,
                pose.location.x,
                pose.location.y,
                pose.location.z,
                pose.rotation.x,
                pose.rotation.y,
                pose.rotation.z
            );
        }
    }
}
