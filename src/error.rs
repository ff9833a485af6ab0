//! Error type shared by the library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::RenderStage;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while sampling objects and driving the renderer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {reason}", .path.display())]
    ViewpointLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("expected a number, found {value:?}")]
    NotNumeric { value: String },

    #[error("invalid viewpoint: {0}")]
    InvalidViewpoint(String),

    #[error("invalid viewpoint policy: {0}")]
    InvalidPolicy(String),

    #[error("dataset root {} is not a directory", .0.display())]
    DatasetRoot(PathBuf),

    #[error("failed to walk dataset: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("cannot derive an object id from {}", .0.display())]
    ObjectId(PathBuf),

    #[error("object id {id:?} is shared by {} and {}", .first.display(), .second.display())]
    DuplicateObjectId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("requested {requested} objects but only {available} are available")]
    InsufficientPopulation { requested: usize, available: usize },

    #[error("viewpoint pool is empty")]
    EmptyViewpointPool,

    #[error("failed to launch {stage} stage ({program}): {source}")]
    Launch {
        stage: RenderStage,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{stage} stage exited with {}", exit_description(.code))]
    RendererFailed { stage: RenderStage, code: Option<i32> },

    #[error("invalid job file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
