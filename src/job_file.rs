//! Files shared with the render scripts: the sampled models and the render
//! settings, both as JSON.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RenderSettings;
use crate::error::{Error, Result};
use crate::viewpoint::SampleSet;

/// Writes the sample set, creating the parent directory when needed.
pub fn write_sample_set(path: impl AsRef<Path>, samples: &SampleSet) -> Result<()> {
    write_json(path.as_ref(), samples)
}

pub fn read_sample_set(path: impl AsRef<Path>) -> Result<SampleSet> {
    read_json(path.as_ref())
}

pub fn write_render_settings(path: impl AsRef<Path>, settings: &RenderSettings) -> Result<()> {
    write_json(path.as_ref(), settings)
}

pub fn read_render_settings(path: impl AsRef<Path>) -> Result<RenderSettings> {
    read_json(path.as_ref())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|err| Error::io(path, err))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::io(path, err))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewpoint::{Model, Viewpoint};

    fn sample_set() -> SampleSet {
        [
            (
                "1a0bc9ab92c915167ae33d942430658c".to_string(),
                Model::new(
                    "objs/02958343/1a0bc9ab92c915167ae33d942430658c/model.obj",
                    vec![
                        Viewpoint::new(12.25, 15.0, 0.0, 1.0),
                        Viewpoint::new(359.999, 60.0, 0.0, 1.0),
                    ],
                ),
            ),
            (
                "1a1dcd236a1e6133860800e6696b8284".to_string(),
                Model::new(
                    "objs/02958343/1a1dcd236a1e6133860800e6696b8284/model.obj",
                    vec![Viewpoint::new(0.1 + 0.2, 33.333333333333336, 0.0, 1.0)],
                ),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn sample_set_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/tmp_data/result.json");
        let samples = sample_set();
        write_sample_set(&path, &samples).unwrap();
        assert_eq!(read_sample_set(&path).unwrap(), samples);
    }

    #[test]
    fn job_file_is_a_plain_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        write_sample_set(&path, &sample_set()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let model = &value["1a0bc9ab92c915167ae33d942430658c"];
        assert_eq!(model["viewpoints"][0]["azimuth"], 12.25);
        assert!(model["path"].as_str().unwrap().ends_with("model.obj"));
    }

    #[test]
    fn render_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render_settings.json");
        let settings = RenderSettings::default();
        write_render_settings(&path, &settings).unwrap();
        assert_eq!(read_render_settings(&path).unwrap(), settings);
    }

    #[test]
    fn malformed_job_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_sample_set(&path), Err(Error::Json { .. })));
    }
}
