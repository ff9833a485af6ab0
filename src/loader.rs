//! Reading viewpoints from whitespace-separated text files.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::viewpoint::Viewpoint;

/// Lazy reader over a viewpoint file, one viewpoint per line.
///
/// Each line holds `azimuth elevation tilt distance` separated by whitespace.
/// Blank lines and `#` comments are skipped. The reader is one-shot: once
/// drained, open the file again with [`load_viewpoint`].
#[derive(Debug)]
pub struct ViewpointReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl ViewpointReader {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_line(&self, line: &str) -> Result<Viewpoint> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        Viewpoint::from_tokens(&tokens).map_err(|err| Error::ViewpointLine {
            path: self.path.clone(),
            line: self.line_no,
            reason: err.to_string(),
        })
    }
}

impl Iterator for ViewpointReader {
    type Item = Result<Viewpoint>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(Error::io(&self.path, err))),
            };
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(self.parse_line(trimmed));
        }
    }
}

/// Opens a single viewpoint file.
pub fn load_viewpoint(path: impl AsRef<Path>) -> Result<ViewpointReader> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).map_err(|err| Error::io(&path, err))?;
    Ok(ViewpointReader {
        path,
        lines: BufReader::new(file).lines(),
        line_no: 0,
    })
}

/// Opens several viewpoint files lazily, in the order given.
///
/// A file is only opened when the outer iterator reaches it.
pub fn load_viewpoints<I>(paths: I) -> impl Iterator<Item = Result<ViewpointReader>>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    paths.into_iter().map(load_viewpoint)
}

/// Reads every viewpoint of a file into memory.
pub fn read_viewpoints(path: impl AsRef<Path>) -> Result<Vec<Viewpoint>> {
    load_viewpoint(path)?.collect()
}
