//! Enumeration of the object files under a dataset root and the object ids
//! derived from their location.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Conventional file name of a mesh inside a dataset object directory.
pub const DEFAULT_OBJECT_FILE: &str = "model.obj";

/// Object files found under a dataset root.
///
/// Every object lives in its own (arbitrarily nested) directory and is
/// represented by a file with a fixed name, e.g.
/// `<root>/<synset>/<object>/models/model.obj`.
#[derive(Debug, Clone)]
pub struct ObjectCatalog {
    root: PathBuf,
    file_name: String,
}

impl ObjectCatalog {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lazily walks the dataset root and yields every matching object file.
    ///
    /// The order is whatever the file system reports. The walk is one-shot;
    /// call `iter` again to restart it.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<PathBuf>> + '_> {
        if !self.root.is_dir() {
            return Err(Error::DatasetRoot(self.root.clone()));
        }
        let walker = WalkDir::new(&self.root).follow_links(true).into_iter();
        Ok(walker.filter_map(move |entry| match entry {
            Ok(entry) => (entry.file_type().is_file()
                && entry.file_name().to_str() == Some(self.file_name.as_str()))
            .then(|| Ok(entry.into_path())),
            Err(err) => Some(Err(Error::from(err))),
        }))
    }

    /// Collects every object file, sorted so that seeded sampling is
    /// reproducible across file systems.
    ///
    /// Fails on the first entry the walk cannot read (permission errors,
    /// symlink loops) rather than sampling from a partial population.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = self.iter()?.collect::<Result<Vec<_>>>()?;
        paths.sort();
        Ok(paths)
    }

    /// Derives the object id by stripping the dataset root and the object
    /// file name: `<root>/a/b/model.obj` becomes `a/b`.
    pub fn object_id(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| Error::ObjectId(path.to_path_buf()))?;
        let parent = relative
            .parent()
            .ok_or_else(|| Error::ObjectId(path.to_path_buf()))?;
        let mut parts = Vec::new();
        for component in parent.components() {
            match component {
                Component::Normal(part) => match part.to_str() {
                    Some(part) => parts.push(part),
                    None => return Err(Error::ObjectId(path.to_path_buf())),
                },
                Component::CurDir => {}
                _ => return Err(Error::ObjectId(path.to_path_buf())),
            }
        }
        if parts.is_empty() {
            return Err(Error::ObjectId(path.to_path_buf()));
        }
        Ok(parts.join("/"))
    }
}
