//! File-path resolution for shaders and textures.
//!
//! Logical paths such as `shaders/2dshaders/shaderToy.fs` are always written
//! with forward slashes and are joined onto a resource root directory.

use std::path::PathBuf;

/// Maps logical resource paths onto the filesystem
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    root: PathBuf,
}

impl ResourceResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins `logical` onto the root, one component per `/` segment
    pub fn get_path(&self, logical: &str) -> PathBuf {
        logical
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}
