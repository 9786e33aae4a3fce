use std::path::{Component, Path, PathBuf};

/// Fixed local directory holding menu background images.
///
/// Lookups hit the filesystem every time: images may be added or removed while
/// the bot is running.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageLookup {
    Found(PathBuf),
    Missing(PathBuf),
    /// Name tried to escape the root (absolute path, `..`).
    Invalid(String),
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, name: &str) -> ImageLookup {
        let rel = Path::new(name);
        let plain = !name.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return ImageLookup::Invalid(name.to_string());
        }

        let path = self.root.join(rel);
        if path.is_file() {
            ImageLookup::Found(path)
        } else {
            ImageLookup::Missing(path)
        }
    }
}
