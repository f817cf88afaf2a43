use std::io::*;
use std::path::{Path, PathBuf};

use relative_path::RelativePath;

use crate::*;

/// A loader which is backed by a given root directory.
///
/// Keys look like `b/c.png` or `/b/c.png`; a leading `/` means the root, not the filesystem root.  `..` segments are
/// resolved logically, and a key which would escape the root is refused, primarily as a measure to detect bugs.
#[derive(Debug)]
pub struct FilesystemLoader {
    root_path: PathBuf,
}

impl FilesystemLoader {
    pub fn new(root_path: &Path) -> FilesystemLoader {
        FilesystemLoader {
            root_path: root_path.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Resolve a key to a path under the root.
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        // Go via `RelativePath` rather than `canonicalize` so that this works for files which don't exist yet, and
        // so that Windows and Unix agree on what `..` in the middle of a key means.
        let absolute = RelativePath::new(key.trim_start_matches('/')).to_logical_path(&self.root_path);
        if !absolute.starts_with(&self.root_path) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{}: path is outside the loader root directory", key),
            ));
        }
        Ok(absolute)
    }
}

impl BlobLoader for FilesystemLoader {
    fn load(&self, key: &str) -> Result<Vec<u8>> {
        std::fs::read(self.resolve(key)?)
    }
}
