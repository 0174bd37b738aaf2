use std::io;
use std::path::{Path, PathBuf};

use mirror_core::PermalinkSet;
use mirror_logging::{mirror_debug, mirror_info};
use percent_encoding::percent_decode_str;
use thiserror::Error;

/// File name each permalink's HTML is saved under, so extensionless URLs
/// resolve on a plain static file server.
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("permalink {0:?} cannot be mapped to a directory")]
    InvalidPermalink(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory under `root` that holds the page for `permalink`.
///
/// Segments are percent-decoded, matching how a static server maps the request
/// path `/%e6%97%a5/` onto the directory `日/`. Empty segments collapse.
/// Segments that decode to `.` or `..`, to invalid UTF-8, or to text holding a
/// slash, backslash or NUL are rejected so nothing lands outside `root`.
pub fn permalink_dir(root: &Path, permalink: &str) -> Result<PathBuf, MaterializeError> {
    let invalid = || MaterializeError::InvalidPermalink(permalink.to_string());
    let mut dir = root.to_path_buf();
    for segment in permalink.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| invalid())?;
        if decoded == "." || decoded == ".." || decoded.contains(['/', '\\', '\0']) {
            return Err(invalid());
        }
        dir.push(&*decoded);
    }
    Ok(dir)
}

/// Wipes `root` and recreates one directory per permalink.
///
/// Directories are created one at a time. Every permalink is validated before
/// anything is deleted.
pub async fn materialize(root: &Path, permalinks: &PermalinkSet) -> Result<(), MaterializeError> {
    let dirs = permalinks
        .iter()
        .map(|permalink| permalink_dir(root, permalink))
        .collect::<Result<Vec<_>, _>>()?;

    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => mirror_debug!("Removed previous output at {}", root.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(MaterializeError::Io {
                path: root.to_path_buf(),
                source,
            })
        }
    }
    create_dir_all(root).await?;

    for dir in &dirs {
        create_dir_all(dir).await?;
    }
    mirror_info!(
        "Created {} page directories under {}",
        dirs.len(),
        root.display()
    );
    Ok(())
}

async fn create_dir_all(path: &Path) -> Result<(), MaterializeError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| MaterializeError::Io {
            path: path.to_path_buf(),
            source,
        })
}
