use std::io;
use std::path::{Path, PathBuf};

use mirror_logging::{mirror_debug, mirror_info};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset source {0} is not a directory")]
    MissingSource(PathBuf),
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A source directory and the output-relative directory it is copied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMapping {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCopier {
    mappings: Vec<AssetMapping>,
}

impl AssetCopier {
    /// Theme assets go to `assets/`, site-wide assets to `images/`.
    pub fn new(theme_assets: impl Into<PathBuf>, global_assets: impl Into<PathBuf>) -> Self {
        Self::with_mappings(vec![
            AssetMapping {
                source: theme_assets.into(),
                destination: PathBuf::from("assets"),
            },
            AssetMapping {
                source: global_assets.into(),
                destination: PathBuf::from("images"),
            },
        ])
    }

    pub fn with_mappings(mappings: Vec<AssetMapping>) -> Self {
        Self { mappings }
    }

    /// Copies every mapping into `output_dir`, returning the number of files.
    pub async fn copy_into(&self, output_dir: &Path) -> Result<usize, AssetError> {
        let mut copied = 0;
        for mapping in &self.mappings {
            let dest = output_dir.join(&mapping.destination);
            let files = copy_tree(&mapping.source, &dest).await?;
            mirror_info!(
                "Copied {} asset files from {} to {}",
                files,
                mapping.source.display(),
                dest.display()
            );
            copied += files;
        }
        Ok(copied)
    }
}

async fn copy_tree(source: &Path, dest: &Path) -> Result<usize, AssetError> {
    if !source.is_dir() {
        return Err(AssetError::MissingSource(source.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|source_err| AssetError::Walk {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| AssetError::MissingSource(entry.path().to_path_buf()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|err| copy_error(entry.path(), &target, err))?;
        } else {
            mirror_debug!("Copy {} -> {}", entry.path().display(), target.display());
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(|err| copy_error(entry.path(), &target, err))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_error(from: &Path, to: &Path, source: io::Error) -> AssetError {
    AssetError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}
