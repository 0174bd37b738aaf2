//! Layered configuration: built-in defaults, then the RON file, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use mirror_engine::{
    FetchSettings, MirrorConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_PAGES, DEFAULT_ORIGIN,
    DEFAULT_PER_PAGE,
};
use mirror_core::DEFAULT_TAG_TAXONOMIES;
use mirror_logging::mirror_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "site-mirror.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("no site_url configured (use --site-url or set it in {DEFAULT_CONFIG_FILE})")]
    MissingSiteUrl,
    #[error("{field} is not a valid url ({value}): {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub site_url: Option<String>,
    pub api_root: Option<String>,
    pub origin: String,
    pub output_dir: PathBuf,
    pub theme_assets: PathBuf,
    pub global_assets: PathBuf,
    pub batch_size: usize,
    pub per_page: usize,
    pub max_pages: usize,
    pub tag_taxonomies: Vec<String>,
    pub paginate_home: bool,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub strict: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            site_url: None,
            api_root: None,
            origin: DEFAULT_ORIGIN.to_string(),
            output_dir: PathBuf::from("output"),
            theme_assets: PathBuf::from("theme/assets"),
            global_assets: PathBuf::from("assets"),
            batch_size: DEFAULT_BATCH_SIZE,
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            tag_taxonomies: DEFAULT_TAG_TAXONOMIES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            paginate_home: false,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            strict: false,
            log_file: None,
        }
    }
}

impl FileConfig {
    /// Reads `explicit` if given, else `./site-mirror.ron` if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        mirror_debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
    }

    /// Command-line flags win over file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(site_url) = &cli.site_url {
            self.site_url = Some(site_url.clone());
        }
        if let Some(api_root) = &cli.api_root {
            self.api_root = Some(api_root.clone());
        }
        if let Some(origin) = &cli.origin {
            self.origin = origin.clone();
        }
        if let Some(output) = &cli.output {
            self.output_dir = output.clone();
        }
        if let Some(theme_assets) = &cli.theme_assets {
            self.theme_assets = theme_assets.clone();
        }
        if let Some(global_assets) = &cli.global_assets {
            self.global_assets = global_assets.clone();
        }
        if let Some(batch_size) = cli.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(per_page) = cli.per_page {
            self.per_page = per_page;
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = Some(log_file.clone());
        }
        self.paginate_home |= cli.paginate_home;
        self.strict |= cli.strict;
    }
}

/// Everything the binary needs for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mirror: MirrorConfig,
    pub strict: bool,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_file(file: &FileConfig, log_level: LevelFilter) -> Result<Self, ConfigError> {
        let site_url = file.site_url.as_deref().ok_or(ConfigError::MissingSiteUrl)?;
        if file.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size"));
        }
        if file.per_page == 0 {
            return Err(ConfigError::Zero("per_page"));
        }
        if file.max_pages == 0 {
            return Err(ConfigError::Zero("max_pages"));
        }

        let site_url = parse_url("site_url", site_url)?;
        let mut mirror = MirrorConfig::new(site_url, file.output_dir.clone());
        mirror.api_root = file
            .api_root
            .as_deref()
            .map(|value| parse_url("api_root", value))
            .transpose()?;
        mirror.theme_assets = file.theme_assets.clone();
        mirror.global_assets = file.global_assets.clone();
        mirror.per_page = file.per_page;
        mirror.max_pages = file.max_pages;
        mirror.tag_taxonomies = file.tag_taxonomies.clone();
        mirror.permalinks.paginate_home = file.paginate_home;
        mirror.fetch = FetchSettings {
            origin: parse_url("origin", &file.origin)?,
            batch_size: file.batch_size,
            connect_timeout: Duration::from_secs(file.connect_timeout_secs),
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            ..FetchSettings::default()
        };

        Ok(Self {
            mirror,
            strict: file.strict,
            log_level,
            log_file: file.log_file.clone(),
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let file = FileConfig::parse(
            r#"(
                site_url: Some("https://blog.example.com"),
                batch_size: 3,
                tag_taxonomies: ["category", "post_tag"],
            )"#,
        )
        .unwrap();

        assert_eq!(file.batch_size, 3);
        assert_eq!(file.origin, DEFAULT_ORIGIN);
        assert_eq!(file.output_dir, PathBuf::from("output"));
        assert_eq!(file.tag_taxonomies, vec!["category", "post_tag"]);
        assert_eq!(FileConfig::default().tag_taxonomies, DEFAULT_TAG_TAXONOMIES);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut file = FileConfig {
            site_url: Some("https://file.example.com".to_string()),
            batch_size: 3,
            ..FileConfig::default()
        };
        let cli = Cli::parse_from([
            "site-mirror",
            "--site-url",
            "https://cli.example.com",
            "--batch-size",
            "8",
            "--strict",
            "plan",
        ]);
        file.apply_cli(&cli);

        let settings = Settings::from_file(&file, LevelFilter::Info).unwrap();
        assert_eq!(settings.mirror.site_url.as_str(), "https://cli.example.com/");
        assert_eq!(settings.mirror.fetch.batch_size, 8);
        assert!(settings.strict);
        assert_eq!(cli.command, Some(crate::cli::Command::Plan));
    }

    #[test]
    fn missing_site_url_and_bad_values_are_rejected() {
        let file = FileConfig::default();
        assert!(matches!(
            Settings::from_file(&file, LevelFilter::Info),
            Err(ConfigError::MissingSiteUrl)
        ));

        let file = FileConfig {
            site_url: Some("https://blog.example.com".to_string()),
            origin: "not a url".to_string(),
            ..FileConfig::default()
        };
        assert!(matches!(
            Settings::from_file(&file, LevelFilter::Info),
            Err(ConfigError::InvalidUrl { field: "origin", .. })
        ));

        let file = FileConfig {
            site_url: Some("https://blog.example.com".to_string()),
            batch_size: 0,
            ..FileConfig::default()
        };
        assert!(matches!(
            Settings::from_file(&file, LevelFilter::Info),
            Err(ConfigError::Zero("batch_size"))
        ));

        let file = FileConfig {
            site_url: Some("https://blog.example.com".to_string()),
            max_pages: 0,
            ..FileConfig::default()
        };
        assert!(matches!(
            Settings::from_file(&file, LevelFilter::Info),
            Err(ConfigError::Zero("max_pages"))
        ));
    }

    #[test]
    fn config_file_is_read_from_disk_and_round_trips() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("mirror.ron");
        let original = FileConfig {
            site_url: Some("https://blog.example.com".to_string()),
            strict: true,
            ..FileConfig::default()
        };
        fs::write(&path, original.to_ron().unwrap()).unwrap();

        assert_eq!(FileConfig::load(Some(&path)).unwrap(), original);
        assert!(matches!(
            FileConfig::load(Some(&temp.path().join("missing.ron"))),
            Err(ConfigError::Read { .. })
        ));
    }
}
