use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(about = "Mirror a paginated content site into a static HTML tree")]
#[command(long_about = "\
Mirror a paginated content site into a static HTML tree

The content API is discovered from the site's Link header, every post and
page is crawled, and each public URL (single items plus tag and author
archives with their pagination) is fetched from the local rendering server
and saved as <output>/<permalink>/index.html. Theme and global assets are
copied to <output>/assets and <output>/images.

Every run wipes and rebuilds the output directory.

Exit status: 0 on success, 1 on a fatal error, 2 in --strict mode when any
page could not be mirrored.")]
#[command(version)]
pub struct Cli {
    /// RON configuration file (default: ./site-mirror.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Public site URL advertising the content API
    #[arg(long, global = true)]
    pub site_url: Option<String>,

    /// Content API root; skips Link header discovery
    #[arg(long, global = true)]
    pub api_root: Option<String>,

    /// Base URL of the rendering server
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Output directory (wiped on every run)
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Theme asset directory, copied to <output>/assets
    #[arg(long, global = true)]
    pub theme_assets: Option<PathBuf>,

    /// Site-wide asset directory, copied to <output>/images
    #[arg(long, global = true)]
    pub global_assets: Option<PathBuf>,

    /// Pages fetched concurrently per batch
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Items requested per content API page
    #[arg(long, global = true)]
    pub per_page: Option<usize>,

    /// Also mirror /page/<n>/ of the home listing
    #[arg(long, global = true)]
    pub paginate_home: bool,

    /// Exit with status 2 when any page fails to mirror
    #[arg(long, global = true)]
    pub strict: bool,

    /// Also write the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Discover, crawl, fetch every page and copy assets (default)
    Run,
    /// Discover and crawl, then print the permalinks without fetching
    Plan,
    /// Print the effective configuration as RON
    Config,
}
