use clap::Parser;
use std::path::PathBuf;

use crate::contact::DEFAULT_ENDPOINT;
use crate::gallery::{AspectRatio, GalleryConfig};

/// Browse a developer portfolio in the terminal
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Browse a developer portfolio: project gallery, screenshot lightbox and contact form")]
pub struct Cli {
    /// Portfolio content file (JSON)
    #[arg(default_value = "portfolio.json")]
    pub content: PathBuf,

    /// Directory screenshots are resolved against (default: the content
    /// file's directory)
    #[arg(long = "assets")]
    pub assets: Option<PathBuf>,

    /// Maximum tech chips shown per card
    #[arg(long = "max-chips", default_value_t = 6)]
    pub max_chips: usize,

    /// Maximum thumbnails shown per card
    #[arg(long = "thumbnails", default_value_t = 4)]
    pub thumbnails: usize,

    /// Screenshot frame aspect ratio
    #[arg(long = "aspect", value_enum, default_value_t = AspectRatio::Desktop)]
    pub aspect: AspectRatio,

    /// Reload the content file when it changes
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Validate content and screenshots, print a report and exit
    #[arg(long = "check")]
    pub check: bool,

    /// Access key for the contact form relay
    #[arg(long = "access-key", env = "FOLIO_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Contact form relay endpoint
    #[arg(long = "relay-endpoint", default_value = DEFAULT_ENDPOINT)]
    pub relay_endpoint: String,

    /// Log file (default: folio.log in the system temp directory)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    pub fn gallery_config(&self) -> GalleryConfig {
        GalleryConfig {
            max_chips_shown: self.max_chips,
            thumbnail_count: self.thumbnails,
            aspect_ratio: self.aspect,
        }
    }

    /// Asset root: `--assets`, or the directory holding the content file.
    pub fn asset_root(&self) -> PathBuf {
        if let Some(ref dir) = self.assets {
            return dir.clone();
        }
        match self.content.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
