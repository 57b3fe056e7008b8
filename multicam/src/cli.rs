use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Folder created under the user's video directory when `--video-dir` is not given.
pub const DEFAULT_VIDEO_FOLDER: &str = "DeepWaterVideos";

#[derive(Parser, Debug)]
#[command(name = "multicam", version, about = "Continuous multi-camera recorder")]
pub struct Args {
    /// Recording configuration (JSON)
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Root directory for session folders [default: <videos>/DeepWaterVideos]
    #[arg(long)]
    pub video_dir: Option<PathBuf>,

    /// Polling interval of the monitor loop in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Seconds between free-space checks
    #[arg(long, default_value_t = 1)]
    pub disk_check_secs: u64,

    /// Only track devices whose bus info starts with this prefix (empty = all)
    #[arg(long, default_value = "usb-")]
    pub bus_prefix: String,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print attached cameras and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn disk_check_interval(&self) -> Duration {
        Duration::from_secs(self.disk_check_secs)
    }

    /// `--video-dir`, else `<user video dir>/DeepWaterVideos`, else `./DeepWaterVideos`.
    pub fn video_root(&self) -> PathBuf {
        if let Some(dir) = &self.video_dir {
            return dir.clone();
        }
        dirs_next::video_dir()
            .or_else(|| dirs_next::home_dir().map(|home| home.join("Videos")))
            .unwrap_or_default()
            .join(DEFAULT_VIDEO_FOLDER)
    }
}
