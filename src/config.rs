use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_ENV: &str = "TSM_CONFIG";
const APP_DIR: &str = "term-state-monitor";
const FILE_NAME: &str = "config.json";

const MIN_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 60;
const MAX_TIMEOUT_FACTOR: u32 = 10;

/// Graph geometry and sampling period for one pane. Width and height are in
/// character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneConfig {
    pub interval_secs: u64,
    pub width: usize,
    pub height: usize,
}

impl PaneConfig {
    pub const fn new(interval_secs: u64, width: usize, height: usize) -> Self {
        Self {
            interval_secs,
            width,
            height,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn normalized(self) -> Self {
        Self {
            interval_secs: self.interval_secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS),
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self::new(1, 20, 4)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub width: usize,
    pub height: usize,
    /// Tool timeout as a multiple of the interval.
    pub timeout_factor: u32,
    /// Start jitter step; each process delays by `pid % 5` steps.
    pub jitter_ms: u64,
}

impl GpuConfig {
    pub fn pane(&self) -> PaneConfig {
        PaneConfig::new(self.interval_secs, self.width, self.height)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        self.interval() * self.timeout_factor
    }

    pub fn jitter_for(&self, pid: u32) -> Duration {
        Duration::from_millis(u64::from(pid) % 5 * self.jitter_ms)
    }

    fn normalized(self) -> Self {
        let pane = self.pane().normalized();
        Self {
            enabled: self.enabled,
            interval_secs: pane.interval_secs,
            width: pane.width,
            height: pane.height,
            timeout_factor: self.timeout_factor.clamp(1, MAX_TIMEOUT_FACTOR),
            jitter_ms: self.jitter_ms,
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 1,
            width: 40,
            height: 6,
            timeout_factor: 2,
            jitter_ms: 120,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cpu: PaneConfig,
    pub memory: PaneConfig,
    pub disk: PaneConfig,
    pub gpu: GpuConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu: PaneConfig::new(1, 40, 12),
            memory: PaneConfig::default(),
            disk: PaneConfig::default(),
            gpu: GpuConfig::default(),
        }
    }
}

impl Config {
    /// Loads from the default location; missing or broken files give defaults.
    pub fn load() -> Self {
        match Self::path() {
            Ok(path) => Self::load_from(&path),
            Err(err) => {
                warn!(error = %err, "using default config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => {
                debug!(path = %path.display(), "config loaded");
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&content)?;
        Ok(Some(config.normalized()))
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        resolve_path(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
        .ok_or(ConfigError::NoLocation)
    }

    pub fn normalized(self) -> Self {
        Self {
            cpu: self.cpu.normalized(),
            memory: self.memory.normalized(),
            disk: self.disk.normalized(),
            gpu: self.gpu.normalized(),
        }
    }
}

fn resolve_path(
    explicit: Option<PathBuf>,
    xdg_config: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    if let Some(path) = explicit.filter(non_empty) {
        return Some(path);
    }
    let config_dir = xdg_config
        .filter(non_empty)
        .or_else(|| home.filter(non_empty).map(|h| h.join(".config")))?;
    Some(config_dir.join(APP_DIR).join(FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard_layout() {
        let config = Config::default();
        assert_eq!(config.cpu, PaneConfig::new(1, 40, 12));
        assert_eq!(config.memory, PaneConfig::new(1, 20, 4));
        assert_eq!(config.disk, PaneConfig::new(1, 20, 4));
        assert!(config.gpu.enabled);
        assert_eq!(config.gpu.pane(), PaneConfig::new(1, 40, 6));
        assert_eq!(config.gpu.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"disk": {"interval_secs": 3}, "gpu": {"enabled": false}}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.disk, PaneConfig::new(3, 20, 4));
        assert!(!config.gpu.enabled);
        assert_eq!(config.gpu.width, 40);
        assert_eq!(config.cpu, Config::default().cpu);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"cpu": {"interval_secs": 0, "width": 0, "height": 0},
                "gpu": {"interval_secs": 600, "timeout_factor": 0}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.cpu, PaneConfig::new(1, 1, 1));
        assert_eq!(config.gpu.interval_secs, 60);
        assert_eq!(config.gpu.timeout_factor, 1);
    }

    #[test]
    fn missing_and_malformed_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(Config::read(&missing).unwrap().is_none());
        assert_eq!(Config::load_from(&missing), Config::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Config::read(&broken), Err(ConfigError::Json(_))));
        assert_eq!(Config::load_from(&broken), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.memory = PaneConfig::new(5, 30, 3);
        config.gpu.jitter_ms = 0;

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn path_resolution_order() {
        let explicit = Some(PathBuf::from("/etc/tsm.json"));
        let xdg = Some(PathBuf::from("/xdg"));
        let home = Some(PathBuf::from("/home/me"));

        assert_eq!(
            resolve_path(explicit, xdg.clone(), home.clone()),
            Some(PathBuf::from("/etc/tsm.json"))
        );
        assert_eq!(
            resolve_path(Some(PathBuf::new()), xdg, home.clone()),
            Some(PathBuf::from("/xdg/term-state-monitor/config.json"))
        );
        assert_eq!(
            resolve_path(None, None, home),
            Some(PathBuf::from("/home/me/.config/term-state-monitor/config.json"))
        );
        assert_eq!(resolve_path(None, None, None), None);
    }

    #[test]
    fn jitter_is_a_multiple_of_the_step() {
        let gpu = GpuConfig::default();
        assert_eq!(gpu.jitter_for(10), Duration::ZERO);
        assert_eq!(gpu.jitter_for(13), Duration::from_millis(360));
    }
}
