use anyhow::{bail, Context, Result};
use blink_core::{LandmarkScheme, SingleEyePolicy, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration: defaults, then a TOML file, then `BLINK_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Blink ratio above which the eyes count as closed.
    pub threshold: f32,
    /// Scoring when only one eye is visible.
    pub single_eye: SingleEyePolicy,
    /// Landmark source used by the menu's live option (FIFO, file, or `-`).
    pub live_source: String,
    /// V4L2 device for `gray`.
    pub camera_device: String,
    /// Frames captured by `gray` when `--frames` is not given.
    pub gray_frames: usize,
    /// Landmark numbering of incoming shapes (`ibug68`, `eyes12`).
    pub scheme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults_from(&|key: &str| std::env::var(key).ok())
    }
}

impl Config {
    fn defaults_from(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            single_eye: SingleEyePolicy::Substitute,
            live_source: default_live_source(lookup).to_string_lossy().into_owned(),
            camera_device: "/dev/video0".to_string(),
            gray_frames: 30,
            scheme: "ibug68".to_string(),
        }
    }

    /// Load from `path`, or from the default location if it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with environment lookups routed through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path(&lookup) {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::defaults_from(&lookup),
            },
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `BLINK_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BLINK_THRESHOLD") {
            self.threshold = v
                .trim()
                .parse()
                .with_context(|| format!("BLINK_THRESHOLD is not a number: {v}"))?;
        }
        if let Some(v) = lookup("BLINK_SINGLE_EYE") {
            self.single_eye = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("BLINK_LIVE_SOURCE") {
            self.live_source = v;
        }
        if let Some(v) = lookup("BLINK_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Some(v) = lookup("BLINK_GRAY_FRAMES") {
            self.gray_frames = v
                .trim()
                .parse()
                .with_context(|| format!("BLINK_GRAY_FRAMES is not a count: {v}"))?;
        }
        if let Some(v) = lookup("BLINK_SCHEME") {
            self.scheme = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            bail!("threshold must be a positive number, got {}", self.threshold);
        }
        if self.gray_frames == 0 {
            bail!("gray_frames must be at least 1");
        }
        self.landmark_scheme()?;
        Ok(())
    }

    pub fn landmark_scheme(&self) -> Result<Box<dyn LandmarkScheme + Send>> {
        match blink_core::scheme_by_name(&self.scheme) {
            Some(s) => Ok(s),
            None => bail!("unknown landmark scheme: {} (expected ibug68 or eyes12)", self.scheme),
        }
    }
}

/// `$XDG_CONFIG_HOME/blink/config.toml`, falling back to `~/.config`.
fn default_config_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let base = lookup("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| lookup("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("blink").join("config.toml"))
}

/// `$XDG_RUNTIME_DIR/blink/landmarks.fifo`, falling back to `/tmp`.
fn default_live_source(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    lookup("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("blink")
        .join("landmarks.fifo")
}
