use crate::canvas::model::{clamp_brush_width, Color, DEFAULT_BRUSH_WIDTH, DEFAULT_PALETTE};
use crate::overlay::OverlayPosition;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "ink_calc_settings.json";
/// Overrides `solver_url` when set.
pub const API_URL_ENV: &str = "INK_CALC_API_URL";

const MAX_REVEAL_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    /// Base URL of the solver service; requests go to `{solver_url}/calculate`.
    #[serde(default = "default_solver_url")]
    pub solver_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause between successive result reveals of one response.
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    /// Where results land when the canvas has no ink to anchor to.
    #[serde(default = "default_anchor")]
    pub default_anchor: (f32, f32),
    #[serde(default = "default_brush_width")]
    pub brush_width: u32,
    #[serde(default)]
    pub default_color: Color,
    #[serde(default = "default_palette")]
    pub palette: Vec<Color>,
    #[serde(default)]
    pub debug_logging: bool,
    /// Directory for a rolling log file. Console only when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
}

fn default_solver_url() -> String {
    "http://localhost:8900".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_reveal_delay_ms() -> u64 {
    1000
}

fn default_anchor() -> (f32, f32) {
    (10.0, 200.0)
}

fn default_brush_width() -> u32 {
    DEFAULT_BRUSH_WIDTH
}

fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.to_vec()
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            solver_url: default_solver_url(),
            request_timeout_secs: default_request_timeout_secs(),
            reveal_delay_ms: default_reveal_delay_ms(),
            default_anchor: default_anchor(),
            brush_width: default_brush_width(),
            default_color: Color::default(),
            palette: default_palette(),
            debug_logging: false,
            log_dir: None,
            toast_duration: default_toast_duration(),
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`. A missing or blank file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut loaded: Self = serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))?;
        loaded.sanitize();
        Ok(loaded)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_api_url_override(std::env::var(API_URL_ENV).ok());
    }

    fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            tracing::debug!(%url, "solver url overridden from environment");
            self.solver_url = url;
        }
    }

    pub fn sanitize(&mut self) {
        self.brush_width = clamp_brush_width(self.brush_width);
        self.reveal_delay_ms = self.reveal_delay_ms.min(MAX_REVEAL_DELAY_MS);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if self.palette.is_empty() {
            self.palette = default_palette();
        }
        if !self.toast_duration.is_finite() || self.toast_duration <= 0.0 {
            self.toast_duration = default_toast_duration();
        }
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn default_anchor(&self) -> OverlayPosition {
        OverlayPosition::from(self.default_anchor)
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"solver_url": "http://solver:9000"}"#).expect("parse");
        assert_eq!(settings.solver_url, "http://solver:9000");
        assert_eq!(settings.reveal_delay_ms, 1000);
        assert_eq!(settings.brush_width, DEFAULT_BRUSH_WIDTH);
        assert_eq!(settings.default_anchor, (10.0, 200.0));
        assert_eq!(settings.palette.len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = AppSettings {
            brush_width: 99,
            reveal_delay_ms: 60_000,
            request_timeout_secs: 0,
            palette: Vec::new(),
            toast_duration: -1.0,
            ..AppSettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.brush_width, 20);
        assert_eq!(settings.reveal_delay_ms, MAX_REVEAL_DELAY_MS);
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(!settings.palette.is_empty());
        assert_eq!(settings.toast_duration, 3.0);
    }

    #[test]
    fn api_url_override_ignores_blank_values() {
        let mut settings = AppSettings::default();
        settings.apply_api_url_override(Some("   ".into()));
        assert_eq!(settings.solver_url, default_solver_url());
        settings.apply_api_url_override(Some("https://api.example".into()));
        assert_eq!(settings.solver_url, "https://api.example");
    }

    #[test]
    fn settings_file_sits_next_to_executable() {
        let exe = Path::new("/opt/ink_calc/bin/ink_calc");
        assert_eq!(
            settings_path_from_exe_path(exe).expect("path"),
            Path::new("/opt/ink_calc/bin").join(SETTINGS_FILE_NAME)
        );
    }
}
