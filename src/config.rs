use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write the default configuration template to config.toml.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Load config.toml, falling back to defaults when it does not exist.
    /// Missing fields fill from defaults via serde.
    pub fn load(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");
        if !config_path.exists() {
            return Ok(AppConfig::default());
        }
        let contents = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| eyre!("Invalid config at {}: {}", config_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub dashboard: DashboardConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    pub delimiter: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Default aggregation mode when --mode is not given: "driver" or "route".
    pub mode: String,
    /// First screen pre-selects the days buckets entirely below this value.
    pub initial_days_below: f64,
    /// Override for the delivered-status pattern.
    pub delivered_pattern: String,
    /// File the copy action writes visible tracking ids to.
    pub tracking_export: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub background: String,
    pub surface: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub table_header: String,
    pub table_border: String,
    pub table_selected: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub days_overdue: String,
    pub days_due_today: String,
    pub days_due_tomorrow: String,
    pub days_due_soon: String,
    pub days_fresh: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.3".to_string(),
            file_loading: FileLoadingConfig::default(),
            dashboard: DashboardConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mode: "driver".to_string(),
            initial_days_below: 2.0,
            delivered_pattern: crate::aggregate::DELIVERED_PATTERN.to_string(),
            tracking_export: "orderdash-tracking.txt".to_string(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "default".to_string(),
            surface: "default".to_string(),
            controls_bg: "darkgray".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "gray".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "darkgray".to_string(),
            table_header: "cyan".to_string(),
            table_border: "darkgray".to_string(),
            table_selected: "blue".to_string(),
            modal_border: "gray".to_string(),
            modal_border_active: "cyan".to_string(),
            days_overdue: "magenta".to_string(),
            days_due_today: "red".to_string(),
            days_due_tomorrow: "lightred".to_string(),
            days_due_soon: "yellow".to_string(),
            days_fresh: "green".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        match self.dashboard.mode.as_str() {
            "driver" | "route" => {}
            other => return Err(eyre!("Invalid dashboard.mode '{}'", other)),
        }
        if !self.dashboard.initial_days_below.is_finite() {
            return Err(eyre!("dashboard.initial_days_below must be finite"));
        }
        self.theme.colors.validate()?;
        Ok(())
    }
}

impl ColorConfig {
    fn validate(&self) -> Result<()> {
        macro_rules! validate_color {
            ($field:expr, $name:expr) => {
                parse_color($field).map_err(|e| eyre!("Invalid color for '{}': {}", $name, e))?;
            };
        }

        validate_color!(&self.background, "background");
        validate_color!(&self.surface, "surface");
        validate_color!(&self.controls_bg, "controls_bg");
        validate_color!(&self.text_primary, "text_primary");
        validate_color!(&self.text_secondary, "text_secondary");
        validate_color!(&self.success, "success");
        validate_color!(&self.error, "error");
        validate_color!(&self.warning, "warning");
        validate_color!(&self.dimmed, "dimmed");
        validate_color!(&self.table_header, "table_header");
        validate_color!(&self.table_border, "table_border");
        validate_color!(&self.table_selected, "table_selected");
        validate_color!(&self.modal_border, "modal_border");
        validate_color!(&self.modal_border_active, "modal_border_active");
        validate_color!(&self.days_overdue, "days_overdue");
        validate_color!(&self.days_due_today, "days_due_today");
        validate_color!(&self.days_due_tomorrow, "days_due_tomorrow");
        validate_color!(&self.days_due_soon, "days_due_soon");
        validate_color!(&self.days_fresh, "days_fresh");
        Ok(())
    }
}

/// Parse a color string: "default", a named ANSI color, or "#rrggbb".
pub fn parse_color(s: &str) -> Result<Color> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 {
            return Err(eyre!("hex color must be #rrggbb: '{}'", s));
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        return Ok(Color::Rgb(r, g, b));
    }
    match trimmed.to_lowercase().as_str() {
        "default" | "reset" => Ok(Color::Reset),
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "gray" | "grey" => Ok(Color::Gray),
        "darkgray" | "darkgrey" => Ok(Color::DarkGray),
        "lightred" => Ok(Color::LightRed),
        "lightgreen" => Ok(Color::LightGreen),
        "lightyellow" => Ok(Color::LightYellow),
        "lightblue" => Ok(Color::LightBlue),
        "lightmagenta" => Ok(Color::LightMagenta),
        "lightcyan" => Ok(Color::LightCyan),
        "white" => Ok(Color::White),
        other => Err(eyre!("unknown color name '{}'", other)),
    }
}

/// Resolved theme: color-key lookups for widgets.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    colors: HashMap<&'static str, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let c = &config.colors;
        let mut colors = HashMap::new();
        for (key, value) in [
            ("background", &c.background),
            ("surface", &c.surface),
            ("controls_bg", &c.controls_bg),
            ("text_primary", &c.text_primary),
            ("text_secondary", &c.text_secondary),
            ("success", &c.success),
            ("error", &c.error),
            ("warning", &c.warning),
            ("dimmed", &c.dimmed),
            ("table_header", &c.table_header),
            ("table_border", &c.table_border),
            ("table_selected", &c.table_selected),
            ("modal_border", &c.modal_border),
            ("modal_border_active", &c.modal_border_active),
            ("days_overdue", &c.days_overdue),
            ("days_due_today", &c.days_due_today),
            ("days_due_tomorrow", &c.days_due_tomorrow),
            ("days_due_soon", &c.days_due_soon),
            ("days_fresh", &c.days_fresh),
        ] {
            colors.insert(key, parse_color(value)?);
        }
        Ok(Self { colors })
    }

    pub fn get(&self, key: &str) -> Color {
        self.colors.get(key).copied().unwrap_or(Color::Reset)
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# orderdash configuration
version = "0.3"

[file_loading]
# delimiter = 59  # byte value, e.g. 59 for ';'

[dashboard]
# Aggregation mode when --mode is not given: "driver" or "route"
mode = "driver"
# First screen pre-selects the days buckets entirely below this value
initial_days_below = 2.0
# Pattern identifying a delivered status
delivered_pattern = "(?i)delivered|投递|配送完成"
# File the copy action writes visible tracking ids to
tracking_export = "orderdash-tracking.txt"

[performance]
event_poll_interval_ms = 25

[theme.colors]
background = "default"
surface = "default"
controls_bg = "darkgray"
text_primary = "white"
text_secondary = "gray"
success = "green"
error = "red"
warning = "yellow"
dimmed = "darkgray"
table_header = "cyan"
table_border = "darkgray"
table_selected = "blue"
modal_border = "gray"
modal_border_active = "cyan"
days_overdue = "magenta"
days_due_today = "red"
days_due_tomorrow = "lightred"
days_due_soon = "yellow"
days_fresh = "green"
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn default_template_parses_and_validates() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.dashboard.mode, "driver");
        assert_eq!(parsed.dashboard.initial_days_below, 2.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[dashboard]\nmode = \"route\"\n").unwrap();
        assert_eq!(parsed.dashboard.mode, "route");
        assert_eq!(parsed.dashboard.initial_days_below, 2.0);
        assert_eq!(parsed.performance.event_poll_interval_ms, 25);
    }

    #[test]
    fn invalid_mode_fails_validation() {
        let parsed: AppConfig = toml::from_str("[dashboard]\nmode = \"fleet\"\n").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(parse_color("#ff8800").unwrap(), Color::Rgb(255, 136, 0));
        assert_eq!(parse_color("magenta").unwrap(), Color::Magenta);
        assert_eq!(parse_color("default").unwrap(), Color::Reset);
        assert!(parse_color("#ff88").is_err());
        assert!(parse_color("notacolor").is_err());
    }

    #[test]
    fn theme_lookup_falls_back_to_reset() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        assert_eq!(theme.get("days_overdue"), Color::Magenta);
        assert_eq!(theme.get("missing_key"), Color::Reset);
    }
}
