use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::st7789::{Opts, PANEL_HEIGHT, PANEL_WIDTH};

// Pirate Audio wiring
pub const DEFAULT_SPI_BUS: &str = "/dev/spidev0.1";
pub const DEFAULT_SPI_SPEED_HZ: u32 = 80_000_000;
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
pub const DEFAULT_DC_PIN: u32 = 9;
pub const DEFAULT_POWER_PIN: u32 = 22;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub panel: Option<PanelConfig>,
}

/// Panel geometry, behaviour and wiring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelConfig {
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub rotate_deg: Option<u16>,
    pub invert: Option<bool>,
    pub bgr: Option<bool>,
    pub row_offset: Option<u16>,
    pub col_offset: Option<u16>,
    pub spi_bus: Option<String>,    // e.g. "/dev/spidev0.1"
    pub speed_hz: Option<u32>,
    pub gpio_chip: Option<String>,  // e.g. "/dev/gpiochip0"
    pub dc_pin: Option<u32>,        // BCM line offsets
    pub power_pin: Option<u32>,     // backlight, doubles as reset
}

impl PanelConfig {
    pub fn opts(&self) -> Opts {
        Opts {
            width: self.width.unwrap_or(PANEL_WIDTH),
            height: self.height.unwrap_or(PANEL_HEIGHT),
            row_offset: self.row_offset.unwrap_or(0),
            col_offset: self.col_offset.unwrap_or(0),
        }
    }

    pub fn spi_bus(&self) -> &str {
        self.spi_bus.as_deref().unwrap_or(DEFAULT_SPI_BUS)
    }

    pub fn speed_hz(&self) -> u32 {
        self.speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ)
    }

    pub fn gpio_chip(&self) -> &str {
        self.gpio_chip.as_deref().unwrap_or(DEFAULT_GPIO_CHIP)
    }

    pub fn dc_pin(&self) -> u32 {
        self.dc_pin.unwrap_or(DEFAULT_DC_PIN)
    }

    pub fn power_pin(&self) -> u32 {
        self.power_pin.unwrap_or(DEFAULT_POWER_PIN)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "pibox-lcd", about = "Draw to an ST7789 SPI panel", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub spi_bus: Option<String>,
    #[arg(long)]
    pub spi_speed_hz: Option<u32>,
    #[arg(long)]
    pub dc_pin: Option<u32>,
    #[arg(long)]
    pub power_pin: Option<u32>,
    #[arg(long)]
    pub rotate_deg: Option<u16>,
    #[arg(long, action = ArgAction::Set)]
    pub invert: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub bgr: Option<bool>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Command {
    /// Fill the whole screen
    Fill { r: u8, g: u8, b: u8 },
    /// Plot one pixel
    #[command(allow_negative_numbers = true)]
    Pixel { x: i32, y: i32, r: u8, g: u8, b: u8 },
    /// Fill a rectangle
    #[command(allow_negative_numbers = true)]
    Rect { x: i32, y: i32, width: i32, height: i32, r: u8, g: u8, b: u8 },
    /// Show a panel-sized PNG/JPEG/GIF
    Image {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Play an animated GIF once
    Gif {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Rotate (0, 90, 180, 270)
    Rotate { degrees: u16 },
    /// Colour inversion on/off
    Invert {
        #[arg(action = ArgAction::Set)]
        on: bool,
    },
    /// Backlight on/off
    Power {
        #[arg(action = ArgAction::Set)]
        on: bool,
    },
}

/// Read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config (nice for debugging)
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/pibox/lcd.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/pibox/lcd.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/pibox-lcd.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["pibox-lcd.yaml", "config/pibox-lcd.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    match (&mut dst.panel, src.panel) {
        (None, Some(c)) => dst.panel = Some(c),
        (Some(d), Some(s)) => merge_panel(d, s),
        _ => {}
    }
}

fn merge_panel(dst: &mut PanelConfig, src: PanelConfig) {
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.rotate_deg.is_some()  { dst.rotate_deg = src.rotate_deg; }
    if src.invert.is_some()      { dst.invert = src.invert; }
    if src.bgr.is_some()         { dst.bgr = src.bgr; }
    if src.row_offset.is_some()  { dst.row_offset = src.row_offset; }
    if src.col_offset.is_some()  { dst.col_offset = src.col_offset; }
    if src.spi_bus.is_some()     { dst.spi_bus = src.spi_bus; }
    if src.speed_hz.is_some()    { dst.speed_hz = src.speed_hz; }
    if src.gpio_chip.is_some()   { dst.gpio_chip = src.gpio_chip; }
    if src.dc_pin.is_some()      { dst.dc_pin = src.dc_pin; }
    if src.power_pin.is_some()   { dst.power_pin = src.power_pin; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    let any_panel = cli.spi_bus.is_some()
        || cli.spi_speed_hz.is_some()
        || cli.dc_pin.is_some()
        || cli.power_pin.is_some()
        || cli.rotate_deg.is_some()
        || cli.invert.is_some()
        || cli.bgr.is_some();

    if any_panel && cfg.panel.is_none() {
        cfg.panel = Some(PanelConfig::default());
    }
    if let Some(panel) = cfg.panel.as_mut() {
        if cli.spi_bus.is_some()       { panel.spi_bus = cli.spi_bus.clone(); }
        if cli.spi_speed_hz.is_some()  { panel.speed_hz = cli.spi_speed_hz; }
        if cli.dc_pin.is_some()        { panel.dc_pin = cli.dc_pin; }
        if cli.power_pin.is_some()     { panel.power_pin = cli.power_pin; }
        if cli.rotate_deg.is_some()    { panel.rotate_deg = cli.rotate_deg; }
        if cli.invert.is_some()        { panel.invert = cli.invert; }
        if cli.bgr.is_some()           { panel.bgr = cli.bgr; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(panel) = cfg.panel.as_ref() {
        if panel.width == Some(0) || panel.height == Some(0) {
            return Err(ConfigError::Validation("panel width/height must be > 0".into()));
        }
        if let Some(rot) = panel.rotate_deg {
            match rot {
                0 | 90 | 180 | 270 => {},
                _ => return Err(ConfigError::Validation("panel rotate_deg must be 0|90|180|270".into()))
            }
        }
        panel.opts()
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        if panel.speed_hz == Some(0) {
            return Err(ConfigError::Validation("panel speed_hz must be > 0".into()));
        }
        if panel.dc_pin() == panel.power_pin() {
            return Err(ConfigError::Validation("panel dc_pin and power_pin must differ".into()));
        }
    }
    Ok(())
}
