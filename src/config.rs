// Config Module - Configuration management and command-line argument parsing
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::animation::{self, LedAnimation};
use crate::params::{ParamField, Parameters};
use crate::spiral;

/// View modes the mode loop knows; the first one is the fallback
pub const MODES: [&str; 2] = ["pipe", "leds"];

// Global storage for custom config path
static CUSTOM_CONFIG_PATH: OnceLock<Option<String>> = OnceLock::new();

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Spiral pump pipe calculator and LED spiral animation preview",
    long_about = "Lays an Archimedean spiral pipe into a wheel, reports pipe length, volume and the\n\
                  maximum sensible coil count, and previews LED animations running along the spiral.\n\
                  Settings live in ~/.config/spiralpump/config.conf and apply live when edited."
)]
pub struct Args {
    /// View mode (pipe, leds)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Wheel radius in meters
    #[arg(short, long)]
    pub radius: Option<f64>,

    /// Pipe diameter in meters
    #[arg(short, long)]
    pub diameter: Option<f64>,

    /// Number of spiral coils
    #[arg(short, long)]
    pub coils: Option<f64>,

    /// LED animation (coil_chase, water_fill)
    #[arg(short, long)]
    pub animation: Option<String>,

    /// Total number of LEDs on the strip
    #[arg(short = 'L', long)]
    pub leds: Option<usize>,

    /// Target framerate for the LED animation
    #[arg(long)]
    pub fps: Option<f64>,

    /// Config file path or name (e.g., --cfg /full/path or --cfg myconf for ~/.config/spiralpump/myconf.conf)
    #[arg(long)]
    pub cfg: Option<String>,

    /// Render the pipe view to a PNG file and exit
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Print the computed results as JSON and exit
    #[arg(long)]
    pub json: bool,

    /// Run the LED animation without the terminal UI
    #[arg(long)]
    pub headless: bool,

    /// Stop the headless animation after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Quiet mode
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpiralConfig {
    #[serde(skip)]
    pub config_path: Option<PathBuf>,  // Stores the config file path (not serialized)

    pub mode: String,  // Current mode: pipe, leds
    pub wheel_radius: f64,  // Wheel radius in meters
    pub pipe_diameter: f64,  // Pipe diameter in meters
    pub spiral_coils: f64,  // Number of coils laid into the wheel
    pub pipe_chord: f64,  // Sample spacing for the pipe view (meters)
    pub show_points: bool,  // Draw a dot on every pipe sample
    pub led_chord: f64,  // Sample spacing for the LED view, i.e. LED pitch (meters)
    pub total_leds: usize,
    pub led_animation: String,  // coil_chase or water_fill
    pub coil_boundaries: Vec<usize>,  // LED index where each coil starts, outer to inner
    pub water_fill_leds: usize,  // LEDs driven by the water fill animation
    pub fps: f64,
    pub snapshot_width: u32,
    pub snapshot_height: u32,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        let params = Parameters::default();
        Self {
            config_path: None,
            mode: "pipe".to_string(),
            wheel_radius: params.radius,
            pipe_diameter: params.pipe_diameter,
            spiral_coils: params.coils,
            pipe_chord: spiral::PIPE_CHORD,
            show_points: false,
            led_chord: spiral::LED_CHORD,
            total_leds: 500,
            led_animation: LedAnimation::CoilChase.name().to_string(),
            coil_boundaries: vec![0, 136, 252, 348, 424, 480],
            water_fill_leds: animation::WATER_NUM_LEDS,
            fps: 60.0,
            snapshot_width: 800,
            snapshot_height: 800,
        }
    }
}

impl SpiralConfig {
    pub fn merge_with_args(&mut self, args: &Args) -> bool {
        // Track if any args were actually provided
        let mut args_provided = false;

        if let Some(ref mode) = args.mode {
            self.mode = mode.clone();
            args_provided = true;
        }

        if let Some(radius) = args.radius {
            self.wheel_radius = radius;
            args_provided = true;
        }

        if let Some(diameter) = args.diameter {
            self.pipe_diameter = diameter;
            args_provided = true;
        }

        if let Some(coils) = args.coils {
            self.spiral_coils = coils;
            args_provided = true;
        }

        if let Some(ref animation) = args.animation {
            self.led_animation = animation.clone();
            args_provided = true;
        }

        if let Some(leds) = args.leds {
            self.total_leds = leds;
            args_provided = true;
        }

        if let Some(fps) = args.fps {
            self.fps = fps;
            args_provided = true;
        }

        if args_provided {
            self.sanitize();
        }

        args_provided
    }

    /// Set the global config path (called once at startup)
    pub fn set_config_path(cfg: Option<String>) {
        let _ = CUSTOM_CONFIG_PATH.set(cfg);
    }

    /// Get the global config path (if set)
    fn get_config_path_arg() -> Option<&'static str> {
        CUSTOM_CONFIG_PATH.get()
            .and_then(|opt| opt.as_deref())
    }

    fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let config_dir = PathBuf::from(home).join(".config").join("spiralpump");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn config_path(cfg_arg: Option<&str>) -> Result<PathBuf> {
        // Priority: explicit arg > global > None
        let cfg = cfg_arg.or_else(|| Self::get_config_path_arg());

        if let Some(cfg) = cfg {
            // Check if it's an absolute path
            let path = PathBuf::from(cfg);
            if path.is_absolute() {
                return Ok(path);
            }

            // Check if it contains path separators (relative path)
            if cfg.contains('/') || cfg.contains('\\') {
                return Ok(path);
            }

            // Add .conf extension if not present
            let filename = if cfg.ends_with(".conf") {
                cfg.to_string()
            } else {
                format!("{}.conf", cfg)
            };

            Ok(Self::config_dir()?.join(filename))
        } else {
            Ok(Self::config_dir()?.join("config.conf"))
        }
    }

    pub fn load_with_path(cfg_arg: Option<&str>) -> Result<Self> {
        let path = Self::config_path(cfg_arg)?;
        let mut parsed = Self::load_from(&path)?;
        parsed.config_path = Some(path);
        Ok(parsed)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        let mut parsed: Self = toml::from_str(contents)?;
        parsed.sanitize();
        Ok(parsed)
    }

    /// Sanitize config values to handle common formatting issues
    pub fn sanitize(&mut self) {
        self.mode = self.mode.trim().to_lowercase();
        if !MODES.contains(&self.mode.as_str()) {
            self.mode = MODES[0].to_string();
        }
        self.led_animation = self.led_animation.trim().to_lowercase();

        // Clamp to the control ranges
        let clamp_field = |field: ParamField, value: f64| {
            let spec = field.spec();
            if value.is_finite() { value.max(spec.min).min(spec.max) } else { spec.min }
        };
        self.wheel_radius = clamp_field(ParamField::Radius, self.wheel_radius);
        self.pipe_diameter = clamp_field(ParamField::PipeDiameter, self.pipe_diameter);
        self.spiral_coils = clamp_field(ParamField::Coils, self.spiral_coils);

        // Clamp numeric values to reasonable ranges
        self.pipe_chord = self.pipe_chord.max(0.001).min(1.0);
        self.led_chord = self.led_chord.max(0.001).min(1.0);
        self.total_leds = self.total_leds.max(1).min(100000);
        self.water_fill_leds = self.water_fill_leds.min(self.total_leds);
        self.fps = self.fps.max(1.0).min(500.0);
        self.snapshot_width = self.snapshot_width.max(16).min(8192);
        self.snapshot_height = self.snapshot_height.max(16).min(8192);

        // Boundaries must be strictly increasing and inside the strip
        self.coil_boundaries.sort_unstable();
        self.coil_boundaries.dedup();
        let total_leds = self.total_leds;
        self.coil_boundaries.retain(|&b| b < total_leds);
    }

    pub fn params(&self) -> Parameters {
        Parameters {
            radius: self.wheel_radius,
            pipe_diameter: self.pipe_diameter,
            coils: self.spiral_coils,
            chord: self.pipe_chord,
        }
    }

    pub fn led_params(&self) -> Parameters {
        Parameters {
            chord: self.led_chord,
            ..self.params()
        }
    }

    /// Copy the control values back so they persist
    pub fn apply_params(&mut self, params: &Parameters) {
        self.wheel_radius = params.radius;
        self.pipe_diameter = params.pipe_diameter;
        self.spiral_coils = params.coils;
    }

    pub fn animation(&self) -> LedAnimation {
        LedAnimation::from_string(&self.led_animation).unwrap_or(LedAnimation::CoilChase)
    }

    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    pub fn save(&self) -> Result<()> {
        let path = match self.config_path.clone() {
            Some(path) => path,
            None => Self::config_path(None)?,
        };

        // Sanitize values before saving
        let mut sanitized = self.clone();
        sanitized.sanitize();

        std::fs::write(&path, sanitized.to_commented_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    // Build TOML with comments manually for better documentation
    fn to_commented_toml(&self) -> String {
        let boundaries: Vec<String> = self.coil_boundaries.iter().map(|b| b.to_string()).collect();
        format!(
            r#"# SpiralPump Configuration File
# Edit this file while the program is running to change settings in real-time

# View mode: "pipe" (pipe layout and results) or "leds" (LED animation preview)
mode = "{}"

# Wheel radius in meters (0.1 - 10)
wheel_radius = {:?}

# Pipe diameter in meters (0.01 - 1)
pipe_diameter = {:?}

# Number of spiral coils (0.1 - 50)
spiral_coils = {:?}

# Distance between spiral samples in the pipe view (meters)
pipe_chord = {:?}

# Draw a dot on every pipe sample point
show_points = {}

# Distance between LEDs along the spiral (meters)
led_chord = {:?}

# Total number of LEDs on the strip
total_leds = {}

# LED animation: "coil_chase" or "water_fill"
led_animation = "{}"

# LED index where each coil starts, outer to inner (strictly increasing)
coil_boundaries = [{}]

# Number of LEDs driven by the water fill animation
water_fill_leds = {}

# Animation framerate
fps = {:?}

# PNG snapshot size in pixels
snapshot_width = {}
snapshot_height = {}
"#,
            self.mode,
            self.wheel_radius,
            self.pipe_diameter,
            self.spiral_coils,
            self.pipe_chord,
            self.show_points,
            self.led_chord,
            self.total_leds,
            self.led_animation,
            boundaries.join(", "),
            self.water_fill_leds,
            self.fps,
            self.snapshot_width,
            self.snapshot_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_toml_round_trip() {
        let mut config = SpiralConfig::default();
        config.wheel_radius = 3.25;
        config.led_animation = "water_fill".to_string();
        config.coil_boundaries = vec![0, 100, 200];

        let parsed: SpiralConfig = toml::from_str(&config.to_commented_toml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: SpiralConfig = toml::from_str("spiral_coils = 7.0\n").unwrap();
        assert_eq!(parsed.spiral_coils, 7.0);
        assert_eq!(parsed.wheel_radius, 2.5);
        assert_eq!(parsed.total_leds, 500);
    }

    #[test]
    fn test_sanitize() {
        let mut config = SpiralConfig {
            mode: " LEDS ".to_string(),
            wheel_radius: 50.0,
            pipe_diameter: f64::NAN,
            spiral_coils: 0.0,
            total_leds: 300,
            water_fill_leds: 400,
            fps: 0.0,
            coil_boundaries: vec![250, 0, 120, 120, 320],
            ..SpiralConfig::default()
        };
        config.sanitize();

        assert_eq!(config.mode, "leds");
        assert_eq!(config.wheel_radius, 10.0);
        assert_eq!(config.pipe_diameter, 0.01);
        assert_eq!(config.spiral_coils, 0.1);
        assert_eq!(config.water_fill_leds, 300);
        assert_eq!(config.fps, 1.0);
        assert_eq!(config.coil_boundaries, vec![0, 120, 250]);
        assert!(animation::validate_coils(&config.coil_boundaries, config.total_leds).is_ok());
    }

    #[test]
    fn test_unknown_mode_falls_back_to_pipe() {
        let mut config = SpiralConfig {
            mode: "spiral".to_string(),
            ..SpiralConfig::default()
        };
        config.sanitize();
        assert_eq!(config.mode, "pipe");

        let parsed = SpiralConfig::load_from_str("mode = \"Sand\"\n").unwrap();
        assert_eq!(parsed.mode, "pipe");
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = SpiralConfig::default();
        assert!(!config.merge_with_args(&Args::default()));

        let args = Args {
            radius: Some(4.0),
            animation: Some("Water_Fill".to_string()),
            ..Args::default()
        };
        assert!(config.merge_with_args(&args));
        assert_eq!(config.wheel_radius, 4.0);
        assert_eq!(config.animation(), LedAnimation::WaterFill);
    }

    #[test]
    fn test_params_from_config() {
        let config = SpiralConfig::default();
        assert_eq!(config.params(), Parameters::default());
        assert_eq!(config.led_params().chord, spiral::LED_CHORD);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("spiralpump-test-{}.conf", std::process::id()));
        let mut config = SpiralConfig::default();
        config.mode = "leds".to_string();
        config.config_path = Some(path.clone());
        config.save().unwrap();

        let loaded = SpiralConfig::load_from(&path).unwrap();
        assert_eq!(loaded.mode, "leds");
        let _ = std::fs::remove_file(&path);
    }
}
