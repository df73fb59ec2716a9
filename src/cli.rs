use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config_file::{ConfigOverrides, OutputFormat, DEFAULT_CONFIG_FILE};
use crate::image_processing::PreviewGrid;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CropSwitch {
    /// Crop around the first detected face
    #[value(name = "yes")]
    Yes,
    /// Keep the full frame
    #[value(name = "no")]
    No,
}

impl From<CropSwitch> for bool {
    fn from(value: CropSwitch) -> Self {
        value == CropSwitch::Yes
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "batch-enhancer",
    version,
    about = "Batch face-crop, enhance and resize photos",
    long_about = "
Batch Enhancer

Crops photos around the first detected face, applies sharpness, contrast and
brightness factors, downsizes them and writes the results to an output folder.
The preview mode renders a grid of enhancement settings over a few sample
images and saves suggested defaults, measured from the samples, to the session
configuration used by the batch mode.

Running without a subcommand opens an interactive menu.

Example Usage:
  # Render previews from ./sample_input and save suggested settings
  batch-enhancer preview

  # Enhance ./input into ./output with the saved settings
  batch-enhancer batch

  # Override some settings for a single run
  batch-enhancer batch -i ~/Photos -o ~/enhanced --sharpness 1.5 --crop no --format png

  # Enable face cropping with a SeetaFace model
  batch-enhancer --face-model ./seeta_fd_frontal_v1.0.bin batch --padding 0.3"
)]
pub struct Args {
    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Number of parallel processing jobs (0 = auto-detect CPU cores)
    #[arg(
        short = 'j',
        long = "jobs",
        default_value = "0",
        value_name = "N",
        global = true
    )]
    pub jobs: usize,

    /// Emit JSON lines instead of human-readable output
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Generate a report table at the end
    #[arg(
        long = "report",
        global = true,
        help = "Display a formatted table with per-file metrics or outcomes"
    )]
    pub report: bool,

    /// SeetaFace frontal model used for face detection (face cropping is a no-op without it)
    #[arg(long = "face-model", value_name = "FILE", global = true)]
    pub face_model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Enhance every image of the input folder
    Batch(BatchArgs),
    /// Render a grid of variants for sample images and suggest settings
    Preview(PreviewArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    /// Input directory
    #[arg(short = 'i', long = "input", default_value = "input", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output", default_value = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Session configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE, value_name = "FILE")]
    pub config: PathBuf,

    /// Sharpness factor (1.0 = unchanged)
    #[arg(long = "sharpness", value_name = "FACTOR")]
    pub sharpness: Option<f64>,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long = "brightness", value_name = "FACTOR")]
    pub brightness: Option<f64>,

    /// Contrast factor (1.0 = unchanged)
    #[arg(long = "contrast", value_name = "FACTOR")]
    pub contrast: Option<f64>,

    /// Padding around the face, as a fraction of the face box
    #[arg(long = "padding", value_name = "FRACTION")]
    pub padding: Option<f64>,

    /// Enable or disable face cropping
    #[arg(long = "crop", value_name = "yes|no")]
    pub crop: Option<CropSwitch>,

    /// Maximum output width/height in pixels
    #[arg(long = "max-dim", value_name = "PIXELS")]
    pub max_dim: Option<u32>,

    /// Output format
    #[arg(long = "format")]
    pub format: Option<OutputFormat>,

    /// Equalize the value channel before enhancing
    #[arg(long = "equalize")]
    pub equalize: bool,
}

impl BatchArgs {
    /// Command-line values that take precedence over the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            sharpness_factor: self.sharpness,
            brightness_factor: self.brightness,
            contrast_factor: self.contrast,
            face_crop_padding: self.padding,
            crop_enabled: self.crop.map(bool::from),
            max_dim: self.max_dim,
            format: self.format,
            equalize_histogram: self.equalize.then_some(true),
        }
    }
}

impl Default for BatchArgs {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            sharpness: None,
            brightness: None,
            contrast: None,
            padding: None,
            crop: None,
            max_dim: None,
            format: None,
            equalize: false,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct PreviewArgs {
    /// Directory with sample images
    #[arg(short = 'i', long = "input", default_value = "sample_input", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving the rendered variants
    #[arg(
        short = 'o',
        long = "output",
        default_value = "preview_output",
        value_name = "DIR"
    )]
    pub output_dir: PathBuf,

    /// Where the suggested settings are saved
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE, value_name = "FILE")]
    pub config: PathBuf,

    /// Comma-separated sharpness factors to render
    #[arg(long = "sharpness-values", default_value = "1.0,1.3,1.6", value_name = "LIST")]
    pub sharpness_values: String,

    /// Comma-separated brightness factors to render
    #[arg(long = "brightness-values", default_value = "1.0,1.1,1.2", value_name = "LIST")]
    pub brightness_values: String,

    /// Comma-separated contrast factors to render
    #[arg(long = "contrast-values", default_value = "1.0,1.1,1.2", value_name = "LIST")]
    pub contrast_values: String,

    /// Comma-separated face paddings to render
    #[arg(long = "padding-values", default_value = "0.1,0.2,0.3", value_name = "LIST")]
    pub padding_values: String,
}

impl PreviewArgs {
    /// Parse the four value lists into a preview grid
    pub fn grid(&self) -> Result<PreviewGrid, String> {
        let padding = parse_values(&self.padding_values)?;
        if let Some(negative) = padding.iter().find(|p| **p < 0.0) {
            return Err(format!("Padding values must be >= 0.0, got {}", negative));
        }

        Ok(PreviewGrid {
            sharpness: parse_values(&self.sharpness_values)?,
            brightness: parse_values(&self.brightness_values)?,
            contrast: parse_values(&self.contrast_values)?,
            padding,
        })
    }
}

impl Default for PreviewArgs {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("sample_input"),
            output_dir: PathBuf::from("preview_output"),
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            sharpness_values: "1.0,1.3,1.6".to_string(),
            brightness_values: "1.0,1.1,1.2".to_string(),
            contrast_values: "1.0,1.1,1.2".to_string(),
            padding_values: "0.1,0.2,0.3".to_string(),
        }
    }
}

/// Entry of the interactive menu shown when no subcommand is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Preview,
    Batch,
    Exit,
}

/// Map a line typed at the menu prompt to its action
pub fn parse_menu_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Preview),
        "2" => Some(MenuChoice::Batch),
        "3" => Some(MenuChoice::Exit),
        _ => None,
    }
}

/// Parse a comma-separated list of factors (e.g. "1.0, 1.3,1.6")
pub fn parse_values(list: &str) -> Result<Vec<f64>, String> {
    let mut values = Vec::new();

    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let value = part
            .parse::<f64>()
            .map_err(|_| format!("Invalid value '{}' in list '{}'", part, list))?;
        if !value.is_finite() {
            return Err(format!("Value '{}' must be a finite number", part));
        }
        values.push(value);
    }

    if values.is_empty() {
        return Err(format!("No values in list '{}'", list));
    }

    Ok(values)
}
