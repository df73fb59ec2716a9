// Library exports shared by the command-line binary and its tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use config_file::{ConfigOverrides, EnhancementConfig, OutputFormat};
pub use error::EnhanceError;
pub use image_processing::{
    BatchSummary, FileOutcome, PreviewGrid, PreviewResult, ProcessingEngine, ProcessingResult,
};
pub use json_output::JsonMessage;
