use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::config_file::OutputFormat;

/// Extensions (lowercase) accepted as input images
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Progress label with the completed percentage and, once known, the time left
pub fn progress_message(label: &str, fraction: f64, eta: Option<Duration>) -> String {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
    match eta {
        Some(eta) if percent < 100 => {
            format!("{} {}% (~{} left)", label, percent, format_duration(eta))
        }
        _ => format!("{} {}%", label, percent),
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the supported image extensions
pub fn has_valid_extension(path: &Path) -> bool {
    get_file_extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Render a factor the way it appears in preview filenames:
/// always with a decimal part (`1.0`, `1.3`, `0.25`).
pub fn format_factor(value: f64) -> String {
    format!("{:?}", value)
}

fn file_stem(input_path: &Path) -> &str {
    input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
}

/// Batch output name: `<basename>.<format extension>`
pub fn output_filename(input_path: &Path, format: OutputFormat) -> String {
    format!("{}.{}", file_stem(input_path), format.extension())
}

/// Preview variant name: `<basename>_sharp<S>_bright<B>_cont<C>_pad<P>.jpg`
pub fn preview_filename(
    input_path: &Path,
    sharpness: f64,
    brightness: f64,
    contrast: f64,
    padding: f64,
) -> String {
    format!(
        "{}_sharp{}_bright{}_cont{}_pad{}.jpg",
        file_stem(input_path),
        format_factor(sharpness),
        format_factor(brightness),
        format_factor(contrast),
        format_factor(padding)
    )
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print success message
pub fn success_println(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_progress_message() {
        assert_eq!(progress_message("Enhancing images", 0.0, None), "Enhancing images 0%");
        assert_eq!(
            progress_message("Enhancing images", 0.25, Some(Duration::from_secs(3))),
            "Enhancing images 25% (~3.000s left)"
        );
        assert_eq!(
            progress_message("Rendering previews", 1.0, Some(Duration::ZERO)),
            "Rendering previews 100%"
        );
        assert_eq!(progress_message("Enhancing images", 1.7, None), "Enhancing images 100%");
    }

    #[test]
    fn test_has_valid_extension() {
        assert!(has_valid_extension(Path::new("photo.jpg")));
        assert!(has_valid_extension(Path::new("photo.JPEG")));
        assert!(has_valid_extension(Path::new("dir/photo.Png")));
        assert!(!has_valid_extension(Path::new("photo.gif")));
        assert!(!has_valid_extension(Path::new("notes.txt")));
        assert!(!has_valid_extension(Path::new("jpg")));
    }

    #[test]
    fn test_format_factor() {
        assert_eq!(format_factor(1.0), "1.0");
        assert_eq!(format_factor(1.3), "1.3");
        assert_eq!(format_factor(0.25), "0.25");
        assert_eq!(format_factor(2.0), "2.0");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename(Path::new("input/IMG_001.JPG"), OutputFormat::Jpg),
            "IMG_001.jpg"
        );
        assert_eq!(
            output_filename(Path::new("input/portrait.jpeg"), OutputFormat::Png),
            "portrait.png"
        );
    }

    #[test]
    fn test_preview_filename() {
        assert_eq!(
            preview_filename(Path::new("sample_input/face.png"), 1.3, 1.0, 1.2, 0.1),
            "face_sharp1.3_bright1.0_cont1.2_pad0.1.jpg"
        );
    }
}
