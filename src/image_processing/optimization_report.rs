//! Tabular reports printed with `--report`
//!
//! Preview runs get the per-sample quality metrics next to the suggested
//! settings; batch runs get one row per input file.
use prettytable::{format, Cell, Row, Table};
use std::path::Path;

use super::auto_optimizer::Recommendation;
use super::metrics::MetricSample;
use super::{FileOutcome, PreviewResult, ProcessingResult};
use crate::utils::format_duration;

/// Metrics of a single sample image
#[derive(Debug, Clone)]
pub struct MetricsEntry {
    pub input_filename: String,
    pub sample: MetricSample,
    pub variants: usize,
}

/// Preview report: sample metrics, their averages and the recommendation
#[derive(Debug)]
pub struct MetricsReport {
    pub entries: Vec<MetricsEntry>,
    pub skipped: Vec<String>,
    pub recommendation: Option<Recommendation>,
}

impl MetricsReport {
    pub fn from_outcomes(
        outcomes: &[FileOutcome<PreviewResult>],
        recommendation: Option<Recommendation>,
    ) -> Self {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match &outcome.result {
                Ok(preview) => entries.push(MetricsEntry {
                    input_filename: extract_filename(&outcome.input_path),
                    sample: preview.sample,
                    variants: preview.variants.len(),
                }),
                Err(_) => skipped.push(extract_filename(&outcome.input_path)),
            }
        }

        Self {
            entries,
            skipped,
            recommendation,
        }
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![
            Cell::new("Sample"),
            Cell::new("Sharpness"),
            Cell::new("Brightness"),
            Cell::new("Contrast"),
            Cell::new("Variants"),
        ]));

        for entry in &self.entries {
            table.add_row(Row::new(vec![
                Cell::new(&truncate(&entry.input_filename, 30)),
                Cell::new(&format!("{:.2}", entry.sample.sharpness)),
                Cell::new(&format!("{:.2}", entry.sample.brightness)),
                Cell::new(&format!("{:.2}", entry.sample.contrast)),
                Cell::new(&entry.variants.to_string()),
            ]));
        }

        if let Some(rec) = &self.recommendation {
            table.add_row(Row::new(vec![
                Cell::new("└─> Average"),
                Cell::new(&format!("{:.2}", rec.averages.sharpness)),
                Cell::new(&format!("{:.2}", rec.averages.brightness)),
                Cell::new(&format!("{:.2}", rec.averages.contrast)),
                Cell::new(""),
            ]));
            table.add_row(Row::new(vec![
                Cell::new("└─> Suggested"),
                Cell::new(&format!("{:.2}", rec.sharpness_factor)),
                Cell::new(&format!("{:.2}", rec.brightness_factor)),
                Cell::new(&format!("{:.2}", rec.contrast_factor)),
                Cell::new(&format!("pad {:.2}", rec.face_crop_padding)),
            ]));
        }

        table
    }

    pub fn print(&self) {
        println!("\n📊 SAMPLE METRICS ({} analyzed)\n", self.entries.len());
        self.to_table().printstd();

        if !self.skipped.is_empty() {
            println!("\n   • Skipped (unreadable): {}", self.skipped.join(", "));
        }
        println!();
    }
}

/// One batch file, successful or not
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub input_filename: String,
    pub output_filename: Option<String>,
    pub dimensions: Option<(u32, u32)>,
    pub processing_time: Option<String>,
    pub error: Option<String>,
}

/// Batch report: one row per input file
#[derive(Debug)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[FileOutcome<ProcessingResult>]) -> Self {
        let entries = outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(result) => BatchEntry {
                    input_filename: extract_filename(&outcome.input_path),
                    output_filename: Some(extract_filename(&result.output_path)),
                    dimensions: Some((result.width, result.height)),
                    processing_time: Some(format_duration(result.processing_time)),
                    error: None,
                },
                Err(e) => BatchEntry {
                    input_filename: extract_filename(&outcome.input_path),
                    output_filename: None,
                    dimensions: None,
                    processing_time: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self { entries }
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![
            Cell::new("Input"),
            Cell::new("Output"),
            Cell::new("Size"),
            Cell::new("Time"),
            Cell::new("Status"),
        ]));

        for entry in &self.entries {
            let size = entry
                .dimensions
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_default();
            let status = match &entry.error {
                Some(error) => format!("✗ {}", truncate(error, 40)),
                None => "✓".to_string(),
            };

            table.add_row(Row::new(vec![
                Cell::new(&truncate(&entry.input_filename, 25)),
                Cell::new(&truncate(entry.output_filename.as_deref().unwrap_or("-"), 25)),
                Cell::new(&size),
                Cell::new(entry.processing_time.as_deref().unwrap_or("")),
                Cell::new(&status),
            ]));
        }

        table
    }

    pub fn print(&self) {
        let failed = self.entries.iter().filter(|e| e.error.is_some()).count();

        println!("\n📷 BATCH REPORT ({} files)\n", self.entries.len());
        self.to_table().printstd();
        println!();
        println!("   • Written: {}", self.entries.len() - failed);
        println!("   • Failed: {}", failed);
        println!();
    }
}

/// Truncate string to fit in column
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Helper to extract filename from path
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unknown")
        .to_string()
}
