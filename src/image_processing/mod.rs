pub mod auto_optimizer;
pub mod batch;
pub mod crop;
pub mod enhance;
pub mod face_detection;
pub mod metrics;
pub mod optimization_report;
pub mod resize;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};
use rayon::ThreadPool;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::config_file::{EnhancementConfig, OutputFormat, JPEG_QUALITY};
use crate::error::EnhanceError;
use crate::utils::{has_valid_extension, output_filename, preview_filename, verbose_println};

use self::face_detection::FaceDetector;
use self::metrics::MetricSample;

/// Outcome of one input file. Per-file failures are captured here and never
/// abort the run.
#[derive(Debug)]
pub struct FileOutcome<T = ProcessingResult> {
    pub input_path: PathBuf,
    pub result: Result<T, EnhanceError>,
}

impl<T> FileOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A successfully enhanced batch file
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub processing_time: Duration,
}

/// Variants rendered for one sample image
#[derive(Debug)]
pub struct PreviewResult {
    pub input_path: PathBuf,
    /// Metrics of the unmodified decoded image
    pub sample: MetricSample,
    pub variants: Vec<PathBuf>,
    /// Variants (or the face detection) that failed; the sample still counts
    pub failures: Vec<EnhanceError>,
    pub processing_time: Duration,
}

/// Parameter grid swept by the preview driver
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewGrid {
    pub sharpness: Vec<f64>,
    pub brightness: Vec<f64>,
    pub contrast: Vec<f64>,
    pub padding: Vec<f64>,
}

impl Default for PreviewGrid {
    fn default() -> Self {
        Self {
            sharpness: vec![1.0, 1.3, 1.6],
            brightness: vec![1.0, 1.1, 1.2],
            contrast: vec![1.0, 1.1, 1.2],
            padding: vec![0.1, 0.2, 0.3],
        }
    }
}

impl PreviewGrid {
    /// Number of variants rendered per sample
    pub fn len(&self) -> usize {
        self.sharpness.len() * self.brightness.len() * self.contrast.len() * self.padding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregated counts of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `(input file name, reason)` for every failure, in input order
    pub errors: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn from_outcomes<T>(outcomes: &[FileOutcome<T>]) -> Self {
        let errors: Vec<(String, String)> = outcomes
            .iter()
            .filter_map(|outcome| {
                outcome.result.as_ref().err().map(|e| {
                    (
                        display_name(&outcome.input_path),
                        e.to_string(),
                    )
                })
            })
            .collect();

        Self {
            total: outcomes.len(),
            succeeded: outcomes.len() - errors.len(),
            failed: errors.len(),
            errors,
        }
    }
}

/// Metric samples of every preview file that decoded, in input order
pub fn collect_samples(outcomes: &[FileOutcome<PreviewResult>]) -> Vec<MetricSample> {
    outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok().map(|r| r.sample))
        .collect()
}

pub struct ProcessingEngine {
    config: EnhancementConfig,
    detector: Box<dyn FaceDetector>,
    pool: ThreadPool,
    verbose: bool,
}

impl ProcessingEngine {
    /// `jobs == 0` sizes the worker pool to the number of CPUs.
    pub fn new(
        config: EnhancementConfig,
        detector: Box<dyn FaceDetector>,
        jobs: usize,
        verbose: bool,
    ) -> Result<Self> {
        let threads = if jobs == 0 { num_cpus::get() } else { jobs };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to initialize thread pool")?;

        Ok(Self {
            config,
            detector,
            pool,
            verbose,
        })
    }

    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    /// List the eligible images directly inside `input_dir`, sorted by file
    /// name. An existing directory without images yields
    /// [`EnhanceError::EmptyInputSet`].
    pub fn discover_images(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        verbose_println(
            self.verbose,
            &format!("Scanning directory: {}", input_dir.display()),
        );

        let walker = WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut image_files = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| {
                format!("Failed to read input directory: {}", input_dir.display())
            })?;
            let path = entry.path();

            if entry.file_type().is_file() && has_valid_extension(path) {
                image_files.push(path.to_path_buf());
            }
        }

        if image_files.is_empty() {
            return Err(EnhanceError::EmptyInputSet {
                dir: input_dir.to_path_buf(),
            }
            .into());
        }

        verbose_println(
            self.verbose,
            &format!("Found {} image files", image_files.len()),
        );
        Ok(image_files)
    }

    /// Enhance every file into `output_dir`. Only failing to create the
    /// output directory is fatal.
    pub fn process_batch<P>(
        &self,
        image_files: &[PathBuf],
        output_dir: &Path,
        progress_callback: P,
    ) -> Result<Vec<FileOutcome>>
    where
        P: Fn(usize, f64, Option<Duration>) + Send + Sync,
    {
        create_output_dir(output_dir)?;

        let sequential = has_name_collisions(image_files, |path| {
            output_filename(path, self.config.format)
        });
        if sequential {
            verbose_println(
                self.verbose,
                "Several inputs share an output name, processing sequentially",
            );
        }

        Ok(batch::process_files_parallel(
            &self.pool,
            image_files,
            sequential,
            |path| FileOutcome {
                input_path: path.to_path_buf(),
                result: self.process_single_image(path, output_dir),
            },
            progress_callback,
        ))
    }

    /// Decode, crop, enhance, resize and save a single file
    pub fn process_single_image(
        &self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<ProcessingResult, EnhanceError> {
        let start = Instant::now();
        verbose_println(
            self.verbose,
            &format!("Processing: {}", input_path.display()),
        );

        let img = load_rgb(input_path)?;

        let cropped = if self.config.crop_enabled {
            let faces = self.detector.detect(&img)?;
            if faces.len() > 1 {
                verbose_println(
                    self.verbose,
                    &format!(
                        "{} faces in {}, using the first one",
                        faces.len(),
                        input_path.display()
                    ),
                );
            }
            self.crop_logged(&img, faces.first(), self.config.face_crop_padding, input_path)
        } else {
            img
        };

        let enhanced = enhance::enhance_with_config(&cropped, &self.config);
        let resized = resize::resize_to_fit(&enhanced, self.config.max_dim)?;

        let output_path = output_dir.join(output_filename(input_path, self.config.format));
        save_image(&resized, &output_path, self.config.format)?;

        Ok(ProcessingResult {
            input_path: input_path.to_path_buf(),
            output_path,
            width: resized.width(),
            height: resized.height(),
            processing_time: start.elapsed(),
        })
    }

    /// Render every grid combination for each sample into `output_dir`.
    ///
    /// Decode failures exclude the file (and its metrics); later failures
    /// are collected in [`PreviewResult::failures`].
    pub fn generate_previews<P>(
        &self,
        sample_files: &[PathBuf],
        output_dir: &Path,
        grid: &PreviewGrid,
        progress_callback: P,
    ) -> Result<Vec<FileOutcome<PreviewResult>>>
    where
        P: Fn(usize, f64, Option<Duration>) + Send + Sync,
    {
        create_output_dir(output_dir)?;

        let sequential = has_name_collisions(sample_files, |path| {
            preview_filename(path, 1.0, 1.0, 1.0, 0.0)
        });

        Ok(batch::process_files_parallel(
            &self.pool,
            sample_files,
            sequential,
            |path| FileOutcome {
                input_path: path.to_path_buf(),
                result: self.preview_single_image(path, output_dir, grid),
            },
            progress_callback,
        ))
    }

    fn preview_single_image(
        &self,
        input_path: &Path,
        output_dir: &Path,
        grid: &PreviewGrid,
    ) -> Result<PreviewResult, EnhanceError> {
        let start = Instant::now();
        verbose_println(
            self.verbose,
            &format!("Rendering previews: {}", input_path.display()),
        );

        let img = load_rgb(input_path)?;
        let sample = MetricSample::measure(&img);

        let mut variants = Vec::with_capacity(grid.len());
        let mut failures = Vec::new();

        match self.detector.detect(&img) {
            Ok(faces) => {
                for &padding in &grid.padding {
                    let cropped = self.crop_logged(&img, faces.first(), padding, input_path);

                    for &sharpness in &grid.sharpness {
                        for &brightness in &grid.brightness {
                            for &contrast in &grid.contrast {
                                // Same order as batch: sharpness, contrast, then brightness
                                let enhanced =
                                    enhance::enhance(&cropped, sharpness, brightness, contrast);
                                let path = output_dir.join(preview_filename(
                                    input_path, sharpness, brightness, contrast, padding,
                                ));

                                match save_image(&enhanced, &path, OutputFormat::Jpg) {
                                    Ok(()) => variants.push(path),
                                    Err(e) => failures.push(e),
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => failures.push(e),
        }

        Ok(PreviewResult {
            input_path: input_path.to_path_buf(),
            sample,
            variants,
            failures,
            processing_time: start.elapsed(),
        })
    }

    fn crop_logged(
        &self,
        img: &RgbImage,
        face: Option<&face_detection::FaceBox>,
        padding: f64,
        input_path: &Path,
    ) -> RgbImage {
        if let Some(face) = face {
            if crop::padded_face_region(face, padding, img.width(), img.height()).is_none() {
                verbose_println(
                    self.verbose,
                    &format!(
                        "Face box {:?} is empty inside {}, keeping the full image",
                        face,
                        input_path.display()
                    ),
                );
            }
        }
        crop::crop_to_face(img, face, padding)
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage, EnhanceError> {
    let img = image::open(path).map_err(|source| EnhanceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Encode `img` to `path`. JPEG always uses [`JPEG_QUALITY`].
fn save_image(img: &RgbImage, path: &Path, format: OutputFormat) -> Result<(), EnhanceError> {
    let encode_error = |source: image::ImageError| EnhanceError::Encode {
        path: path.to_path_buf(),
        source,
    };

    match format {
        OutputFormat::Jpg => {
            let file = File::create(path).map_err(|source| EnhanceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
            encoder
                .write_image(
                    img.as_raw(),
                    img.width(),
                    img.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(encode_error)
        }
        OutputFormat::Png => img
            .save_with_format(path, ImageFormat::Png)
            .map_err(encode_error),
    }
}

fn create_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|source| EnhanceError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn has_name_collisions<F>(files: &[PathBuf], name_of: F) -> bool
where
    F: Fn(&Path) -> String,
{
    let mut seen = HashSet::new();
    !files.iter().all(|path| seen.insert(name_of(path)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
