use anyhow::{Context, Result};
use clap::Parser;
use console::{style, Term};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use batch_enhancer::cli::{
    parse_menu_choice, Args, BatchArgs, Command, MenuChoice, PreviewArgs,
};
use batch_enhancer::config_file::EnhancementConfig;
use batch_enhancer::error::EnhanceError;
use batch_enhancer::image_processing::auto_optimizer;
use batch_enhancer::image_processing::face_detection::{
    FaceDetector, NoFaceDetector, RustfaceDetector,
};
use batch_enhancer::image_processing::optimization_report::{BatchReport, MetricsReport};
use batch_enhancer::image_processing::{collect_samples, BatchSummary, ProcessingEngine};
use batch_enhancer::json_output::JsonMessage;
use batch_enhancer::utils::{
    create_progress_bar, error_println, format_duration, progress_message, success_println,
    verbose_println, warn_println,
};

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.json {
        println!("{}", style("Batch Enhancer").bold().blue());
        println!(
            "{}",
            style("Face crop, enhance and resize photos in bulk").dim()
        );
        println!();
    }

    match &args.command {
        Some(Command::Batch(batch)) => run_batch(&args, batch),
        Some(Command::Preview(preview)) => run_preview(&args, preview),
        None => run_menu(&args),
    }
}

/// Interactive entry point used when no subcommand is given
fn run_menu(args: &Args) -> Result<()> {
    println!("{}", style("Choose an action:").bold());
    println!("  1. Generate previews and suggested settings");
    println!("  2. Run the batch enhancement");
    println!("  3. Exit");

    let choice = read_menu_line()?;

    match parse_menu_choice(&choice) {
        Some(MenuChoice::Preview) => run_preview(args, &PreviewArgs::default()),
        Some(MenuChoice::Batch) => run_batch(args, &BatchArgs::default()),
        Some(MenuChoice::Exit) => Ok(()),
        None => {
            println!(
                "{}",
                style(format!(
                    "Invalid choice '{}'. Please enter 1, 2 or 3.",
                    choice.trim()
                ))
                .red()
            );
            Ok(())
        }
    }
}

/// Read the menu answer from the terminal, or from stdin when it is piped
/// or stdout is redirected.
fn read_menu_line() -> Result<String> {
    let term = Term::stdout();
    term.write_str("> ")?;

    if term.is_term() {
        return term.read_line().context("Failed to read menu choice");
    }

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read menu choice")?;
    Ok(line)
}

fn build_detector(args: &Args) -> Result<Box<dyn FaceDetector>> {
    match &args.face_model {
        Some(path) => {
            let detector = RustfaceDetector::from_model_file(path)?;
            verbose_println(
                args.verbose && !args.json,
                &format!("Loaded face model: {}", path.display()),
            );
            Ok(Box::new(detector))
        }
        None => Ok(Box::new(NoFaceDetector)),
    }
}

/// Discover the input images. `None` means there is nothing to do: the empty
/// directory has already been reported.
fn discover_or_report(
    engine: &ProcessingEngine,
    input_dir: &Path,
    json: bool,
) -> Result<Option<Vec<PathBuf>>> {
    let err = match engine.discover_images(input_dir) {
        Ok(files) => return Ok(Some(files)),
        Err(err) => err,
    };

    if let Some(EnhanceError::EmptyInputSet { dir }) = err.downcast_ref::<EnhanceError>() {
        if json {
            JsonMessage::summary(0, 0, 0, 0.0);
        } else {
            println!(
                "{}",
                style(format!(
                    "No images found in {} (supported: jpg, jpeg, png)",
                    dir.display()
                ))
                .red()
            );
        }
        return Ok(None);
    }

    Err(err)
}

fn run_batch(args: &Args, batch: &BatchArgs) -> Result<()> {
    let start_time = Instant::now();
    let human = !args.json;

    let config = EnhancementConfig::load(&batch.config, &batch.overrides())
        .with_context(|| format!("Failed to load configuration: {}", batch.config.display()))?;

    if args.verbose && human {
        println!("{}", style("Configuration:").bold());
        println!("  Config file: {}", batch.config.display());
        println!("  Sharpness factor: {}", config.sharpness_factor);
        println!("  Brightness factor: {}", config.brightness_factor);
        println!("  Contrast factor: {}", config.contrast_factor);
        println!(
            "  Face crop: {} (padding {})",
            if config.crop_enabled { "enabled" } else { "disabled" },
            config.face_crop_padding
        );
        println!("  Max dimension: {}", config.max_dim);
        println!("  Output format: {}", config.format.extension());
        println!("  Histogram equalization: {}", config.equalize_histogram);
        println!();
    }

    if config.crop_enabled && args.face_model.is_none() && human {
        warn_println("No --face-model given: face cropping is skipped");
    }

    let engine = ProcessingEngine::new(
        config,
        build_detector(args)?,
        args.jobs,
        args.verbose && human,
    )?;

    let Some(image_files) = discover_or_report(&engine, &batch.input_dir, args.json)? else {
        return Ok(());
    };

    let total = image_files.len();
    let progress = create_progress_bar(total as u64);
    if human {
        progress.set_message("Enhancing images");
    } else {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let outcomes =
        engine.process_batch(&image_files, &batch.output_dir, |count, fraction, eta| {
            let message = progress_message("Enhancing images", fraction, eta);
            if human {
                progress.set_position(count as u64);
                progress.set_message(message);
            } else {
                JsonMessage::progress(count, total, message);
            }
        })?;

    progress.finish_with_message("✓ Processing complete!");

    let summary = BatchSummary::from_outcomes(&outcomes);
    let total_time = start_time.elapsed();

    if args.json {
        for outcome in &outcomes {
            match &outcome.result {
                Ok(result) => JsonMessage::file_completed(
                    &outcome.input_path,
                    std::slice::from_ref(&result.output_path),
                    result.processing_time.as_millis(),
                ),
                Err(e) => JsonMessage::file_failed(&outcome.input_path, e.to_string()),
            }
        }
        JsonMessage::summary(
            summary.total,
            summary.succeeded,
            summary.failed,
            total_time.as_secs_f64(),
        );
        return Ok(());
    }

    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!(
        "  Successfully processed: {}",
        style(summary.succeeded).bold().green()
    );
    if summary.failed > 0 {
        println!("  Failed: {}", style(summary.failed).bold().red());
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(total_time)).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(total_time / total as u32)).dim()
    );

    println!();
    println!("{}", style("Output files:").bold().green());
    println!("  All files: {}", batch.output_dir.display());

    print_errors(&summary);

    if args.report {
        BatchReport::from_outcomes(&outcomes).print();
    }

    Ok(())
}

fn run_preview(args: &Args, preview: &PreviewArgs) -> Result<()> {
    let start_time = Instant::now();
    let human = !args.json;

    let grid = preview.grid().map_err(anyhow::Error::msg)?;

    if args.face_model.is_none() && human {
        warn_println("No --face-model given: previews are rendered without face cropping");
    }

    let engine = ProcessingEngine::new(
        EnhancementConfig::default(),
        build_detector(args)?,
        args.jobs,
        args.verbose && human,
    )?;

    let Some(sample_files) = discover_or_report(&engine, &preview.input_dir, args.json)? else {
        return Ok(());
    };

    if human {
        println!(
            "Rendering {} variants for each of {} samples",
            style(grid.len()).bold(),
            style(sample_files.len()).bold()
        );
    }

    let total = sample_files.len();
    let progress = create_progress_bar(total as u64);
    if human {
        progress.set_message("Rendering previews");
    } else {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let outcomes = engine.generate_previews(
        &sample_files,
        &preview.output_dir,
        &grid,
        |count, fraction, eta| {
            let message = progress_message("Rendering previews", fraction, eta);
            if human {
                progress.set_position(count as u64);
                progress.set_message(message);
            } else {
                JsonMessage::progress(count, total, message);
            }
        },
    )?;

    progress.finish_with_message("✓ Previews rendered!");

    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                if args.json {
                    JsonMessage::file_completed(
                        &outcome.input_path,
                        result.variants.as_slice(),
                        result.processing_time.as_millis(),
                    );
                }
                for failure in &result.failures {
                    if args.json {
                        JsonMessage::file_failed(&outcome.input_path, failure.to_string());
                    } else {
                        warn_println(&failure.to_string());
                    }
                }
            }
            Err(e) => {
                if args.json {
                    JsonMessage::file_failed(&outcome.input_path, e.to_string());
                } else {
                    error_println(&e.to_string());
                }
            }
        }
    }

    let summary = BatchSummary::from_outcomes(&outcomes);
    let samples = collect_samples(&outcomes);

    let recommendation = match auto_optimizer::recommend(&samples) {
        Ok(recommendation) => recommendation,
        Err(e) => {
            if args.json {
                JsonMessage::summary(
                    summary.total,
                    summary.succeeded,
                    summary.failed,
                    start_time.elapsed().as_secs_f64(),
                );
            } else {
                error_println(&e.to_string());
            }
            return Ok(());
        }
    };

    recommendation.save(&preview.config)?;

    if args.json {
        JsonMessage::recommendation(&recommendation, &preview.config);
        JsonMessage::summary(
            summary.total,
            summary.succeeded,
            summary.failed,
            start_time.elapsed().as_secs_f64(),
        );
        return Ok(());
    }

    let averages = &recommendation.averages;
    println!();
    println!("{}", style("Sample Analysis:").bold().blue());
    println!(
        "  Average sharpness (Laplacian variance): {}",
        style(format!("{:.2}", averages.sharpness)).bold()
    );
    println!(
        "  Average brightness (HSV value): {}",
        style(format!("{:.2}", averages.brightness)).bold()
    );
    println!(
        "  Average contrast (gray std-dev): {}",
        style(format!("{:.2}", averages.contrast)).bold()
    );
    for line in &recommendation.reasoning {
        println!("  {}", style(line).dim());
    }

    println!();
    println!("{}", style("Suggested Settings:").bold().green());
    println!("  SHARPNESS_FACTOR: {}", recommendation.sharpness_factor);
    println!("  BRIGHTNESS_FACTOR: {}", recommendation.brightness_factor);
    println!("  CONTRAST_FACTOR: {}", recommendation.contrast_factor);
    println!("  FACE_CROP_PADDING: {}", recommendation.face_crop_padding);
    println!();
    success_println(&format!(
        "Configuration saved to {}",
        preview.config.display()
    ));
    println!("  Previews: {}", preview.output_dir.display());
    println!(
        "  Total processing time: {}",
        style(format_duration(start_time.elapsed())).bold()
    );

    print_errors(&summary);

    if args.report {
        MetricsReport::from_outcomes(&outcomes, Some(recommendation)).print();
    }

    Ok(())
}

fn print_errors(summary: &BatchSummary) {
    if summary.errors.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Errors encountered:").bold().red());
    for (i, (filename, error)) in summary.errors.iter().enumerate() {
        println!(
            "  {}: {} - {}",
            style(format!("#{}", i + 1)).dim(),
            style(filename).bold().red(),
            error
        );
    }

    println!();
    println!(
        "{}",
        style(format!(
            "⚠ {} errors occurred during processing",
            summary.errors.len()
        ))
        .bold()
        .yellow()
    );
    println!("  Check image files and try again with --verbose for more details");
}
