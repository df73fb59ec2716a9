use rayon::prelude::*;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Batch progress tracking shared between worker threads
pub struct BatchProcessor {
    pub total_files: usize,
    pub processed_count: AtomicUsize,
    pub start_time: Instant,
}

impl BatchProcessor {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Increment processed count and return current count
    pub fn increment(&self) -> usize {
        self.processed_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            (self.processed_count.load(Ordering::Relaxed) as f64) / (self.total_files as f64)
        }
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Option<Duration> {
        let processed = self.processed_count.load(Ordering::Relaxed);
        if processed == 0 {
            return None;
        }

        let remaining = self.total_files.saturating_sub(processed);
        if remaining == 0 {
            return Some(Duration::new(0, 0));
        }

        let time_per_item = self.start_time.elapsed() / processed as u32;
        Some(time_per_item * remaining as u32)
    }
}

/// Run `process_fn` over every file on `pool`.
///
/// Results keep the order of `files` whatever the scheduling. With
/// `sequential` set the files are handled one after the other, in order.
pub fn process_files_parallel<T, F, P>(
    pool: &ThreadPool,
    files: &[PathBuf],
    sequential: bool,
    process_fn: F,
    progress_callback: P,
) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> T + Send + Sync,
    P: Fn(usize, f64, Option<Duration>) + Send + Sync,
{
    let processor = BatchProcessor::new(files.len());

    let run_one = |file_path: &PathBuf| {
        let result = process_fn(file_path);

        let completed = processor.increment();
        progress_callback(completed, processor.progress(), processor.eta());

        result
    };

    if sequential {
        files.iter().map(run_one).collect()
    } else {
        pool.install(|| files.par_iter().map(run_one).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn pool(threads: usize) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    fn files(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("img_{:03}.jpg", i)))
            .collect()
    }

    #[test]
    fn test_results_keep_input_order() {
        let files = files(50);
        let results = process_files_parallel(
            &pool(4),
            &files,
            false,
            |path| path.to_string_lossy().to_string(),
            |_, _, _| {},
        );

        let expected: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_sequential_visits_in_order() {
        let files = files(10);
        let visited = Mutex::new(Vec::new());

        process_files_parallel(
            &pool(4),
            &files,
            true,
            |path| visited.lock().unwrap().push(path.to_path_buf()),
            |_, _, _| {},
        );

        assert_eq!(*visited.lock().unwrap(), files);
    }

    #[test]
    fn test_progress_reaches_total() {
        let files = files(8);
        let max_seen = AtomicUsize::new(0);

        process_files_parallel(
            &pool(2),
            &files,
            false,
            |_| (),
            |count, progress, _| {
                max_seen.fetch_max(count, Ordering::Relaxed);
                assert!(progress > 0.0 && progress <= 1.0);
            },
        );

        assert_eq!(max_seen.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn test_batch_processor_progress() {
        let processor = BatchProcessor::new(4);
        assert_eq!(processor.progress(), 0.0);
        assert!(processor.eta().is_none());

        processor.increment();
        processor.increment();
        assert_eq!(processor.progress(), 0.5);
        assert!(processor.eta().is_some());

        let empty = BatchProcessor::new(0);
        assert_eq!(empty.progress(), 1.0);
    }
}
