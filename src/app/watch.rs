//! Directory watch loop.
//!
//! The OS watcher and the Ctrl-C handler both push `WatchEvent`s into one
//! channel; a single-threaded dispatch loop drains it and runs the pipeline
//! for each matching file. Events that arrive while a file is being
//! processed wait in the channel and are handled in order afterwards.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::event::CreateKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::app::pipeline::{self, RunOptions};
use crate::domain::ReportConfig;
use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Shutdown,
}

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Watch `config.input_dir` until Ctrl-C, processing each new matching file.
pub fn run_watch(config: &ReportConfig, process_existing: bool) -> Result<WatchStats, PipelineError> {
    if !config.input_dir.is_dir() {
        return Err(PipelineError::config(format!(
            "Input directory '{}' does not exist.",
            config.input_dir.display()
        )));
    }
    // Created up front so archived files can be recognised and ignored.
    for dir in [&config.archive_dir, &config.output_dir] {
        std::fs::create_dir_all(dir)
            .map_err(|e| PipelineError::config(format!("Failed to create '{}': {e}", dir.display())))?;
    }
    check_layout(config)?;

    let (tx, rx) = mpsc::channel();

    let fs_tx = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for path in created_files(&event) {
                let _ = fs_tx.send(WatchEvent::Created(path));
            }
        }
        Err(e) => log::warn!("Watch error: {e}"),
    })
    .map_err(|e| PipelineError::config(format!("Failed to start file watcher: {e}")))?;
    watcher
        .watch(&config.input_dir, RecursiveMode::Recursive)
        .map_err(|e| PipelineError::config(format!("Failed to watch '{}': {e}", config.input_dir.display())))?;

    let stop_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(WatchEvent::Shutdown);
    })
    .map_err(|e| PipelineError::config(format!("Failed to install Ctrl-C handler: {e}")))?;

    if process_existing {
        for path in existing_matches(config) {
            let _ = tx.send(WatchEvent::Created(path));
        }
    }
    drop(tx);

    log::info!(
        "Watching '{}' for files starting with '{}' (Ctrl-C to stop)",
        config.input_dir.display(),
        config.file_prefix
    );

    let stats = dispatch(&rx, config, |path| {
        pipeline::process_file(path, config, RunOptions::today()).map(|_| ())
    });

    drop(watcher);
    log::info!(
        "Watcher stopped: {} processed, {} failed, {} skipped",
        stats.processed,
        stats.failed,
        stats.skipped
    );
    Ok(stats)
}

/// Drain `events` until a shutdown message (or every sender is gone).
///
/// Failures are logged and counted; they never stop the loop.
pub fn dispatch<F>(events: &Receiver<WatchEvent>, config: &ReportConfig, mut process: F) -> WatchStats
where
    F: FnMut(&Path) -> Result<(), PipelineError>,
{
    let mut stats = WatchStats::default();

    while let Ok(event) = events.recv() {
        let path = match event {
            WatchEvent::Shutdown => {
                log::info!("Shutdown requested");
                break;
            }
            WatchEvent::Created(path) => path,
        };

        if !config.matches_prefix(&path) || is_excluded(&path, config) {
            log::debug!("Ignoring {}", path.display());
            continue;
        }

        if !config.settle_delay.is_zero() {
            std::thread::sleep(config.settle_delay);
        }
        if !path.is_file() {
            log::debug!("Skipping {}: no longer present", path.display());
            stats.skipped += 1;
            continue;
        }

        log::info!("New sales file detected: {}", path.display());
        match process(&path) {
            Ok(()) => {
                stats.processed += 1;
                log::info!("Finished processing {}", path.display());
            }
            Err(err) => {
                stats.failed += 1;
                log::error!("Could not process {}: {err}", path.display());
            }
        }
    }

    stats
}

/// File paths from a create event. Folder creations are dropped here; other
/// non-files are filtered later by the dispatch loop.
pub fn created_files(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.clone(),
        _ => Vec::new(),
    }
}

/// Files already under the input directory whose names match the prefix.
pub fn existing_matches(config: &ReportConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![config.input_dir.clone()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if !is_excluded(&path, config) {
                    stack.push(path);
                }
            } else if config.matches_prefix(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

/// Writing into the watched directory itself would feed the chart and
/// archived files straight back into the loop.
pub fn check_layout(config: &ReportConfig) -> Result<(), PipelineError> {
    let input = canonical(&config.input_dir);
    for (label, dir) in [("Archive", &config.archive_dir), ("Output", &config.output_dir)] {
        if canonical(dir) == input {
            return Err(PipelineError::config(format!(
                "{label} directory '{}' must differ from the input directory.",
                dir.display()
            )));
        }
    }
    Ok(())
}

/// Files under an archive or output directory nested inside the input
/// directory are ours and must not be picked up again.
fn is_excluded(path: &Path, config: &ReportConfig) -> bool {
    let path = canonical(path);
    nested_output_dirs(config).iter().any(|dir| path.starts_with(dir))
}

/// Archive and output directories that sit strictly below the input directory.
fn nested_output_dirs(config: &ReportConfig) -> Vec<PathBuf> {
    let input = canonical(&config.input_dir);
    [&config.archive_dir, &config.output_dir]
        .into_iter()
        .map(|dir| canonical(dir))
        .filter(|dir| *dir != input && dir.starts_with(&input))
        .collect()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn config(root: &Path) -> ReportConfig {
        ReportConfig {
            input_dir: root.join("in"),
            file_prefix: "sales_".to_string(),
            archive_dir: root.join("in").join("archive"),
            output_dir: root.join("out"),
            chart_font: None,
            settle_delay: Duration::ZERO,
        }
    }

    #[test]
    fn dispatch_processes_matching_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        fs::create_dir_all(&cfg.input_dir).unwrap();
        let a = cfg.input_dir.join("sales_a.csv");
        let b = cfg.input_dir.join("sales_b.csv");
        let other = cfg.input_dir.join("inventory.csv");
        for p in [&a, &b, &other] {
            fs::write(p, "x").unwrap();
        }

        let (tx, rx) = mpsc::channel();
        tx.send(WatchEvent::Created(b.clone())).unwrap();
        tx.send(WatchEvent::Created(other)).unwrap();
        tx.send(WatchEvent::Created(a.clone())).unwrap();
        tx.send(WatchEvent::Shutdown).unwrap();
        tx.send(WatchEvent::Created(a.clone())).unwrap();

        let mut seen = Vec::new();
        let stats = dispatch(&rx, &cfg, |p| {
            seen.push(p.to_path_buf());
            Ok(())
        });

        assert_eq!(seen, vec![b, a]);
        assert_eq!(stats, WatchStats { processed: 2, failed: 0, skipped: 0 });
    }

    #[test]
    fn dispatch_survives_failures_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        fs::create_dir_all(&cfg.input_dir).unwrap();
        let bad = cfg.input_dir.join("sales_bad.csv");
        let good = cfg.input_dir.join("sales_good.csv");
        fs::write(&bad, "x").unwrap();
        fs::write(&good, "x").unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(WatchEvent::Created(bad.clone())).unwrap();
        tx.send(WatchEvent::Created(cfg.input_dir.join("sales_gone.csv"))).unwrap();
        tx.send(WatchEvent::Created(good)).unwrap();
        drop(tx);

        let stats = dispatch(&rx, &cfg, |p| {
            if p == bad {
                Err(PipelineError::parse(p, "boom"))
            } else {
                Ok(())
            }
        });

        assert_eq!(stats, WatchStats { processed: 1, failed: 1, skipped: 1 });
    }

    #[test]
    fn dispatch_ignores_files_in_archive() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        fs::create_dir_all(&cfg.archive_dir).unwrap();
        let archived = cfg.archive_dir.join("sales_old.csv");
        fs::write(&archived, "x").unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(WatchEvent::Created(archived)).unwrap();
        drop(tx);

        let stats = dispatch(&rx, &cfg, |_| panic!("archived file must not be processed"));
        assert_eq!(stats, WatchStats::default());
    }

    #[test]
    fn output_dir_above_input_does_not_hide_files() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("data").join("incoming");
        fs::create_dir_all(&input_dir).unwrap();
        let cfg = ReportConfig {
            input_dir: input_dir.clone(),
            archive_dir: dir.path().join("data"),
            output_dir: dir.path().to_path_buf(),
            ..config(dir.path())
        };
        let file = input_dir.join("sales_jan.csv");
        fs::write(&file, "x").unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(WatchEvent::Created(file.clone())).unwrap();
        drop(tx);

        let mut seen = Vec::new();
        let stats = dispatch(&rx, &cfg, |p| {
            seen.push(p.to_path_buf());
            Ok(())
        });

        assert_eq!(seen, vec![file.clone()]);
        assert_eq!(stats.processed, 1);
        assert_eq!(existing_matches(&cfg), vec![file]);
        assert!(check_layout(&cfg).is_ok());
    }

    #[test]
    fn output_dir_equal_to_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        fs::create_dir_all(&cfg.input_dir).unwrap();
        assert!(check_layout(&cfg).is_ok());

        cfg.output_dir = cfg.input_dir.clone();
        assert!(matches!(check_layout(&cfg), Err(PipelineError::Config { .. })));

        let mut cfg = config(dir.path());
        cfg.archive_dir = cfg.input_dir.join(".");
        assert!(matches!(check_layout(&cfg), Err(PipelineError::Config { .. })));
    }

    #[test]
    fn only_create_events_yield_paths() {
        let p = PathBuf::from("/in/sales_a.csv");
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(p.clone());
        let folder = Event::new(EventKind::Create(CreateKind::Folder)).add_path(PathBuf::from("/in/sales_dir"));
        let removed = Event::new(EventKind::Remove(notify::event::RemoveKind::File)).add_path(p.clone());

        assert_eq!(created_files(&created), vec![p]);
        assert!(created_files(&folder).is_empty());
        assert!(created_files(&removed).is_empty());
    }

    #[test]
    fn existing_matches_walks_subdirs_but_not_archive() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let nested = cfg.input_dir.join("2024").join("q1");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&cfg.archive_dir).unwrap();
        fs::write(cfg.input_dir.join("sales_top.csv"), "x").unwrap();
        fs::write(nested.join("sales_deep.csv"), "x").unwrap();
        fs::write(nested.join("notes.txt"), "x").unwrap();
        fs::write(cfg.archive_dir.join("sales_done.csv"), "x").unwrap();

        let found = existing_matches(&cfg);

        assert_eq!(
            found,
            vec![nested.join("sales_deep.csv"), cfg.input_dir.join("sales_top.csv")]
        );
    }
}
