//! Batch driver: header reading, resolution and sink hand-off for many files.

pub mod discover;

pub use discover::{discover_files, DEFAULT_PATTERNS};

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{error, info, instrument, warn};

use crate::{
    fits::HeaderSource,
    output::RecordSink,
    resolve::{Engine, FileIdentity, Resolution, ResolvedRecord},
};

/// Files resolved in parallel before their records are written.
const BATCH_SIZE: usize = 64;

/// Per-run outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub discovered: usize,
    /// Resolved and written, including incomplete records.
    pub processed: usize,
    /// Header could not be read.
    pub skipped: usize,
    /// Resolution aborted.
    pub aborted: usize,
    /// Written with required fields missing.
    pub incomplete: usize,
}

enum Outcome {
    Resolved(ResolvedRecord),
    Skipped,
    Aborted,
}

pub struct Ingestor<S: HeaderSource> {
    engine: Engine,
    source: S,
    workers: usize,
}

impl<S: HeaderSource> Ingestor<S> {
    pub fn new(engine: Engine, source: S) -> Self {
        Self {
            engine,
            source,
            workers: 1,
        }
    }

    /// Worker threads for resolution. 1 runs on the calling thread,
    /// 0 uses one per core.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Resolve `files` and write every resolved record to `sink`, in input
    /// order. Per-file failures are counted, not returned.
    #[instrument(level = "info", skip_all, fields(files = files.len()))]
    pub fn run(&self, files: &[PathBuf], sink: &mut dyn RecordSink) -> Result<IngestStats> {
        let start = Instant::now();
        let mut stats = IngestStats {
            discovered: files.len(),
            ..IngestStats::default()
        };

        if self.workers == 1 {
            for path in files {
                let outcome = self.process_one(path);
                record(&mut stats, outcome, sink)?;
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .context("building worker pool")?;
            for batch in files.chunks(BATCH_SIZE) {
                let outcomes: Vec<Outcome> =
                    pool.install(|| batch.par_iter().map(|p| self.process_one(p)).collect());
                for outcome in outcomes {
                    record(&mut stats, outcome, sink)?;
                }
            }
        }
        sink.finish()?;

        info!(
            discovered = stats.discovered,
            processed = stats.processed,
            skipped = stats.skipped,
            aborted = stats.aborted,
            incomplete = stats.incomplete,
            "ingest finished in {:?}",
            start.elapsed()
        );
        Ok(stats)
    }

    fn process_one(&self, path: &Path) -> Outcome {
        let file = match FileIdentity::from_path(path) {
            Ok(f) => f,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping unreadable file");
                return Outcome::Skipped;
            }
        };
        let header = match self.source.read_header(&file.path) {
            Ok(h) => h,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping file, header not read");
                return Outcome::Skipped;
            }
        };
        match self.engine.resolve(&file, &header) {
            Resolution::Resolved(r) => Outcome::Resolved(r),
            Resolution::Aborted(reason) => {
                error!(path = %path.display(), %reason, "resolution aborted");
                Outcome::Aborted
            }
        }
    }
}

fn record(stats: &mut IngestStats, outcome: Outcome, sink: &mut dyn RecordSink) -> Result<()> {
    match outcome {
        Outcome::Resolved(r) => {
            if !r.is_complete() {
                warn!(missing = ?r.missing, "writing incomplete record");
                stats.incomplete += 1;
            }
            sink.write(&r.fields)?;
            stats.processed += 1;
        }
        Outcome::Skipped => stats.skipped += 1,
        Outcome::Aborted => stats.aborted += 1,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fits::{FitsHeaderReader, HduSelector},
        output::JsonlSink,
        schema::{builtin_aliases, builtin_schema},
        test_support::{init_test_logging, tan_image, write_fits},
    };
    use std::fs;

    /// Collects written records in memory.
    #[derive(Default)]
    struct MemorySink {
        obs_ids: Vec<String>,
        finished: bool,
    }

    impl RecordSink for MemorySink {
        fn write(&mut self, record: &crate::resolve::FieldsInfo) -> Result<()> {
            self.obs_ids.push(
                record
                    .value("obs_id")
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn ingestor(workers: usize) -> Ingestor<FitsHeaderReader> {
        init_test_logging();
        let engine = Engine::new(builtin_schema().unwrap(), builtin_aliases().unwrap());
        Ingestor::new(engine, FitsHeaderReader::new(HduSelector::default(), false))
            .with_workers(workers)
    }

    fn populate(dir: &Path) -> Result<Vec<PathBuf>> {
        write_fits(&dir.join("ceers_a.fits"), &[tan_image("RA---TAN", "DEC--TAN")]);
        write_fits(&dir.join("ceers_b.fits"), &[tan_image("DEC--TAN", "RA---TAN")]);
        write_fits(&dir.join("sin.fits"), &[tan_image("RA---SIN", "DEC--SIN")]);
        fs::write(dir.join("corrupt.fits"), b"not a fits file at all")?;
        discover_files(&[dir], &DEFAULT_PATTERNS.map(String::from))
    }

    #[test]
    fn counts_every_outcome() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = populate(dir.path())?;
        let mut sink = MemorySink::default();

        let stats = ingestor(1).run(&files, &mut sink)?;
        assert_eq!(
            stats,
            IngestStats {
                discovered: 4,
                processed: 2,
                skipped: 1,
                aborted: 1,
                incomplete: 0,
            }
        );
        assert_eq!(sink.obs_ids, vec!["ceers_a", "ceers_b"]);
        assert!(sink.finished);
        Ok(())
    }

    #[test]
    fn parallel_run_keeps_input_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut files = Vec::new();
        for i in 0..(BATCH_SIZE + 5) {
            let path = dir.path().join(format!("img_{:03}.fits", i));
            write_fits(&path, &[tan_image("RA---TAN", "DEC--TAN")]);
            files.push(path);
        }
        let mut sink = MemorySink::default();
        let stats = ingestor(4).run(&files, &mut sink)?;
        assert_eq!(stats.processed, files.len());
        let expected: Vec<_> = (0..files.len()).map(|i| format!("img_{:03}", i)).collect();
        assert_eq!(sink.obs_ids, expected);
        Ok(())
    }

    #[test]
    fn writes_json_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = populate(dir.path())?;
        let mut sink = JsonlSink::new(Vec::new());
        ingestor(0).run(&files, &mut sink)?;

        let text = String::from_utf8(sink.into_inner())?;
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["s_ra"], 53.25);
        assert_eq!(rows[1]["s_ra"], -27.78);
        assert_eq!(rows[0]["instrument_name"], "NIRCAM/B");
        assert_eq!(rows[0]["target_name"], "EGS");
        assert_eq!(rows[0]["t_min"], "2022-11-18T03:12:47.123");
        assert!(rows[0]["obs_publisher_did"].is_null());
        Ok(())
    }
}
