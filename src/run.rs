use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::config::{RunOptions, UserOptions};
use crate::enex::stream::NoteStream;
use crate::links;
use crate::sources::{enumerate_all, ExportSource};
use crate::writer::{MarkdownWriter, NoteProcessor};

/// Note counts for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SourceSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped
    }

    fn add(&mut self, other: &SourceSummary) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed, total {}",
            self.succeeded(),
            self.skipped,
            self.failed,
            self.total()
        )
    }
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: ExportSource,
    pub summary: SourceSummary,
    pub output_dir: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// Notebook folders written during the run, in processing order.
    pub output_folders: Vec<PathBuf>,
    /// Set when rewriting internal links failed after conversion.
    pub link_error: Option<String>,
}

impl RunReport {
    pub fn totals(&self) -> SourceSummary {
        let mut totals = SourceSummary::default();
        for report in &self.sources {
            totals.add(&report.summary);
        }
        totals
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Full run: setup, every source, then the link post-pass. Setup errors
/// (missing input, missing template) abort before any source is touched.
pub async fn convert(user: UserOptions) -> Result<RunReport> {
    let sources = enumerate_all(&user.enex_sources)?;
    let options = RunOptions::resolve(user)?;

    let mut writer = MarkdownWriter::new(&options);
    let mut report = run_sources(&options, &sources, &mut writer).await;

    rewrite_links(&mut report, &options);
    Ok(report)
}

/// Link post-pass over every written folder. A failure is logged and kept on
/// the report; the converted notes stay as they are.
fn rewrite_links(report: &mut RunReport, options: &RunOptions) {
    if let Err(e) = links::rewrite_internal_links(&report.output_folders, options) {
        error!("Could not rewrite internal links: {:#}", e);
        report.link_error = Some(format!("{e:#}"));
    }
}

/// Convert every source in order, one stream at a time. A failing source is
/// logged and recorded; the run always continues with the next one.
pub async fn run_sources<P: NoteProcessor>(
    options: &RunOptions,
    sources: &[ExportSource],
    processor: &mut P,
) -> RunReport {
    let mut report = RunReport::default();

    for source in sources {
        let source_report = convert_source(options, source, processor).await;
        if let Some(dir) = &source_report.output_dir {
            if !report.output_folders.contains(dir) {
                report.output_folders.push(dir.clone());
            }
        }
        report.sources.push(source_report);
    }

    info!("==========================");
    info!(
        "Run finished: {} ({} of {} sources failed)",
        report.totals(),
        report.failed_sources(),
        report.sources.len()
    );
    report
}

async fn convert_source<P: NoteProcessor>(
    options: &RunOptions,
    source: &ExportSource,
    processor: &mut P,
) -> SourceReport {
    let mut report = SourceReport {
        source: source.clone(),
        summary: SourceSummary::default(),
        output_dir: None,
        error: None,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    if let Err(e) = stream_source(options, source, processor, &mut report, &pb).await {
        error!("Could not convert {}: {:#}", source.path.display(), e);
        report.error = Some(format!("{e:#}"));
    }
    pb.finish_and_clear();

    info!("==========================");
    info!("Conversion finished for {}: {}", source.path.display(), report.summary);
    report
}

async fn stream_source<P: NoteProcessor>(
    options: &RunOptions,
    source: &ExportSource,
    processor: &mut P,
    report: &mut SourceReport,
    pb: &ProgressBar,
) -> Result<()> {
    info!("Getting stream from {}", source.path.display());
    let mut notes = NoteStream::open(source).await?;
    let notebook = notes.notebook().to_string();
    let stack = source.notebook_stack_name.as_str();

    report.output_dir = Some(processor.start_notebook(&notebook, stack)?);

    while let Some(note) = notes.next_note().await? {
        let summary = &mut report.summary;
        if options.skip_web_clips && note.is_web_clip {
            summary.skipped += 1;
            info!("Notes skipped: {} (web clip \"{}\")", summary.skipped, note.title);
            continue;
        }

        summary.processed += 1;
        match processor.process_note(&note, &notebook, stack) {
            Ok(_) => info!("Notes processed: {}", summary.processed),
            Err(e) => {
                summary.failed += 1;
                warn!(
                    "Failed to convert note \"{}\" from {}: {:#}",
                    note.title,
                    source.path.display(),
                    e
                );
            }
        }
        pb.set_message(format!("{notebook}: {} notes", summary.total()));
    }
    Ok(())
}

// ── Tests ──
