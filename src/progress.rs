//! Progress UI for crawl runs.

use indicatif::{ProgressBar, ProgressStyle};
use pdf_crawler_core::{DownloadStats, LinkReport};

/// How per-link progress is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProgressMode {
    /// Lines above a bar counting saved documents.
    Bar,
    /// Plain lines on stdout.
    Plain,
    /// No per-link output.
    Silent,
}

impl ProgressMode {
    pub(crate) fn select(quiet: bool, stdout_is_terminal: bool) -> Self {
        if quiet {
            Self::Silent
        } else if stdout_is_terminal {
            Self::Bar
        } else {
            Self::Plain
        }
    }
}

/// Prints per-link lines and tracks saved documents against the target.
pub(crate) struct ProgressReporter {
    mode: ProgressMode,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub(crate) fn new(mode: ProgressMode, target: usize) -> Self {
        let bar = (mode == ProgressMode::Bar).then(|| {
            let bar = ProgressBar::new(u64::try_from(target).unwrap_or(u64::MAX));
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} PDFs saved")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        Self { mode, bar }
    }

    pub(crate) fn report(&self, report: &LinkReport) {
        let line = report.message();
        match (&self.bar, self.mode) {
            (Some(bar), _) => {
                bar.println(line);
                if !report.outcome.is_skipped() {
                    bar.inc(1);
                }
            }
            (None, ProgressMode::Silent) => {}
            (None, _) => println!("{line}"),
        }
    }

    pub(crate) fn finish(&self, stats: &DownloadStats) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        for line in summary_lines(stats) {
            println!("{line}");
        }
    }
}

pub(crate) fn summary_lines(stats: &DownloadStats) -> [String; 2] {
    [
        format!("Total PDFs saved: {}", stats.saved()),
        format!("Total PDFs skipped: {}", stats.skipped()),
    ]
}
