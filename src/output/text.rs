//! Human-readable run summary.
//!
//! ```text
//! 1 set of identical files moved to /media/videos/duplicates.
//! Scanned 3 files (3 new, 0 already seen), 2 comparisons, 5 B moved in 0.01s
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::RunReport;

/// Text renderer for a [`RunReport`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
    color: bool,
    details: bool,
}

impl<'a> TextOutput<'a> {
    /// Plain renderer without per-file lines.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self {
            report,
            color: false,
            details: false,
        }
    }

    /// Enable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// List every move and skipped file, not just the counts.
    #[must_use]
    pub fn with_details(mut self, details: bool) -> Self {
        self.details = details;
        self
    }

    /// Headline sentence describing the outcome.
    #[must_use]
    pub fn headline(&self) -> String {
        let report = self.report;
        if report.pairs.is_empty() {
            return "No identical files found.".to_string();
        }

        let sets = report.sets_moved();
        let noun = if sets == 1 { "set" } else { "sets" };
        let verb = if report.moves.dry_run {
            "would be moved"
        } else {
            "moved"
        };
        format!(
            "{sets} {noun} of identical files {verb} to {}.",
            report.quarantine_dir.display()
        )
    }

    /// Render the full summary, newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        let report = self.report;
        let mut out = String::new();

        if self.details {
            for moved in &report.moves.successes {
                let _ = writeln!(
                    out,
                    "  {} -> {}",
                    moved.from.display(),
                    self.paint_path(&moved.to.display().to_string())
                );
            }
        }

        let headline = self.headline();
        if report.pairs.is_empty() {
            let _ = writeln!(out, "{headline}");
        } else if self.color {
            let _ = writeln!(out, "{}", headline.green().bold());
        } else {
            let _ = writeln!(out, "{headline}");
        }

        if !report.moves.failures.is_empty() {
            let line = format!(
                "{} file(s) could not be moved:",
                report.moves.failure_count()
            );
            let _ = writeln!(out, "{}", self.paint_error(&line));
            for failure in &report.moves.failures {
                let _ = writeln!(out, "  {}: {}", failure.path.display(), failure.error);
            }
        }

        if !report.skipped.is_empty() {
            let line = format!(
                "{} file(s) skipped because of errors.",
                report.skipped.len()
            );
            let _ = writeln!(out, "{}", self.paint_warning(&line));
            if self.details {
                for skipped in &report.skipped {
                    let _ = writeln!(out, "  {}: {}", skipped.path.display(), skipped.error);
                }
            }
        }

        if report.interrupted {
            let _ = writeln!(
                out,
                "{}",
                self.paint_warning("Interrupted; state was not saved.")
            );
        }

        let stats = &report.stats;
        let _ = writeln!(
            out,
            "Scanned {} files ({} new, {} already seen), {} comparisons, {} moved in {:.2}s",
            stats.files_walked,
            stats.new_files,
            stats.already_seen,
            stats.comparisons,
            ByteSize::b(report.moves.bytes_moved),
            stats.duration_ms as f64 / 1000.0
        );

        out
    }

    /// Write the rendered summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    fn paint_path(&self, s: &str) -> String {
        if self.color {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_error(&self, s: &str) -> String {
        if self.color {
            s.red().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_warning(&self, s: &str) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }
}
