//! Human-readable report.
//!
//! ```text
//! Group 1: 2 files (1.0 KiB each)
//!   Hash: 2cf24dba5fb0a30e...
//!   /photos/a.jpg
//!   /backup/a.jpg
//!
//! Scanned 3 files (3.0 KiB) in 0.12s, hashed 2
//! 1 duplicate group(s), 1 duplicate file(s), 1.0 KiB reclaimable (33.3%)
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use super::{Resolution, RunReport};
use crate::actions::{preview, ActionOutcome};
use crate::duplicates::DuplicateStats;

const HEADER: Style = Style::new().bold().cyan();
const DIM: Style = Style::new().dim();
const WARN: Style = Style::new().yellow();
const FAIL: Style = Style::new().red();
const GOOD: Style = Style::new().green();

/// Text formatter for a [`RunReport`].
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    run: RunReport<'a>,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter. Colors are off unless enabled.
    #[must_use]
    pub fn new(run: RunReport<'a>) -> Self {
        Self { run, color: false }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, text: impl std::fmt::Display, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render the report into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let scan = self.run.scan;

        if scan.groups.is_empty() {
            writeln!(w, "{}", self.paint("No duplicate files found.", GOOD))?;
        }

        for (index, group) in scan.groups.iter().enumerate() {
            let header = format!(
                "Group {}: {} files ({} each)",
                index + 1,
                group.len(),
                ByteSize::b(group.size)
            );
            writeln!(w, "{}", self.paint(header, HEADER))?;
            writeln!(w, "  {}", self.paint(format!("Hash: {}", group.hash_hex()), DIM))?;
            for file in &group.files {
                writeln!(w, "  {}", file.path.display())?;
            }
            writeln!(w)?;
        }

        self.write_summary(w)?;
        self.write_errors(w)?;
        if let Some(resolution) = self.run.resolution {
            self.write_resolution(w, resolution)?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let summary = &self.run.scan.summary;
        let stats = DuplicateStats::from_groups(&self.run.scan.groups);

        writeln!(
            w,
            "Scanned {} files ({}) in {:.2}s, hashed {} with {}",
            summary.total_files,
            summary.total_size_display(),
            summary.scan_duration.as_secs_f64(),
            summary.hashed_files,
            summary.algorithm
        )?;
        if stats.group_count > 0 {
            let line = format!(
                "{} duplicate group(s), {} duplicate file(s), largest group {} files, {} reclaimable ({:.1}%)",
                stats.group_count,
                stats.duplicate_files,
                stats.largest_group,
                ByteSize::b(stats.wasted_bytes),
                summary.wasted_percentage()
            );
            writeln!(w, "{}", self.paint(line, Style::new().bold()))?;
        }
        Ok(())
    }

    fn write_errors<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let errors = &self.run.scan.errors;
        if errors.is_empty() {
            return Ok(());
        }
        writeln!(w)?;
        writeln!(w, "{}", self.paint(format!("Errors ({}):", errors.len()), WARN))?;
        for error in errors {
            writeln!(w, "  {}: {}", error.path.display(), error.message)?;
        }
        Ok(())
    }

    fn write_resolution<W: Write>(&self, w: &mut W, resolution: Resolution<'_>) -> io::Result<()> {
        writeln!(w)?;
        match resolution {
            Resolution::DryRun(actions) => {
                writeln!(w, "{}", self.paint("Dry run, no files were changed:", HEADER))?;
                write!(w, "{}", preview(actions))?;
            }
            Resolution::Executed(report) => {
                let style = if report.all_succeeded() { GOOD } else { WARN };
                writeln!(w, "{}", self.paint(report.summary(), style))?;
                for action in report
                    .actions
                    .iter()
                    .filter(|a| a.outcome == ActionOutcome::Failed)
                {
                    let message = format!(
                        "  Failed: {}: {}",
                        action.path.display(),
                        action.error.as_deref().unwrap_or("unknown error")
                    );
                    writeln!(w, "{}", self.paint(message, FAIL))?;
                }
                let pending = report.actions.iter().filter(|a| a.is_pending()).count();
                if report.interrupted && pending > 0 {
                    writeln!(w, "  {} file(s) left untouched", pending)?;
                }
            }
        }
        Ok(())
    }
}
