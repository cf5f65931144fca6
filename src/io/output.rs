use crate::pipeline::{Action, Outcome, PlannedOutcome, RunSummary};
use clap::ValueEnum;
use colored::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_summary(&mut self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Writer for `format`, targeting `output` or stdout.
pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink)),
    })
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_summary(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_summary(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        writeln!(self.writer, "# Depshift Report")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Modules | {} |", summary.modules)?;
        writeln!(self.writer, "| Files scanned | {} |", summary.files_scanned)?;
        writeln!(self.writer, "| Applied | {} |", summary.counts.apply)?;
        writeln!(self.writer, "| Marked for review | {} |", summary.counts.mark)?;
        writeln!(self.writer, "| Skipped | {} |", summary.counts.skip)?;
        writeln!(self.writer, "| Files changed | {} |", summary.files_changed())?;
        writeln!(self.writer)?;

        for decision in &summary.decisions {
            if decision.outcomes.is_empty() {
                continue;
            }
            writeln!(self.writer, "## `{}`", decision.module)?;
            writeln!(self.writer)?;
            for planned in &decision.outcomes {
                writeln!(
                    self.writer,
                    "- **{}** `{}`: {}",
                    planned.topic,
                    relative(&summary.root, &planned.file).display(),
                    describe(planned)
                )?;
            }
            writeln!(self.writer)?;
        }

        if !summary.failures.is_empty() {
            writeln!(self.writer, "## Failures")?;
            writeln!(self.writer)?;
            for failure in &summary.failures {
                writeln!(
                    self.writer,
                    "- `{}` ({}): {}",
                    relative(&summary.root, &failure.path).display(),
                    failure.operation.as_str(),
                    failure.error
                )?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_summary(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        self.write_header(summary)?;
        self.write_decisions(summary)?;
        self.write_notes(summary)?;
        self.write_totals(summary)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> TerminalWriter<W> {
    fn write_header(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.writer, "{}", "Depshift Report".bold().blue())?;
        writeln!(self.writer, "{}", "===============".blue())?;
        if summary.dry_run {
            writeln!(self.writer, "{}", "(dry run: nothing written)".yellow())?;
        }
        writeln!(self.writer)
    }

    fn write_decisions(&mut self, summary: &RunSummary) -> io::Result<()> {
        for decision in &summary.decisions {
            writeln!(self.writer, "{}", decision.module.bold())?;
            for (name, verdict) in &decision.verdicts {
                writeln!(self.writer, "  {} {}", format!("{}:", name).dimmed(), verdict.describe())?;
            }
            for planned in &decision.outcomes {
                let tag = match &planned.outcome {
                    Outcome::Skip { .. } => "SKIP ".dimmed(),
                    Outcome::Mark { .. } => "MARK ".yellow(),
                    Outcome::Apply(_) => "APPLY".green(),
                };
                writeln!(
                    self.writer,
                    "  {} [{}] {}: {}",
                    tag,
                    planned.topic,
                    relative(&summary.root, &planned.file).display(),
                    describe(planned)
                )?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_notes(&mut self, summary: &RunSummary) -> io::Result<()> {
        if summary.notes.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Notes:".bold())?;
        for note in &summary.notes {
            writeln!(self.writer, "  {}", note)?;
        }
        writeln!(self.writer)
    }

    fn write_totals(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.writer, "{}", "Summary:".bold())?;
        writeln!(self.writer, "  Modules: {}", summary.modules)?;
        writeln!(self.writer, "  Files scanned: {}", summary.files_scanned)?;
        writeln!(
            self.writer,
            "  Outcomes: {} applied, {} marked, {} skipped",
            summary.counts.apply.to_string().green(),
            summary.counts.mark.to_string().yellow(),
            summary.counts.skip
        )?;
        let verb = if summary.dry_run { "would change" } else { "changed" };
        writeln!(self.writer, "  Files {}: {}", verb, summary.files_changed())?;
        if !summary.failures.is_empty() {
            writeln!(
                self.writer,
                "  {}",
                format!("{} file(s) could not be processed", summary.failures.len()).red()
            )?;
        }
        Ok(())
    }
}

/// One-line description of a planned outcome.
pub fn describe(planned: &PlannedOutcome) -> String {
    match &planned.outcome {
        Outcome::Skip { reason } => reason.clone(),
        Outcome::Mark { anchor, .. } => format!("review comment above {}", anchor.coordinate),
        Outcome::Apply(Action::Reorder { first, second, .. }) => {
            format!("move {} above {}", first, second)
        }
        Outcome::Apply(Action::RemoveManaged {
            coordinate,
            unused_properties,
            ..
        }) => {
            if unused_properties.is_empty() {
                format!("remove {}", coordinate)
            } else {
                format!(
                    "remove {} and unused properties {}",
                    coordinate,
                    unused_properties.join(", ")
                )
            }
        }
        Outcome::Apply(Action::InjectManaged { entry, before }) => match before {
            Some(anchor) => format!("add {} above {}", entry.coordinate, anchor),
            None => format!("add {}", entry.coordinate),
        },
        Outcome::Apply(Action::Generate { placement, .. }) => {
            format!("create {}", placement.qualified_name())
        }
    }
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
