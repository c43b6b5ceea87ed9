//! Console reporters.
//!
//! [`TextReporter`] prints the human-readable trace. Within a step the engine
//! emits the outcome before the deadlock check and the snapshot; the text
//! layout wants the snapshot first, so the two lines are held back until the
//! snapshot arrives. [`JsonReporter`] writes one JSON object per event.
//!
//! `Reporter::report` cannot fail, so both reporters keep the first write
//! error and hand it back from `finish`.

use crate::error::CliError;
use permalloc_core::event::{Event, Reporter};
use permalloc_core::id::{ProcessId, ResourceId};
use permalloc_core::snapshot::GraphSnapshot;
use std::io::{self, Write};

/// Write the `CURRENT SYSTEM STATE` block for `snapshot`.
pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &GraphSnapshot) -> io::Result<()> {
    writeln!(out, "CURRENT SYSTEM STATE:")?;
    let resources: Vec<String> = snapshot
        .resources
        .iter()
        .map(|r| {
            let state = if r.allocated { "allocated" } else { "available" };
            format!("{}({state})", r.id)
        })
        .collect();
    writeln!(out, "Resources: {}", resources.join(", "))?;
    let processes: Vec<String> = snapshot
        .processes
        .iter()
        .map(|p| {
            let state = if p.completed { "completed" } else { "pending" };
            format!("{}({state})", p.id)
        })
        .collect();
    writeln!(out, "Processes: {}", processes.join(", "))?;
    writeln!(out, "Connections:")?;
    for edge in &snapshot.edges {
        writeln!(out, "  {} -> {} ({})", edge.from, edge.to, edge.status)?;
    }
    Ok(())
}

fn join_resources(resources: &[ResourceId]) -> String {
    resources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn outcome_line(process: ProcessId, acquired: Option<&[ResourceId]>) -> String {
    match acquired {
        Some(acquired) => format!(
            "{process} COMPLETED PERMANENTLY USING RESOURCES: {}",
            join_resources(acquired)
        ),
        None => format!("{process} BLOCKED - REQUIRED RESOURCES UNAVAILABLE"),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

pub struct TextReporter<W: Write> {
    out: W,
    deadlock_line: Option<&'static str>,
    outcome_line: Option<String>,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            deadlock_line: None,
            outcome_line: None,
            error: None,
        }
    }

    /// Flush and return the writer, or the first write error.
    pub fn finish(mut self) -> Result<W, CliError> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn render(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::InitialState { snapshot } => {
                writeln!(self.out)?;
                writeln!(self.out, "INITIAL RESOURCE GRAPH STATE:")?;
                write_snapshot(&mut self.out, snapshot)?;
                writeln!(self.out)?;
                writeln!(self.out, "Starting simulation...")?;
                writeln!(self.out)?;
            }
            Event::StepStarted { step, process } => {
                writeln!(self.out, "=== STEP {step}: EXECUTING PROCESS {process} ===")?;
            }
            Event::ProcessCompleted {
                process, acquired, ..
            } => {
                self.outcome_line = Some(outcome_line(*process, Some(acquired)));
            }
            Event::ProcessBlocked { process, .. } => {
                self.outcome_line = Some(outcome_line(*process, None));
            }
            Event::DeadlockChecked { report, .. } => {
                self.deadlock_line = Some(if report.deadlocked {
                    "DEADLOCK DETECTED: Circular wait condition exists"
                } else {
                    "No deadlock condition detected"
                });
            }
            Event::StateSnapshot { snapshot, .. } => {
                write_snapshot(&mut self.out, snapshot)?;
                if let Some(line) = self.deadlock_line.take() {
                    writeln!(self.out, "{line}")?;
                }
                if let Some(line) = self.outcome_line.take() {
                    writeln!(self.out, "{line}")?;
                }
                writeln!(self.out)?;
            }
            Event::PassFinished { summary } => {
                writeln!(
                    self.out,
                    "SIMULATION COMPLETE: {} completed, {} blocked, {} deadlocked step(s)",
                    summary.completed.len(),
                    summary.blocked.len(),
                    summary.deadlocked_steps
                )?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, event: &Event) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.render(event) {
            self.error = Some(err);
        }
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

pub struct JsonReporter<W: Write> {
    out: W,
    error: Option<CliError>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(mut self) -> Result<W, CliError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn render(&mut self, event: &Event) -> Result<(), CliError> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, event: &Event) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.render(event) {
            self.error = Some(err);
        }
    }
}
