// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes for sync views and notices.

use serde::Serialize;
use std::time::Instant;

use crate::reconcile::SyncHealth;
use crate::supervisor::{SyncNotice, SyncPhase, SyncView};
use crate::types::ActionKind;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// One-line digest of a view. Two views with the same digest print the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLine {
    pub phase: SyncPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    pub pending: Vec<ActionKind>,
    pub streaming: bool,
    pub health: SyncHealth,
}

impl ViewLine {
    pub fn from_view(view: &SyncView) -> Self {
        let snapshot = view.snapshot.as_ref();
        Self {
            phase: view.phase,
            resource: view.target.as_ref().map(ToString::to_string),
            resource_status: snapshot.and_then(|s| s.resource.status.clone()),
            deploy: view
                .latest_deploy()
                .map(|d| format!("{} {}", d.id, d.status)),
            rules: view
                .latest_rule_deploy()
                .map(|d| format!("{} {}", d.id, d.status)),
            pending: view.pending.iter().map(|a| a.kind).collect(),
            streaming: view.streaming,
            // Timestamps change on every sync; keep them out of the digest.
            health: SyncHealth {
                last_sync_at: None,
                ..view.health.clone()
            },
        }
    }

    fn render(&self) -> String {
        let mut line = format!("[{}]", self.phase);
        if let Some(resource) = &self.resource {
            line.push_str(&format!(" {resource}"));
        }
        if let Some(status) = &self.resource_status {
            line.push_str(&format!(" ({status})"));
        }
        if let Some(deploy) = &self.deploy {
            line.push_str(&format!(" deploy {deploy}"));
        }
        if let Some(rules) = &self.rules {
            line.push_str(&format!(" rules {rules}"));
        }
        for kind in &self.pending {
            line.push_str(&format!(" {kind}: awaiting confirmation"));
        }
        line.push_str(if self.streaming { " live" } else { " polling" });
        if let Some(error) = &self.health.last_error {
            line.push_str(&format!(" sync delayed: {error}"));
        }
        line
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
    last_line: Option<ViewLine>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
            last_line: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a view if it differs from the last one printed. Returns whether
    /// anything was printed.
    pub fn view(&mut self, view: &SyncView) -> bool {
        let line = ViewLine::from_view(view);
        if self.last_line.as_ref() == Some(&line) {
            return false;
        }

        match self.mode {
            OutputMode::Normal => println!("{}", line.render()),
            // Quiet mode only reports phase transitions.
            OutputMode::Quiet => {
                if self.last_line.as_ref().map(|l| l.phase) != Some(line.phase) {
                    println!("{}", line.phase);
                }
            }
            OutputMode::Json => {
                let event = JsonView {
                    event: "view",
                    view: &line,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
        self.last_line = Some(line);
        true
    }

    /// Print a supervisor notice.
    pub fn notice(&self, notice: &SyncNotice) {
        let message = match notice {
            SyncNotice::Failure { error, .. } => error.to_string(),
            SyncNotice::ResourceDeleted { target } => format!("{target} was deleted"),
        };
        match notice {
            SyncNotice::Failure { .. } => self.warning(&message),
            SyncNotice::ResourceDeleted { .. } => self.error(&message),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => self.json_line("success", message, false),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.json_line("warning", message, true),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => self.json_line("error", message, true),
        }
    }

    fn json_line(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: if self.start_time.is_some() {
                Some(self.elapsed_secs())
            } else {
                None
            },
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonView<'a> {
    event: &'a str,
    view: &'a ViewLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_view_renders_phase_only() {
        let line = ViewLine::from_view(&SyncView::default());
        assert_eq!(line.render(), "[idle] polling");
    }

    #[test]
    fn identical_views_print_once() {
        let mut output = Output::new(OutputMode::Quiet);
        let view = SyncView::default();
        assert!(output.view(&view));
        assert!(!output.view(&view));
    }
}
