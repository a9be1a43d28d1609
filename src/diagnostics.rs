// ABOUTME: Diagnostics accumulator for non-fatal anomalies found while reconciling.
// ABOUTME: Collects warnings that shouldn't fail a sync but should be visible to operators.

/// Collects non-fatal warnings during reconciliation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during reconciliation.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A status string outside the known vocabulary.
    pub fn status_drift(status: &str) -> Self {
        Self {
            kind: WarningKind::StatusDrift,
            message: format!(
                "unrecognized status '{status}' (treated as neither live nor terminal)"
            ),
        }
    }

    /// A sub-entity belonging to a different resource than its snapshot.
    pub fn foreign_entity(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ForeignEntity,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Server sent a status the classifier doesn't know.
    StatusDrift,
    /// Snapshot contained an entity owned by another resource; it was dropped.
    ForeignEntity,
}
