use serde::Serialize;

/// Which in-flight operation a recovery token belongs to, so the caller can
/// resume the right one after the consent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModificationIntent {
    Update,
    Delete,
}

/// Opaque capability embedded in a recoverable authorization denial. Only
/// the media index that issued it can interpret the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentHandle(i64);

impl ConsentHandle {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// A denied mutation that can be retried once the user grants consent.
/// Never persisted; lives for a single user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryToken {
    handle: ConsentHandle,
    intent: ModificationIntent,
}

impl RecoveryToken {
    pub fn new(handle: ConsentHandle, intent: ModificationIntent) -> Self {
        Self { handle, intent }
    }

    pub fn handle(&self) -> ConsentHandle {
        self.handle
    }

    pub fn intent(&self) -> ModificationIntent {
        self.intent
    }
}

/// Result of a single update or delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Completed,
    RecoveryRequired(RecoveryToken),
}

/// Terminal result after the consent step has been played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationReport {
    Completed,
    Denied(ModificationIntent),
}
