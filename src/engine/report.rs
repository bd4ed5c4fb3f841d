//! Per-stage outcome of every patch the engine tried

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::patch::PatchError;

/// Lifecycle stage the host is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Once per boot, before app processes exist
    ProcessBootstrap,
    /// A package's resource table is being built
    ResourceInit,
    /// A package's code was loaded into a process
    CodeLoad,
}
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProcessBootstrap => "process bootstrap",
            Self::ResourceInit => "resource init",
            Self::CodeLoad => "code load",
        })
    }
}

/// What a [`ReportEntry`] is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A hack's stage hook
    Hack,
    /// A variant probe, or the forced variant
    Variant,
    /// Loading a bundle or registering a resource
    Resource,
    /// The failsafe fallback
    Fallback,
    /// The module reporting itself active
    SelfPatch,
}

/// One attempt and how it went
#[derive(Debug)]
pub struct ReportEntry {
    /// Kind of attempt
    pub kind: EntryKind,
    /// Name of the hack, variant or resource
    pub name: &'static str,
    /// `Ok` if it applied
    pub outcome: Result<(), PatchError>,
}

/// Everything attempted during one stage invocation, in order
#[derive(Debug)]
pub struct StageReport {
    /// Stage the report is for
    pub stage: Stage,
    /// Attempts, in the order they were made
    entries: Vec<ReportEntry>,
}

impl StageReport {
    /// Creates an empty report
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            entries: Vec::new(),
        }
    }

    /// Records an attempt
    pub fn record(&mut self, kind: EntryKind, name: &'static str, outcome: Result<(), PatchError>) {
        self.entries.push(ReportEntry { kind, name, outcome });
    }

    /// All attempts
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Whether nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the attempts of `kind` that applied
    pub fn applied(&self, kind: EntryKind) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.outcome.is_ok())
            .map(|e| e.name)
            .collect()
    }

    /// Attempts that failed
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }
}

/// Runs `f`, turning a panic into [`PatchError::Panicked`]
pub(crate) fn isolate<F>(f: F) -> Result<(), PatchError>
where
    F: FnOnce() -> Result<(), PatchError>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(PatchError::Panicked(panic_message(payload.as_ref()))))
}

/// Message of a panic payload, if it carried one
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}
