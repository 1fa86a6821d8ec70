//! Capabilities the hosting environment lends to a batch run.
//!
//! The orchestrator never reaches for process-global CI state directly; it is
//! handed an [`ExecutionContext`] instead. Adapters live in
//! [`crate::infra::context`].

use std::{io, path::PathBuf};

pub trait ExecutionContext: Send + Sync {
    /// Short adapter name for diagnostics.
    fn name(&self) -> &'static str;

    /// Trimmed value of a named input; `None` when unset or blank.
    fn input(&self, name: &str) -> Option<String>;

    /// Workspace root suggested by the host, if any.
    fn workspace_hint(&self) -> Option<PathBuf>;

    fn start_group(&self, title: &str);

    fn end_group(&self);

    fn set_output(&self, name: &str, value: &str) -> io::Result<()>;

    /// Append rendered HTML to the host's run summary.
    fn write_summary(&self, html: &str) -> io::Result<()>;

    fn set_failed(&self, message: &str);
}

/// Log group that closes itself on every exit path.
pub struct LogGroup<'a> {
    context: &'a dyn ExecutionContext,
}

impl<'a> LogGroup<'a> {
    pub fn open(context: &'a dyn ExecutionContext, title: &str) -> Self {
        context.start_group(title);
        Self { context }
    }
}

impl Drop for LogGroup<'_> {
    fn drop(&mut self) {
        self.context.end_group();
    }
}
