use crate::BatchSpec;

/// Lifecycle of a batch task: `Pending -> Running -> Succeeded | Failed`.
///
/// There are no retries. `Succeeded` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Admitted but not yet started.
    Pending,
    /// Generating records or waiting on the writer.
    Running,
    /// Written; its records were added to the job progress.
    Succeeded,
    /// The writer reported an error or the task panicked.
    Failed,
}

impl BatchStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A batch in flight, tracking its own [`BatchStatus`].
#[derive(Debug)]
pub(crate) struct BatchTask {
    spec: BatchSpec,
    status: BatchStatus,
}

impl BatchTask {
    pub(crate) const fn new(spec: BatchSpec) -> Self {
        Self {
            spec,
            status: BatchStatus::Pending,
        }
    }

    pub(crate) const fn spec(&self) -> BatchSpec {
        self.spec
    }

    pub(crate) const fn status(&self) -> BatchStatus {
        self.status
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.status(), BatchStatus::Pending);
        self.status = BatchStatus::Running;
    }

    pub(crate) fn finish(&mut self, succeeded: bool) -> BatchStatus {
        debug_assert!(!self.status().is_terminal(), "batch finished twice");
        debug_assert_eq!(self.status(), BatchStatus::Running);
        self.status = if succeeded {
            BatchStatus::Succeeded
        } else {
            BatchStatus::Failed
        };
        self.status
    }
}
