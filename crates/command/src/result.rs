/// Where a command is in its single execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    /// Not dispatched yet.
    #[default]
    Pending,
    Dispatching,
    Succeeded,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Outcome of a command, read through accessors after `execute`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    executed: bool,
    error: String,
    state: ExecutionState,
}

impl ExecutionResult {
    /// Captured standard output, trimmed.
    pub fn output(&self) -> &str {
        self.stdout.trim()
    }

    /// Captured standard error, trimmed.
    pub fn stderr(&self) -> &str {
        self.stderr.trim()
    }

    /// Last error message; empty when none was recorded.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.error = message.into();
    }

    pub(crate) fn begin(&mut self) {
        self.state = ExecutionState::Dispatching;
    }

    pub(crate) fn succeed(&mut self) {
        self.executed = true;
        self.state = ExecutionState::Succeeded;
    }

    pub(crate) fn fail(&mut self) {
        self.executed = false;
        self.state = ExecutionState::Failed;
    }
}
