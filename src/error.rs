use crate::outcome::NavigationOutcome;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dom error: {0}")]
    Dom(String),

    #[error("assertion failed: {message} (expected {expected}, actual {actual})")]
    AssertionFailed {
        expected: String,
        actual: String,
        message: String,
    },

    #[error("test \"{description}\" timed out after {timeout_ms}ms without an outcome")]
    Timeout { description: String, timeout_ms: i64 },

    #[error("conflicting navigation outcomes: {first} was followed by {second}")]
    ConflictingOutcomes {
        first: NavigationOutcome,
        second: NavigationOutcome,
    },

    #[error("task queue exceeded max steps: limit={limit}, now_ms={now_ms}, pending_tasks={pending}")]
    TaskStepLimit {
        limit: usize,
        now_ms: i64,
        pending: usize,
    },

    #[error("spec error at {path}: {message}")]
    ScenarioSpec { path: String, message: String },

    #[error("json parse error at line {line} column {column}: {message}\n{snippet}")]
    Json {
        message: String,
        line: usize,
        column: usize,
        snippet: String,
    },

    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn spec(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScenarioSpec {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
