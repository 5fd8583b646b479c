//! Error types and the error-reporting seam.

use std::backtrace::Backtrace;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::applier::PrimitiveId;
use crate::element::Lifecycle;

/// Failures of the primitive store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("primitive {id} missing")]
    Missing { id: PrimitiveId },
    #[error("primitive {id} type mismatch; expected {expected}")]
    TypeMismatch {
        id: PrimitiveId,
        expected: &'static str,
    },
}

/// Contract violations and pass-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("build_scope called while another build scope is open")]
    ReentrantBuildScope,
    #[error("{element} is defunct")]
    ElementDefunct { element: String },
    #[error("{element} was marked dirty while building {target}, but is not {target} or one of its descendants")]
    RebuildOutsideBuildTarget { element: String, target: String },
    #[error("{element} was marked dirty while the owner state is locked")]
    StateLocked { element: String },
    #[error("{current} cannot be updated in place to {new}")]
    IncompatibleUpdate { current: String, new: String },
    #[error("{element} is {actual:?}; expected {expected:?}")]
    InvalidLifecycle {
        element: String,
        expected: Lifecycle,
        actual: Lifecycle,
    },
    #[error("multiple active elements share a global key: {}", .keys.join(", "))]
    DuplicateGlobalKeys { keys: Vec<String> },
    #[error("{count} element(s) were still dirty after the build pass")]
    DirtyElementsMissed { count: usize },
    #[error("{element} at depth {depth} became dirty while building depth {building}")]
    MalformedPass {
        element: String,
        depth: usize,
        building: usize,
    },
    #[error("{element} does not belong to this build owner")]
    OutOfBuildScope { element: String },
    #[error("{key} cannot be grafted into its own subtree")]
    GraftIntoDescendant { key: String },
    #[error("state is already borrowed")]
    StateBusy,
    #[error(transparent)]
    Primitive(#[from] NodeError),
}

/// Failure raised by user code while deriving a subtree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{0}")]
    Message(String),
    #[error("build panicked: {0}")]
    Panicked(String),
    #[error("{element} was disposed while still holding `{label}`")]
    LeakedResource { element: String, label: String },
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl BuildError {
    pub fn msg(message: impl Into<String>) -> Self {
        BuildError::Message(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        BuildError::Panicked(message)
    }
}

/// Everything the reporter learns about a contained failure.
#[derive(Clone)]
pub struct ErrorDetails {
    pub context: String,
    pub error: Rc<BuildError>,
    pub backtrace: String,
}

impl ErrorDetails {
    pub fn new(context: impl Into<String>, error: BuildError) -> Self {
        Self {
            context: context.into(),
            error: Rc::new(error),
            backtrace: Backtrace::capture().to_string(),
        }
    }
}

impl fmt::Debug for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDetails")
            .field("context", &self.context)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.error)
    }
}

/// Receives failures contained at element boundaries.
pub trait ErrorReporter {
    fn report(&self, details: &ErrorDetails);
}

/// Reporter that forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, details: &ErrorDetails) {
        log::error!("{}: {}", details.context, details.error);
        if !details.backtrace.is_empty() && details.backtrace != "disabled backtrace" {
            log::debug!("{}", details.backtrace);
        }
    }
}

/// Applies the contract-violation policy: panic when `strict`, otherwise log
/// and hand the error back to the caller.
pub(crate) fn violation(strict: bool, error: TreeError) -> TreeError {
    if strict {
        panic!("{error}");
    }
    log::warn!("{error}");
    error
}
