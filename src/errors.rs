// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for pipeline operations

use std::cell::RefCell;
use thiserror::Error;

/// Errors that can occur while building or driving a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A fallible stage transform returned an error
    #[error("Stage '{stage}' failed: {message}")]
    TransformFailed {
        /// Stage that produced the error
        stage: &'static str,
        /// Error description
        message: String,
    },

    /// A stage closure panicked and was caught at the stage boundary
    #[error("Stage '{stage}' panicked: {message}")]
    TransformPanicked {
        /// Stage that panicked
        stage: &'static str,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The clock was asked to move backwards
    #[error("Clock cannot move backwards from {current} to {requested}")]
    ClockRegression {
        /// Time the clock is at
        current: i64,
        /// Time that was requested
        requested: i64,
    },

    /// Input polling failed
    #[error("Input source error: {0}")]
    SourceFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl PipelineError {
    /// Build a `TransformFailed` error from any displayable error
    pub fn transform(stage: &'static str, err: impl std::fmt::Display) -> Self {
        PipelineError::TransformFailed {
            stage,
            message: err.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

type ErrorHook = Box<dyn Fn(&PipelineError)>;

thread_local! {
    static UNHANDLED_HOOK: RefCell<Option<ErrorHook>> = const { RefCell::new(None) };
}

/// Replace the fallback handler for errors that reach a subscription
/// without an error callback.
///
/// The hook is per thread, like the pipeline itself.
pub fn set_unhandled_error_hook<F>(hook: F)
where
    F: Fn(&PipelineError) + 'static,
{
    UNHANDLED_HOOK.with(|slot| *slot.borrow_mut() = Some(Box::new(hook)));
}

/// Restore the default fallback handler (log and continue)
pub fn reset_unhandled_error_hook() {
    UNHANDLED_HOOK.with(|slot| *slot.borrow_mut() = None);
}

/// Route an error that no subscriber handled
pub(crate) fn report_unhandled(err: &PipelineError) {
    // Take the hook out while it runs so a hook that reports again does not
    // hit a borrowed RefCell.
    let hook = UNHANDLED_HOOK.with(|slot| slot.borrow_mut().take());
    match hook {
        Some(hook) => {
            hook(err);
            UNHANDLED_HOOK.with(|slot| {
                let mut slot = slot.borrow_mut();
                if slot.is_none() {
                    *slot = Some(hook);
                }
            });
        }
        None => tracing::error!(error = %err, "Unhandled pipeline error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_transform_error_display() {
        let err = PipelineError::transform("map", "bad payload");
        assert_eq!(err.to_string(), "Stage 'map' failed: bad payload");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: PipelineError = parse.unwrap_err().into();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }

    #[test]
    fn test_unhandled_hook_receives_error() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        set_unhandled_error_hook(move |e| sink.borrow_mut().push(e.clone()));

        report_unhandled(&PipelineError::SourceFailed("gone".into()));
        report_unhandled(&PipelineError::Configuration("bad".into()));
        reset_unhandled_error_hook();

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[0], PipelineError::SourceFailed("gone".into()));
    }

    #[test]
    fn test_default_hook_does_not_panic() {
        reset_unhandled_error_hook();
        report_unhandled(&PipelineError::Io("disk".into()));
    }
}
