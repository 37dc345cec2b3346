//! Error types.

use thiserror::Error;

/// Errors raised by the portal core itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// Ambient handle lookup ran outside every entry's render scope.
    ///
    /// This is a programming error in the calling component: the lookup only
    /// works from content passed to `show`.
    #[error("no enclosing portal entry for registry `{registry}`: current_handle() must be called while rendering content passed to show()")]
    MissingContext { registry: String },

    /// Ambient handle lookup found an entry, but its handle was created with
    /// different type parameters.
    #[error("enclosing portal entry holds a handle of type `{found}`, not `{expected}`")]
    HandleTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Failure of the lookup that returns the enclosing handle.
///
/// Kept as its own name because it is what presentation code matches on.
pub type MissingContextError = PortalError;

/// The outcome error observed by whoever awaits a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError<E> {
    /// The handle was rejected; carries the value passed to `reject`.
    #[error("portal entry rejected: {0}")]
    Rejected(E),

    /// Every handle and the registry entry went away without settling.
    #[error("portal entry dropped before it settled")]
    Abandoned,
}

impl<E> HandleError<E> {
    /// The rejection value, if this is a rejection.
    pub fn rejection(&self) -> Option<&E> {
        match self {
            Self::Rejected(error) => Some(error),
            Self::Abandoned => None,
        }
    }

    /// Consume the error and return the rejection value, if any.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            Self::Rejected(error) => Some(error),
            Self::Abandoned => None,
        }
    }
}

/// Default rejection type for handles that do not pick their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The caller gave up on the entry.
    #[error("cancelled")]
    Cancelled,

    /// The user closed the entry without choosing a result.
    #[error("dismissed")]
    Dismissed,

    /// Application-specific reason.
    #[error("{0}")]
    Message(String),
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_names_the_registry() {
        let error = PortalError::MissingContext {
            registry: "toasts".to_string(),
        };
        assert!(error.to_string().contains("`toasts`"));
    }

    #[test]
    fn handle_error_exposes_rejection() {
        let error: HandleError<Rejection> = HandleError::Rejected("nope".into());
        assert_eq!(error.rejection(), Some(&Rejection::Message("nope".into())));
        assert_eq!(error.to_string(), "portal entry rejected: nope");

        let abandoned: HandleError<Rejection> = HandleError::Abandoned;
        assert!(abandoned.into_rejection().is_none());
    }
}
