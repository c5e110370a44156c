use thiserror::Error;
use ulid::Ulid;

#[derive(Debug, Error)]
pub enum CallerError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Caller may not perform: {action}")]
    Forbidden { action: String },
}

impl CallerError {
    pub fn unauthorized(reason: Option<String>) -> Self {
        Self::Unauthorized {
            reason: reason.unwrap_or_else(|| "No reason provided".to_string()),
        }
    }

    pub fn forbidden(action: &str) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }
}

/// The principal a request or command runs as.
///
/// Stores take a `Caller` on every operation and derive ownership scoping
/// from it: a `User` only ever sees rows it owns, `System` is reserved for
/// operator tooling and token resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    User {
        id: Ulid,
        display_name: String,
        email: String,
    },
    System,
}

impl Caller {
    #[tracing::instrument(skip(self))]
    pub fn is_system(&self) -> bool {
        matches!(self, Caller::System)
    }

    /// The id of the user behind this caller, if any.
    pub fn user_id(&self) -> Option<Ulid> {
        match self {
            Caller::User { id, .. } => Some(*id),
            Caller::System => None,
        }
    }

    /// Like [`Caller::user_id`], but fails for non-user callers.
    #[tracing::instrument(skip(self))]
    pub fn require_user(&self) -> Result<Ulid, CallerError> {
        self.user_id()
            .ok_or_else(|| CallerError::forbidden("act on behalf of a user"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user() -> Caller {
        Caller::User {
            id: Ulid::new(),
            display_name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn system_caller_has_no_user_id() {
        let caller = Caller::System;
        assert!(caller.is_system());
        assert_eq!(caller.user_id(), None);
    }

    #[test]
    fn user_caller_exposes_its_id() {
        let caller = user();
        assert!(!caller.is_system());
        assert!(caller.user_id().is_some());
    }

    #[test]
    fn require_user_fails_for_system() {
        let err = Caller::System.require_user().unwrap_err();
        assert!(matches!(err, CallerError::Forbidden { .. }));
    }

    #[test]
    fn require_user_succeeds_for_user() {
        let caller = user();
        assert_eq!(caller.require_user().unwrap(), caller.user_id().unwrap());
    }

    #[test]
    fn unauthorized_defaults_reason() {
        match CallerError::unauthorized(None) {
            CallerError::Unauthorized { reason } => assert_eq!(reason, "No reason provided"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
