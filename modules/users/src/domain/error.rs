use thiserror::Error;

use crate::domain::repo::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    /// Store fault, passed through unmodified.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Coarse classification for callers that switch on outcome, not on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Store,
}

impl DomainError {
    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound { .. } => ErrorKind::NotFound,
            Self::EmailAlreadyExists { .. } => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail { email } => Self::EmailAlreadyExists { email },
            RepoError::Store(e) => Self::Store(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(DomainError::user_not_found(7).kind(), ErrorKind::NotFound);
        assert_eq!(
            DomainError::email_already_exists("a@b.co").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::Store(anyhow::anyhow!("disk I/O error")).kind(),
            ErrorKind::Store
        );
    }

    #[test]
    fn repo_errors_convert_by_kind() {
        let dup: DomainError = RepoError::DuplicateEmail {
            email: "ann@x.com".into(),
        }
        .into();
        assert!(matches!(dup, DomainError::EmailAlreadyExists { ref email } if email == "ann@x.com"));

        let store: DomainError = RepoError::Store(anyhow::anyhow!("database is locked")).into();
        assert_eq!(store.kind(), ErrorKind::Store);
        assert_eq!(store.to_string(), "database is locked");
    }
}
