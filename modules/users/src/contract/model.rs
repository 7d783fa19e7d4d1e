use chrono::{DateTime, Utc};

/// Pure user model for inter-module communication (no serde)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user. Shape is validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update data for a user; `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// The subset of this patch that would actually change `current`.
    pub fn effective_against(&self, current: &User) -> UserPatch {
        UserPatch {
            name: self.name.clone().filter(|n| *n != current.name),
            email: self.email.clone().filter(|e| *e != current.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> User {
        let now = Utc::now();
        User {
            id: 1,
            name: "Ann".into(),
            email: "ann@x.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn effective_patch_drops_unchanged_fields() {
        let patch = UserPatch {
            name: Some("Ann".into()),
            email: Some("ann@y.com".into()),
        };
        let effective = patch.effective_against(&ann());
        assert_eq!(effective.name, None);
        assert_eq!(effective.email.as_deref(), Some("ann@y.com"));
    }

    #[test]
    fn patch_equal_to_current_is_empty() {
        let patch = UserPatch {
            name: Some("Ann".into()),
            email: Some("ann@x.com".into()),
        };
        assert!(!patch.is_empty());
        assert!(patch.effective_against(&ann()).is_empty());
        assert!(UserPatch::default().is_empty());
    }
}
