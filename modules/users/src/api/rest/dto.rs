use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::problem::ValidationError;
use crate::config::UsersConfig;
use crate::contract::model::{NewUser, User, UserPatch};

// local@domain.tld, no whitespace, exactly one '@'
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserReq {
    pub name: String,
    pub email: String,
}

/// REST DTO for updating a user (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserReq {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CreateUserReq {
    /// Shape checks; every failing field is reported.
    pub fn validate(&self, cfg: &UsersConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_name(&self.name, cfg, &mut errors);
        check_email(&self.email, cfg, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl UpdateUserReq {
    /// Same rules as for create, applied to the fields that are present.
    pub fn validate(&self, cfg: &UsersConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Some(ref name) = self.name {
            check_name(name, cfg, &mut errors);
        }
        if let Some(ref email) = self.email {
            check_email(email, cfg, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_name(name: &str, cfg: &UsersConfig, errors: &mut Vec<ValidationError>) {
    if name.trim().is_empty() {
        errors.push(ValidationError::new("/name", "Name cannot be empty"));
        return;
    }
    let len = name.chars().count();
    if len > cfg.max_name_length {
        errors.push(ValidationError::new(
            "/name",
            format!(
                "Name too long: {len} characters (max: {})",
                cfg.max_name_length
            ),
        ));
    }
}

fn check_email(email: &str, cfg: &UsersConfig, errors: &mut Vec<ValidationError>) {
    let len = email.chars().count();
    if len > cfg.max_email_length {
        errors.push(ValidationError::new(
            "/email",
            format!(
                "Email too long: {len} characters (max: {})",
                cfg.max_email_length
            ),
        ));
    } else if !EMAIL_RE.is_match(email) {
        errors.push(ValidationError::new(
            "/email",
            format!("Invalid email format: '{email}'"),
        ));
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
        }
    }
}

impl From<UpdateUserReq> for UserPatch {
    fn from(req: UpdateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
        }
    }
}
