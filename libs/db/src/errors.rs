//! Store error classification shared by repositories.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// SQLite extended result codes for uniqueness failures:
/// `SQLITE_CONSTRAINT_UNIQUE` (2067) and `SQLITE_CONSTRAINT_PRIMARYKEY` (1555).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "2067" | "1555")
}

/// True when the store rejected a write because of a UNIQUE or PRIMARY KEY constraint.
pub fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => db
            .code()
            .map(|c| is_unique_violation_code(c.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}
