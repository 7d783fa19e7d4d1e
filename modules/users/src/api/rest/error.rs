use axum::http::StatusCode;

use crate::api::problem::{Problem, ProblemResponse, ValidationError};
use crate::domain::error::DomainError;

/// Build a ProblemResponse tagged with the current span id.
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::for_code(status, code, title, detail).with_instance(instance);

    let problem = match tracing::Span::current().id() {
        Some(id) => problem.with_span_id(id.into_u64().to_string()),
        None => problem,
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::CONFLICT,
            "USERS_EMAIL_CONFLICT",
            "Email already exists",
            format!("Email '{}' is already in use", email),
            instance,
        ),
        DomainError::Store(_) => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}

/// Shape-validation failures, one entry per offending field.
pub fn validation_problem(errors: Vec<ValidationError>, instance: &str) -> ProblemResponse {
    let ProblemResponse(problem) = from_parts(
        StatusCode::UNPROCESSABLE_ENTITY,
        "USERS_VALIDATION",
        "Validation error",
        "Request failed validation",
        instance,
    );
    ProblemResponse(problem.with_errors(errors))
}
