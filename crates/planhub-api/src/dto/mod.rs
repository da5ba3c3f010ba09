//! Request and response bodies.

pub mod request;
pub mod response;

use validator::Validate;

use planhub_core::error::AppError;

/// Run `validator` rules and flatten failures into one validation error.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                format!("{field}: {reason}")
            })
            .collect();
        fields.sort();
        AppError::validation(fields.join("; "))
    })
}
