//! Field rules shared by the resource services. Every check runs before any
//! repository call, so a rejected request never touches storage.

use crate::error::{ServiceError, ServiceResult};

/// Minimum post body length, counted in characters rather than bytes.
pub const MIN_POST_CONTENT_LEN: usize = 10;

pub fn require_non_blank(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn require_min_len(field: &str, value: &str, min: usize) -> ServiceResult<()> {
    if value.chars().count() < min {
        return Err(ServiceError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

pub fn validate_post_fields(title: &str, content: &str) -> ServiceResult<()> {
    require_non_blank("title", title)?;
    require_min_len("content", content, MIN_POST_CONTENT_LEN)
}
