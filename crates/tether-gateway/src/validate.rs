//! Request validation.
//!
//! The resolver trusts its inputs; everything a client can get wrong is
//! rejected here with [`AppError::Validation`].

use tether_core::ShortCode;
use tether_resolver::CreateLink;
use url::Url;

use crate::error::{AppError, Result};
use crate::model::CreateUrlRequest;

pub const MIN_CUSTOM_CODE_LEN: usize = 4;
pub const MAX_CUSTOM_CODE_LEN: usize = 10;
/// One year.
pub const MAX_DURATION_HOURS: i64 = 8760;

/// Checks a create request and converts it into resolver parameters.
///
/// An empty `custom_code` is treated as absent.
pub fn create_link(request: CreateUrlRequest) -> Result<CreateLink> {
    validate_url(&request.original_url)?;

    let custom_code = match request.custom_code.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(custom_code(raw)?),
    };
    let duration_hours = request.duration.map(duration_hours).transpose()?;

    Ok(CreateLink {
        original_url: request.original_url,
        custom_code,
        duration_hours,
    })
}

pub fn validate_url(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(AppError::Validation("original_url is required".to_string()));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("original_url is not a valid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "original_url scheme must be http or https, got '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::Validation(
            "original_url must include a host".to_string(),
        ));
    }
    Ok(())
}

pub fn custom_code(raw: &str) -> Result<ShortCode> {
    let len = raw.len();
    if !(MIN_CUSTOM_CODE_LEN..=MAX_CUSTOM_CODE_LEN).contains(&len)
        || !raw.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(AppError::Validation(format!(
            "custom_code must be {MIN_CUSTOM_CODE_LEN} to {MAX_CUSTOM_CODE_LEN} ASCII letters or digits"
        )));
    }
    ShortCode::new(raw).map_err(|e| AppError::Validation(e.to_string()))
}

pub fn duration_hours(hours: i64) -> Result<u32> {
    if !(0..=MAX_DURATION_HOURS).contains(&hours) {
        return Err(AppError::Validation(format!(
            "duration must be between 0 and {MAX_DURATION_HOURS} hours"
        )));
    }
    u32::try_from(hours).map_err(|e| AppError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, code: Option<&str>, duration: Option<i64>) -> CreateUrlRequest {
        CreateUrlRequest {
            original_url: url.to_string(),
            custom_code: code.map(str::to_string),
            duration,
        }
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("https://example.com/a?b=c").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
    }

    #[test]
    fn rejects_bad_urls() {
        for raw in ["", "not-a-url", "ftp://example.com", "mailto:a@b.c", "https://"] {
            assert!(
                matches!(validate_url(raw), Err(AppError::Validation(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn custom_code_bounds() {
        assert!(custom_code("abcd").is_ok());
        assert!(custom_code("Promo12345").is_ok());
        assert!(custom_code("abc").is_err());
        assert!(custom_code("abcdefghijk").is_err());
        assert!(custom_code("ab-cd").is_err());
        assert!(custom_code("ab cd").is_err());
    }

    #[test]
    fn duration_bounds() {
        assert_eq!(duration_hours(0).unwrap(), 0);
        assert_eq!(duration_hours(8760).unwrap(), 8760);
        assert!(duration_hours(-1).is_err());
        assert!(duration_hours(8761).is_err());
    }

    #[test]
    fn builds_resolver_parameters() {
        let create = create_link(request("https://x.test", Some("promo1"), Some(2))).unwrap();

        assert_eq!(create.original_url, "https://x.test");
        assert_eq!(create.custom_code.unwrap().as_str(), "promo1");
        assert_eq!(create.duration_hours, Some(2));
    }

    #[test]
    fn empty_custom_code_means_generated() {
        let create = create_link(request("https://x.test", Some(""), None)).unwrap();

        assert!(create.custom_code.is_none());
        assert!(create.duration_hours.is_none());
    }
}
