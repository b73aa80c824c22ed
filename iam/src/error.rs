use crate::http::error::{Error as HttpError, ErrorResponse};

pub const NOT_FOUND: u16 = 404;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("getting service account policy: {0}")]
    GetPolicy(#[source] HttpError),

    #[error("setting service account policy: {0}")]
    SetPolicy(#[source] HttpError),

    #[error("getting service account: {0}")]
    GetServiceAccount(#[source] HttpError),
}

impl Error {
    /// The remote error this operation failed with.
    pub fn remote(&self) -> &HttpError {
        match self {
            Error::GetPolicy(e) | Error::SetPolicy(e) | Error::GetServiceAccount(e) => e,
        }
    }
}

/// Walks the `source()` chain of `err` and reports whether the first remote API error found carries `code`.
///
/// Errors that never wrap a remote API error yield `false`.
pub fn is_api_error_with_code(err: &(dyn std::error::Error + 'static), code: u16) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(status) = status_code(e) {
            return status == code;
        }
        current = e.source();
    }
    false
}

pub fn is_not_found(err: &(dyn std::error::Error + 'static)) -> bool {
    is_api_error_with_code(err, NOT_FOUND)
}

fn status_code(err: &(dyn std::error::Error + 'static)) -> Option<u16> {
    if let Some(response) = err.downcast_ref::<ErrorResponse>() {
        return Some(response.code);
    }
    // `HttpError::Response` is transparent, so the response never shows up as its own link in the chain.
    match err.downcast_ref::<HttpError>()? {
        HttpError::Response(response) => Some(response.code),
        HttpError::HttpClient(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    }
}
