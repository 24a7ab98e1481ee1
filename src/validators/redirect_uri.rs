use async_trait::async_trait;
use tracing::warn;

use crate::error::{ErrorCode, RequestError};

use super::{ContextValidator, ValidationContext};

/// Requires the request's `redirect_uri` to match one of the client's
/// registered URIs. Scheme and authority compare case-insensitively, path
/// and query byte-for-byte, and fragments are ignored entirely.
pub struct RedirectUriValidator;

/// Split a URI into its case-insensitive prefix (scheme + authority, both
/// lowercased) and its case-sensitive remainder, dropping any fragment.
fn split_uri(uri: &str) -> (String, &str) {
    let uri = match uri.find('#') {
        Some(idx) => &uri[..idx],
        None => uri,
    };

    match uri.find("://") {
        Some(scheme_end) => {
            let rest = &uri[scheme_end + 3..];
            let authority_end = rest
                .find(|c| c == '/' || c == '?')
                .unwrap_or(rest.len());
            let prefix = format!(
                "{}://{}",
                uri[..scheme_end].to_ascii_lowercase(),
                rest[..authority_end].to_ascii_lowercase()
            );
            (prefix, &rest[authority_end..])
        }
        None => (String::new(), uri),
    }
}

pub(crate) fn redirect_uri_matches(registered: &str, requested: &str) -> bool {
    split_uri(registered) == split_uri(requested)
}

#[async_trait]
impl ContextValidator for RedirectUriValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let client = context.client_info().clone();

        let redirect_uri = match context.request.redirect_uri.as_deref() {
            Some(uri) if !uri.is_empty() => uri,
            _ => {
                return Some(RequestError::new(
                    ErrorCode::InvalidRequest,
                    "redirect_uri is required",
                ))
            }
        };

        if client.redirect_uris.is_empty() {
            return Some(RequestError::new(
                ErrorCode::InvalidRequest,
                "the client has no registered redirect URIs",
            ));
        }

        if !client
            .redirect_uris
            .iter()
            .any(|registered| redirect_uri_matches(registered, redirect_uri))
        {
            warn!(
                client_id = %client.client_id,
                %redirect_uri,
                "redirect_uri does not match any registered URI"
            );
            return Some(RequestError::new(
                ErrorCode::InvalidRequest,
                "redirect_uri does not match any registered URI",
            ));
        }

        context.set_valid_redirect_uri(redirect_uri.to_string());
        None
    }
}
