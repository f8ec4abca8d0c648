//! Reading the proof token out of submitted form data.
//!
//! Request parsing belongs to the embedding framework; these helpers only pick the one
//! field the widget writes.

use std::collections::HashMap;

/// Form field the Turnstile widget fills with the proof token.
pub const RESPONSE_FIELD: &str = "cf-turnstile-response";

/// Token from already-parsed form fields. Empty values count as absent.
pub fn token_from_fields<S>(fields: &HashMap<String, String, S>) -> Option<&str>
where
    S: std::hash::BuildHasher,
{
    fields
        .get(RESPONSE_FIELD)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Token from a raw `application/x-www-form-urlencoded` body.
///
/// The first occurrence of the field wins. Empty values count as absent.
pub fn token_from_urlencoded(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(name, _)| name == RESPONSE_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}
