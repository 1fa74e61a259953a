//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! The X API accepts user-context writes only with a signed OAuth 1.0a
//! `Authorization` header built from the four-part credentials. The
//! signature covers the HTTP method, the base URL, and every oauth/query
//! parameter; JSON request bodies are not part of the base string.

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

/// Four-part OAuth 1.0a user-context credentials.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub api_key: String,
    pub api_key_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// RFC 3986 unreserved characters stay literal, everything else is encoded.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode per RFC 3986 as OAuth 1.0a requires.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, ENCODE_SET).to_string()
}

/// A fresh 32-character alphanumeric nonce.
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Compute the HMAC-SHA1 signature over method, base URL and parameters.
fn signature(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    api_key_secret: &str,
    access_token_secret: &str,
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(api_key_secret),
        percent_encode(access_token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(base_string.as_bytes());

    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization: OAuth ...` header value for one request.
///
/// `extra_params` are request parameters outside the header (query or
/// form-encoded body); they take part in the signature but are not
/// emitted into the header itself. `nonce` and `timestamp` are passed in
/// so signing stays deterministic under test.
pub fn authorization_header(
    creds: &OAuthCredentials,
    method: &str,
    base_url: &str,
    extra_params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".to_string(), creds.api_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), creds.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(
        extra_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    let sig = signature(
        method,
        base_url,
        &all_params,
        &creds.api_key_secret,
        &creds.access_token_secret,
    );

    let mut header_params = oauth_params;
    header_params.push(("oauth_signature".to_string(), sig));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}
