//! Credential provider: bearer token and/or session cookie.
//!
//! Credentials are resolved once at startup. At least one of the two values
//! must be present; a run with neither is refused before any request is made.

use std::fmt;

use crate::error::StartupError;

/// Environment variable holding the bearer token.
pub const AUTH_TOKEN_VAR: &str = "URBANPIPER_AUTH_TOKEN";
/// Environment variable holding the raw `Cookie` header value.
pub const COOKIE_VAR: &str = "URBANPIPER_COOKIE";

/// Authentication material attached to every outbound request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
    cookie: Option<String>,
}

impl Credentials {
    /// Build from explicit values. Blank strings count as absent.
    pub fn new(token: Option<String>, cookie: Option<String>) -> Result<Self, StartupError> {
        let token = non_blank(token);
        let cookie = non_blank(cookie);
        if token.is_none() && cookie.is_none() {
            return Err(StartupError::MissingCredentials {
                token_var: AUTH_TOKEN_VAR,
                cookie_var: COOKIE_VAR,
            });
        }
        Ok(Self { token, cookie })
    }

    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(AUTH_TOKEN_VAR), lookup(COOKIE_VAR))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// `Authorization` header value, if a token is configured.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("token", &redact(&self.token))
            .field("cookie", &redact(&self.cookie))
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[rstest]
    #[case::token_only(&[(AUTH_TOKEN_VAR, "abc")], Some("abc"), None)]
    #[case::cookie_only(&[(COOKIE_VAR, "sid=1")], None, Some("sid=1"))]
    #[case::both(&[(AUTH_TOKEN_VAR, "abc"), (COOKIE_VAR, "sid=1")], Some("abc"), Some("sid=1"))]
    #[case::blank_token_ignored(&[(AUTH_TOKEN_VAR, "  "), (COOKIE_VAR, "sid=1")], None, Some("sid=1"))]
    fn resolves_available_values(
        #[case] env: &[(&str, &str)],
        #[case] token: Option<&str>,
        #[case] cookie: Option<&str>,
    ) {
        let creds = Credentials::from_lookup(lookup(env)).expect("credentials");
        assert_eq!(creds.token(), token);
        assert_eq!(creds.cookie(), cookie);
    }

    #[rstest]
    #[case::nothing_set(&[])]
    #[case::whitespace_only(&[(AUTH_TOKEN_VAR, " "), (COOKIE_VAR, "\t")])]
    fn missing_both_fails_fast(#[case] env: &[(&str, &str)]) {
        let err = Credentials::from_lookup(lookup(env)).unwrap_err();
        assert!(matches!(err, StartupError::MissingCredentials { .. }));
        let msg = err.to_string();
        assert!(msg.contains(AUTH_TOKEN_VAR), "got: {msg}");
        assert!(msg.contains(COOKIE_VAR), "got: {msg}");
    }

    #[test]
    fn bearer_header_formatting() {
        let creds = Credentials::new(Some("tok".to_string()), None).unwrap();
        assert_eq!(creds.authorization_header().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::new(Some("s3cret".to_string()), Some("sid=9".to_string())).unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(!dbg.contains("sid=9"));
        assert!(dbg.contains("<redacted>"));
    }
}
