//! Authenticated session detection.
//!
//! Logged-in visitors always get the live application; their pages are
//! personalized and must never be snapshotted.

use axum::body::Body;
use axum::http::{header, Request};

use crate::config::AuthConfig;

/// Answers whether a request belongs to an authenticated session.
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self, request: &Request<Body>) -> bool;
}

/// Treats every visitor as anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn is_authenticated(&self, _request: &Request<Body>) -> bool {
        false
    }
}

/// Recognizes sessions by cookie name and, optionally, any `Authorization` header.
#[derive(Debug, Clone, Default)]
pub struct SessionAuthenticator {
    session_cookie: Option<String>,
    authorization_header: bool,
}

impl SessionAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            session_cookie: config.session_cookie.clone(),
            authorization_header: config.authorization_header,
        }
    }

    fn has_session_cookie(&self, request: &Request<Body>, cookie_name: &str) -> bool {
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == cookie_name && !value.is_empty())
    }
}

impl Authenticator for SessionAuthenticator {
    fn is_authenticated(&self, request: &Request<Body>) -> bool {
        if self.authorization_header && request.headers().contains_key(header::AUTHORIZATION) {
            return true;
        }
        self.session_cookie
            .as_deref()
            .is_some_and(|name| self.has_session_cookie(request, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(cookie: Option<&str>, authorization_header: bool) -> SessionAuthenticator {
        SessionAuthenticator::from_config(&AuthConfig {
            session_cookie: cookie.map(str::to_string),
            authorization_header,
        })
    }

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_session_cookie() {
        let auth = authenticator(Some("laravel_session"), false);
        assert!(auth.is_authenticated(&request(&[("Cookie", "theme=dark; laravel_session=abc")])));
        assert!(!auth.is_authenticated(&request(&[("Cookie", "laravel_session=")])));
        assert!(!auth.is_authenticated(&request(&[("Cookie", "other_session=abc")])));
        assert!(!auth.is_authenticated(&request(&[])));
    }

    #[test]
    fn test_authorization_header() {
        let auth = authenticator(None, true);
        assert!(auth.is_authenticated(&request(&[("Authorization", "Bearer t")])));

        let auth = authenticator(None, false);
        assert!(!auth.is_authenticated(&request(&[("Authorization", "Bearer t")])));
    }

    #[test]
    fn test_anonymous() {
        assert!(!Anonymous.is_authenticated(&request(&[("Authorization", "Bearer t")])));
    }
}
