//! Session token cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use opsboard_client::tokens::TokenPair;
use opsboard_core::config::auth::CookieConfig;

/// Reads and writes the HttpOnly token cookies.
///
/// Token values live only in cookies, never in response bodies. Cookies
/// carry no Max-Age: expiry is enforced by token verification, not by
/// cookie lifetime.
#[derive(Debug, Clone)]
pub struct TokenCookies {
    access_name: String,
    refresh_name: String,
    secure: bool,
}

impl TokenCookies {
    /// Create from cookie configuration.
    pub fn new(config: &CookieConfig) -> Self {
        Self {
            access_name: config.access_name.clone(),
            refresh_name: config.refresh_name.clone(),
            secure: config.secure,
        }
    }

    /// The access token from the request jar, if present and non-empty.
    pub fn access_token(&self, jar: &CookieJar) -> Option<String> {
        self.read(jar, &self.access_name)
    }

    /// The refresh token from the request jar, if present and non-empty.
    pub fn refresh_token(&self, jar: &CookieJar) -> Option<String> {
        self.read(jar, &self.refresh_name)
    }

    /// A jar that sets both cookies to the given pair.
    ///
    /// A refresh replaces the pair wholesale; callers never store one
    /// token without the other.
    pub fn store(&self, pair: &TokenPair) -> CookieJar {
        CookieJar::new()
            .add(self.build(&self.access_name, pair.access_token.clone()))
            .add(self.build(&self.refresh_name, pair.refresh_token.clone()))
    }

    /// A jar that expires both cookies.
    pub fn clear(&self) -> CookieJar {
        CookieJar::new()
            .add(self.removal(&self.access_name))
            .add(self.removal(&self.refresh_name))
    }

    fn read(&self, jar: &CookieJar, name: &str) -> Option<String> {
        jar.get(name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    fn build(&self, name: &str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_string(), value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        cookie
    }

    fn removal(&self, name: &str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new());
        cookie.make_removal();
        cookie
    }
}
