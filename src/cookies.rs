//! Cookie transport for session tokens.

use actix_web::cookie::{Cookie, SameSite};

use crate::auth::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .finish()
}

/// Both tokens of a freshly issued pair
pub fn session_cookies(tokens: &TokenPair) -> [Cookie<'static>; 2] {
    [
        token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()),
        token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()),
    ]
}

/// Cookies that make the client drop both tokens
pub fn cleared_session_cookies() -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE].map(|name| {
        let mut cookie = token_cookie(name, String::new());
        cookie.make_removal();
        cookie
    })
}
