use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::TokenPair;
use crate::config::SecurityConfig;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn token_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn set_tokens(jar: CookieJar, tokens: &TokenPair, security: &SecurityConfig) -> CookieJar {
    jar.add(token_cookie(ACCESS_COOKIE, tokens.access_token.clone(), security.secure_cookies))
        .add(token_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), security.secure_cookies))
}

pub fn clear_tokens(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn token_cookies_are_http_only() {
        let security = AppConfig::development().security;
        let tokens = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        let jar = set_tokens(CookieJar::new(), &tokens, &security);

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "a");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "r");
    }
}
