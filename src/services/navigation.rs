//! Post-login destination routing.

use crate::models::Role;

/// Routes that must never be used as a post-login destination.
const AUTH_ROUTES: &[&str] = &["/login", "/signup", "/register", "/logout"];

/// Default landing route for a role.
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::User => "/user-portal",
        Role::Admin => "/admin",
        Role::Approver => "/approver",
    }
}

/// Where to navigate after a successful login.
///
/// `referrer` is the path the user was bounced from before logging in. It
/// wins when it is a same-origin path outside the auth pages; anything else
/// (absent, external, protocol-relative, an auth page) falls back to the
/// role's landing route.
pub fn resolve_redirect(role: Role, referrer: Option<&str>) -> String {
    match referrer.map(str::trim).filter(|r| is_safe_internal_path(r)) {
        Some(path) => path.to_string(),
        None => landing_route(role).to_string(),
    }
}

fn is_safe_internal_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
        return false;
    }
    let route = path.split(['?', '#']).next().unwrap_or(path);
    let route = route.trim_end_matches('/');
    !route.is_empty() && !AUTH_ROUTES.contains(&route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults() {
        assert_eq!(resolve_redirect(Role::User, None), "/user-portal");
        assert_eq!(resolve_redirect(Role::Admin, None), "/admin");
        assert_eq!(resolve_redirect(Role::Approver, None), "/approver");
    }

    #[test]
    fn test_referrer_wins() {
        assert_eq!(
            resolve_redirect(Role::Approver, Some("/approver/pending?page=2")),
            "/approver/pending?page=2"
        );
    }

    #[test]
    fn test_unsafe_referrers_fall_back() {
        for referrer in [
            "https://evil.example/phish",
            "//evil.example",
            "/\\evil.example",
            "",
            "/",
            "/login",
            "/login/",
            "/signup?next=/admin",
        ] {
            assert_eq!(
                resolve_redirect(Role::Admin, Some(referrer)),
                "/admin",
                "referrer {:?}",
                referrer
            );
        }
    }
}
