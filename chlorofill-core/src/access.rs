//! Route access rules tied to authentication state.

/// Path prefixes that require a signed-in user.
pub const PROTECTED_PREFIXES: &[&str] = &["/profile"];

const LOGIN_PATH: &str = "/login";
const SIGNUP_PATH: &str = "/signup";
const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Allow,
    Redirect(&'static str),
}

/// Decide whether navigation to `path` proceeds.
///
/// Anonymous users are sent to `/login` from protected pages; signed-in users
/// are sent home from `/login` and `/signup`.
pub fn route_access(path: &str, authenticated: bool) -> RouteAccess {
    if authenticated && (path == LOGIN_PATH || path == SIGNUP_PATH) {
        return RouteAccess::Redirect(HOME_PATH);
    }
    if !authenticated && PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return RouteAccess::Redirect(LOGIN_PATH);
    }
    RouteAccess::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_route_requires_identity() {
        assert_eq!(route_access("/profile", false), RouteAccess::Redirect("/login"));
        assert_eq!(route_access("/profile/creations", false), RouteAccess::Redirect("/login"));
        assert_eq!(route_access("/profile", true), RouteAccess::Allow);
    }

    #[test]
    fn test_signed_in_user_skips_auth_pages() {
        assert_eq!(route_access("/login", true), RouteAccess::Redirect("/"));
        assert_eq!(route_access("/signup", true), RouteAccess::Redirect("/"));
        assert_eq!(route_access("/login", false), RouteAccess::Allow);
    }

    #[test]
    fn test_public_pages_always_allowed() {
        assert_eq!(route_access("/recipe/52772", false), RouteAccess::Allow);
        assert_eq!(route_access("/cocktails", true), RouteAccess::Allow);
    }
}
