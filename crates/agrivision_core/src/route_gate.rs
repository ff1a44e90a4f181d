//! crates/agrivision_core/src/route_gate.rs
//!
//! Path-based access policy applied before any page is served.

/// Pages that need a signed-in user.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/profile",
    "/settings",
    "/analyze",
    "/weather",
    "/results",
    "/team",
];

/// Pages only meant for visitors without a session.
pub const GUEST_ONLY_PREFIXES: &[&str] = &["/login", "/register"];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
pub const CALLBACK_PARAM: &str = "callbackUrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    GuestOnly,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Send the visitor to the login page, remembering where they were going.
    RedirectToLogin { callback: String },
    RedirectHome,
}

/// `/results` matches `/results` and `/results/42`, not `/resultsets`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn classify(path: &str) -> PathClass {
    if PROTECTED_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        PathClass::Protected
    } else if GUEST_ONLY_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        PathClass::GuestOnly
    } else {
        PathClass::Open
    }
}

pub fn decide(path: &str, has_valid_session: bool) -> GateDecision {
    match (classify(path), has_valid_session) {
        (PathClass::Protected, false) => GateDecision::RedirectToLogin {
            callback: path.to_string(),
        },
        (PathClass::GuestOnly, true) => GateDecision::RedirectHome,
        _ => GateDecision::Allow,
    }
}
