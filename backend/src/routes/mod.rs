/// Router Module Index
///
/// Splits the route table by access level. The authentication guard is applied to a
/// whole module as an Axum layer, so a mutating endpoint cannot be registered without it.

/// Read-only routes plus registration and login. No identity required.
pub mod public;

/// Mutating routes. Every request passes `auth::require_auth` before its handler.
pub mod authenticated;
