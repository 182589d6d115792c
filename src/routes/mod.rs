/// Router Module Index
///
/// Routing is split by access level; the gate is applied to a whole module
/// with an axum layer, never per handler.

/// Routes reachable without an identity token.
pub mod public;

/// Moderation routes. Every route requires the admin claim.
pub mod admin;
