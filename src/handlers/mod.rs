// handlers/mod.rs - Two-tier handler layout
//
// Public (no session or optional session) → Protected (session required).
// The session middleware is attached per route group in app.rs.

pub mod protected;
pub mod public;
pub mod utils;
