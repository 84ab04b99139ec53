// handlers/public/mod.rs - Endpoints that do not require a session
//
// Registration and login create sessions; logout and auth check read one
// when present but never reject a request for lacking it.

pub mod users;
