// Match history: persistence of finished matches and the HTTP handlers over it.

pub mod handlers;
pub mod store;
