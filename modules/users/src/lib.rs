// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::model;

// === MODULE DEFINITION ===
pub mod config;
pub mod module;
pub use module::UsersModule;

// === INTERNAL MODULES ===
// Exposed for the routing layer and for tests. Other consumers should stick to `contract`.
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
