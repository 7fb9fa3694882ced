pub mod api;
pub mod auth;
pub mod clone;
pub mod config;
#[doc(hidden)]
pub mod test_support;
