pub mod api;
pub mod client;
pub mod core;
pub mod session;
pub mod storage;
