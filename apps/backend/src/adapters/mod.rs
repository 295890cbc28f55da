//! Adapters for external dependencies.

pub mod session_store_sea;
