//! Log-safety helpers shared by adapters and services.

pub mod redact;

pub use redact::{Excerpt, Redacted};
