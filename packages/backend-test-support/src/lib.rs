//! Test support shared by the backend's unit and integration tests:
//! one-shot logging initialisation and problem+json assertions.

pub mod logging;
pub mod problem_details;
