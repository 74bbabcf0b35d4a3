//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository and hosting provider mocks
//! - A builder for `AppState` wired to those mocks

mod app_state_builder;
mod domain_mocks;

pub use app_state_builder::*;
pub use domain_mocks::*;
pub use factories::*;
