//! Level 3: Feature Integration Tests
//!
//! These tests verify complete features work correctly end-to-end.

pub mod container;
pub mod delta_merge;
pub mod extract;
pub mod verify;
