//! Level 2: Component Integration Tests
//!
//! These tests verify that the header/index codec and the builder agree on
//! the on-disk layout.

pub mod codec;
pub mod properties;
