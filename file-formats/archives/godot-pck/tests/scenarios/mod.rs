//! Level 4: End-to-End Scenario Tests
//!
//! These tests verify real-world usage scenarios and complex workflows.

pub mod patch_workflow;
