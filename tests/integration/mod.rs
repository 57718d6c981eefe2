//! Integration tests for BranchDeck
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod branch_workflow;
pub mod cli;
pub mod cross_view;
