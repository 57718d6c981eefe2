//! Shared test utilities for BranchDeck
//!
//! - Backend payload builders
//! - Cores over in-memory and temporary SQLite storage

#![allow(dead_code)]

pub mod fixtures;
