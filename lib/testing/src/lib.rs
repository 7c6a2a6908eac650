//! Helpers shared by tests across the workspace.

pub mod git;
