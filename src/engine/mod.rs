//! Execution engine for likey
//!
//! The engine orchestrates:
//! 1. Planning - Build license states from config
//! 2. Executing - Converge each state in config order
//! 3. Reporting - Show changes and a summary

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, ExecuteSummary, execute};
pub use planner::build_plan;
