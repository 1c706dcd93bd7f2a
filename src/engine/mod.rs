//! Execution engine for terraurl
//!
//! The engine orchestrates:
//! 1. Planning - Load config and state, refresh, decide per resource
//! 2. Diffing - Show the plan with the attributes behind each change
//! 3. Executing - Confirm, apply with parallelism, report results

pub mod differ;
pub mod executor;
pub mod planner;

pub use planner::Session;
