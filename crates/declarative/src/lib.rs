//! # Declarative
//!
//! A framework for declarative resource lifecycles.
//!
//! This crate provides the orchestrator side of a reconcile loop: record
//! observed state, refresh it, diff it against desired configuration and
//! call back into the resource to converge.
//!
//! ## Core Concepts
//!
//! - **Lifecycle**: create / read / update / delete for one resource type
//! - **AttributeChange**: a drifted attribute, possibly forcing replacement
//! - **ExecutionPlan**: refreshed state plus one [`Action`] per instance
//! - **Executor**: applies the plan, serially or in parallel
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     ApplyContext, AutoConfirm, ExecuteOptions, NoProgress, PlanOptions,
//!     build_plan, execute,
//! };
//!
//! let ctx = ApplyContext::default();
//! let plan = build_plan(&lifecycle, &ctx, &desired, &recorded, &PlanOptions::default())?;
//! let outcome = execute(
//!     &lifecycle,
//!     plan,
//!     &ctx,
//!     &ExecuteOptions::default(),
//!     &mut NoProgress,
//!     &mut AutoConfirm,
//! )?;
//! save(outcome.states)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, CancelToken, ConfirmCallback, Interrupted,
    NoProgress, ProgressCallback,
};
pub use diff::{DiffSummary, ResourceChange};
pub use executor::{ExecuteOutcome, execute};
pub use planner::{ExecutionPlan, PlanFor, StateMap, build_plan, plan_changes, refresh};
pub use resource::{AttributeChange, Lifecycle};
pub use types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary, PlanOptions};
