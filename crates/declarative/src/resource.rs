//! Lifecycle trait for declarative state management
//!
//! A lifecycle owns one resource type. The orchestrator records an
//! observed state per instance and calls back into the lifecycle to
//! create, refresh, update or delete it.

use crate::context::ApplyContext;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One attribute that differs between recorded and desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name as shown to users
    pub name: String,
    /// Previously recorded value
    pub from: String,
    /// New value
    pub to: String,
    /// Whether changing this attribute requires destroy-then-create
    pub force_new: bool,
}

impl AttributeChange {
    /// Attribute change that can be converged in place
    pub fn update(name: impl Into<String>, from: impl ToString, to: impl ToString) -> Self {
        Self {
            name: name.into(),
            from: from.to_string(),
            to: to.to_string(),
            force_new: false,
        }
    }

    /// Attribute change that forces replacement
    pub fn force_new(name: impl Into<String>, from: impl ToString, to: impl ToString) -> Self {
        Self {
            force_new: true,
            ..Self::update(name, from, to)
        }
    }
}

/// Core trait for a managed resource type
///
/// `Config` is the user-supplied desired configuration of one instance,
/// `State` the observed state recorded after the last operation.
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, AttributeChange, Lifecycle};
///
/// #[derive(Debug, Clone)]
/// struct Note { path: String, text: String }
///
/// #[derive(Debug, Clone)]
/// struct NoteState { path: String, text: String, present: bool }
///
/// struct Notes;
///
/// impl Lifecycle for Notes {
///     type Config = Note;
///     type State = NoteState;
///
///     fn resource_type(&self) -> &'static str { "note" }
///     fn exists(&self, state: &NoteState) -> bool { state.present }
///
///     fn create(&self, _ctx: &ApplyContext, note: &Note) -> anyhow::Result<NoteState> {
///         std::fs::write(&note.path, &note.text)?;
///         Ok(NoteState { path: note.path.clone(), text: note.text.clone(), present: true })
///     }
///     // read / update / delete / diff ...
/// }
/// ```
pub trait Lifecycle: Send + Sync {
    /// Desired configuration of one instance
    type Config: Clone + fmt::Debug + Send + Sync;
    /// Observed state of one instance
    type State: Clone + fmt::Debug + Send + Sync;

    /// Resource type name, e.g. "remote_file"
    fn resource_type(&self) -> &'static str;

    /// Whether the recorded state says the instance exists
    ///
    /// A refresh that returns a state for which this is false tells the
    /// orchestrator the instance is gone and must be recreated.
    fn exists(&self, state: &Self::State) -> bool;

    /// Bring a new instance into existence
    fn create(&self, ctx: &ApplyContext, config: &Self::Config) -> Result<Self::State>;

    /// Refresh recorded state from reality
    fn read(&self, ctx: &ApplyContext, state: &Self::State) -> Result<Self::State>;

    /// Converge an existing instance in place
    ///
    /// `prior` is the state recorded before the refresh, `current` the
    /// refreshed one.
    fn update(
        &self,
        ctx: &ApplyContext,
        config: &Self::Config,
        prior: &Self::State,
        current: &Self::State,
    ) -> Result<Self::State>;

    /// Destroy an instance, returning its final (non-existent) state
    fn delete(&self, ctx: &ApplyContext, state: &Self::State) -> Result<Self::State>;

    /// Attributes that changed between the desired configuration, the
    /// state recorded before refresh and the refreshed state
    fn diff(
        &self,
        config: &Self::Config,
        prior: &Self::State,
        current: &Self::State,
    ) -> Vec<AttributeChange>;

    /// Key identifying what an instance writes to
    ///
    /// Two desired instances sharing a key would race each other, so the
    /// planner refuses them.
    fn conflict_key(&self, _config: &Self::Config) -> Option<String> {
        None
    }
}
