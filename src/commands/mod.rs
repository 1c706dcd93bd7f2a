// Lifecycle commands: plan, apply, refresh, destroy, show
pub mod lifecycle;
