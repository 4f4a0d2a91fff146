//! The greeting: a remembered name behind a persistent state adapter.

use super::Context;
use crate::greeting;
use keepstate_core::{PersistentState, SyncOutcome};
use tracing::warn;

/// Greet the remembered name, remembering `name` first if given.
pub fn greet(
    ctx: &Context,
    key: &str,
    initial_name: String,
    name: Option<String>,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let mut state = PersistentState::builder(key, initial_name)
        .policy(ctx.config.hydration_policy())
        .build(&store)?;
    if !state.initial_outcome().is_clean() {
        warn!(key, "Store refused the initial write");
    }

    if let Some(name) = name {
        if let SyncOutcome::Degraded(warnings) = state.set(name) {
            warn!(count = warnings.len(), "Name was not saved and will not survive a restart");
        }
    }

    println!("{}", greeting::render(state.get()));
    Ok(())
}

/// Move the remembered name from `from` to `to`.
pub fn rename(ctx: &Context, from: &str, to: &str, initial_name: String) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let mut state = PersistentState::builder(from, initial_name)
        .policy(ctx.config.hydration_policy())
        .build(&store)?;

    let outcome = state.set_key(to)?;
    if outcome.is_clean() {
        println!("Moved {from} -> {to}");
    } else {
        println!("Moved {from} -> {to} (with warnings)");
    }
    Ok(())
}
