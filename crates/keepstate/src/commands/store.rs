//! Raw store inspection.

use super::Context;
use keepstate_storage::Store;

/// Print the raw stored text for `key`.
pub fn get(ctx: &Context, key: &str) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    match store.get(key)? {
        Some(raw) => {
            println!("{raw}");
            Ok(())
        }
        None => anyhow::bail!("no entry for {key:?}"),
    }
}

/// Delete the entry for `key`.
pub fn remove(ctx: &Context, key: &str) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    if store.remove(key)? {
        println!("Removed {key}");
    } else {
        println!("Nothing stored under {key}");
    }
    Ok(())
}

/// List stored keys, one per line.
pub fn keys(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    for key in store.keys()? {
        println!("{key}");
    }
    Ok(())
}
