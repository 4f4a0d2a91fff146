//! Configuration display.

use super::Context;

/// Print the effective configuration as JSON.
pub fn show_config(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    println!();
    println!("Store: {}", ctx.store_path.display());
    println!("Hydration: {:?}", ctx.config.hydration_policy());

    if ctx.sources.is_empty() {
        println!("Sources: (defaults)");
    } else {
        println!("Sources:");
        for source in &ctx.sources {
            println!("  {}", source.display());
        }
    }
    Ok(())
}
