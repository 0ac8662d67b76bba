use anyhow::{bail, Result};
use std::env;
use tracing::info;

use crate::Config;

pub async fn run(force: bool) -> Result<()> {
    let root = env::current_dir()?;

    if Config::is_initialized(&root) && !force {
        bail!(
            "metascope is already initialized in {:?} (use --force to overwrite)",
            Config::config_dir(&root)
        );
    }

    Config::default().save(&root)?;

    info!("Initialized metascope in {:?}", Config::config_dir(&root));
    println!(
        "✓ Created {} with default configuration",
        Config::config_dir(&root).display()
    );
    println!("\nNext steps:");
    println!("  1. Edit .metascope/config.toml to customize settings");
    println!("  2. Run 'metascope search <snapshot.json> <query>' to search a snapshot");

    Ok(())
}
