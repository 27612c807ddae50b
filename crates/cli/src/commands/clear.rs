use anyhow::Context;

use rescue_core::config::RecoveryConfig;
use rescue_core::control_block::read_or_zeroed;
use rescue_core::writer::ControlBlockWriter;
use rescue_persistence::misc::MiscStore;

/// Clears the recovery request so the next boot is a normal one.
pub fn run(config: &RecoveryConfig) -> anyhow::Result<()> {
    let mut store = MiscStore::from_config(config);
    let base = read_or_zeroed(&mut store);
    let path = store.path().to_path_buf();

    ControlBlockWriter::new(&mut store)
        .finish(&base)
        .with_context(|| format!("Failed to clear {}", path.display()))?;

    println!("\nControl block cleared");
    Ok(())
}
