use anyhow::Context;

use rescue_core::config::RecoveryConfig;
use rescue_core::control_block::read_or_zeroed;
use rescue_core::writer::ControlBlockWriter;
use rescue_persistence::misc::MiscStore;

/// Requests a recovery session with `args` on the next boot.
pub fn run(config: &RecoveryConfig, args: &[String]) -> anyhow::Result<()> {
    let mut store = MiscStore::from_config(config);
    let base = read_or_zeroed(&mut store);
    let path = store.path().to_path_buf();

    let staged = ControlBlockWriter::new(&mut store)
        .persist(&base, args)
        .with_context(|| format!("Failed to stage arguments in {}", path.display()))?;

    println!("\nStaged {} argument(s) for next recovery boot", args.len() - staged.dropped);
    if staged.dropped > 0 {
        println!("⚠️  {} argument(s) did not fit in the control block", staged.dropped);
    }
    Ok(())
}
