use anyhow::Context;
use std::path::PathBuf;

use crate::host::{CommandPartitioner, CommandReboot, DEFAULT_REBOOT_PROGRAM};
use rescue_core::config::RecoveryConfig;
use rescue_core::pipeline::Resolved;
use rescue_core::reboot::RebootTarget;
use rescue_persistence::command_file::CommandFile;
use rescue_persistence::intent;
use rescue_persistence::misc::MiscStore;
use rescue_persistence::script::ScriptFile;

pub struct StartupOptions {
    pub reboot_program: PathBuf,
    pub partition_tool: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            reboot_program: PathBuf::from(DEFAULT_REBOOT_PROGRAM),
            partition_tool: None,
            dry_run: false,
        }
    }
}

/// Runs one recovery startup: resolve, commit the control block, queue the
/// directives, then reboot. Returns the reboot target (only reached in
/// dry-run mode or when the reboot tool returns).
pub fn run(config: &RecoveryConfig, argv: Vec<String>, options: &StartupOptions) -> anyhow::Result<RebootTarget> {
    tracing::info!("Starting recovery startup on {}", chrono::Local::now().to_rfc2822());

    let mut store = MiscStore::from_config(config);
    let mut commands = CommandFile::new(&config.command_file);

    let resolved = Resolved::resolve(argv, &mut store, &mut commands, config);
    tracing::info!("Arguments taken from {}", resolved.arguments().source());

    let committed = resolved.commit(&mut store);

    let mut queue = ScriptFile::new(&config.script_file);
    let mut partitioner = CommandPartitioner::new(options.partition_tool.clone());
    let executed = committed.execute(&mut queue, &mut partitioner);

    let report = executed.report();
    tracing::info!("Queued {} script command(s)", report.queued.len());
    if !report.skipped.is_empty() {
        tracing::warn!("Not queued: {}", report.skipped.join(", "));
    }

    if let Some(token) = executed.reboot_token() {
        if let Err(e) = intent::write_intent(&config.intent_file, token) {
            tracing::warn!("Failed to record reboot intent: {}", e);
        }
    }

    let mut reboot = CommandReboot::new(&options.reboot_program, options.dry_run);
    executed.reboot(&mut reboot).context("Reboot failed")
}
