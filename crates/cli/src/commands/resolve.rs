use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use rescue_core::args::ArgumentSource;
use rescue_core::config::RecoveryConfig;
use rescue_core::directive::{Directive, DirectivePlan};
use rescue_core::pipeline::Resolved;
use rescue_core::reboot::RebootTarget;
use rescue_persistence::command_file::CommandFile;
use rescue_persistence::misc::MiscStore;

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub source: ArgumentSource,
    pub arguments: Vec<String>,
    pub directives: Vec<Directive>,
    pub plan: DirectivePlan,
    pub script_commands: Vec<String>,
    pub reboot_target: RebootTarget,
}

/// Resolves arguments and directives without writing anything.
pub fn report(config: &RecoveryConfig, argv: Vec<String>) -> ResolveReport {
    let mut store = MiscStore::from_config(config);
    let mut commands = CommandFile::new(&config.command_file);
    let resolved = Resolved::resolve(argv, &mut store, &mut commands, config);

    let plan = resolved.plan().clone();
    ResolveReport {
        source: resolved.arguments().source(),
        arguments: resolved.arguments().as_slice().to_vec(),
        directives: resolved.directives().to_vec(),
        script_commands: plan.script_commands(),
        reboot_target: RebootTarget::from_token(plan.reboot_token.as_deref()),
        plan,
    }
}

pub fn run(config: &RecoveryConfig, argv: Vec<String>, json: bool) -> anyhow::Result<()> {
    let report = report(config, argv);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Item", "Value"]);

    table.add_row(vec!["Source".to_string(), report.source.to_string()]);
    table.add_row(vec!["Arguments".to_string(), report.arguments.join(" ")]);
    if let Some(spec) = &report.plan.partition_sdcard {
        table.add_row(vec!["Partition SD card".to_string(), spec.clone()]);
    }
    for command in &report.script_commands {
        table.add_row(vec!["Script".to_string(), command.clone()]);
    }
    table.add_row(vec!["Reboot".to_string(), report.reboot_target.to_string()]);

    println!("\nStartup Resolution");
    println!("------------------");
    println!("{table}\n");

    Ok(())
}
