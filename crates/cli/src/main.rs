use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use rescue_cli::commands::startup::StartupOptions;
use rescue_cli::commands::{clear, inspect, resolve, stage, startup};
use rescue_cli::host::DEFAULT_REBOOT_PROGRAM;
use rescue_cli::telemetry;
use rescue_core::config::RecoveryConfig;

#[derive(Parser)]
#[command(name = "rescue")]
#[command(about = "Recovery startup - resolves boot arguments and stages recovery commands", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    /// Append log lines to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Device or image holding the bootloader control block
    #[arg(long, global = true)]
    misc: Option<PathBuf>,

    /// Byte offset of the control block inside --misc
    #[arg(long, global = true)]
    misc_offset: Option<u64>,

    #[arg(long, global = true)]
    command_file: Option<PathBuf>,

    #[arg(long, global = true)]
    intent_file: Option<PathBuf>,

    #[arg(long, global = true)]
    script_file: Option<PathBuf>,

    /// Maximum argument count, program name included
    #[arg(long, global = true)]
    max_args: Option<usize>,
}

impl PathArgs {
    fn into_config(self) -> RecoveryConfig {
        let defaults = RecoveryConfig::default();
        RecoveryConfig {
            control_block_path: self.misc.unwrap_or(defaults.control_block_path),
            control_block_offset: self.misc_offset.unwrap_or(defaults.control_block_offset),
            command_file: self.command_file.unwrap_or(defaults.command_file),
            intent_file: self.intent_file.unwrap_or(defaults.intent_file),
            script_file: self.script_file.unwrap_or(defaults.script_file),
            max_args: self.max_args.unwrap_or(defaults.max_args),
            max_arg_length: defaults.max_arg_length,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve arguments, commit the control block, queue directives and reboot.
    Startup {
        /// Log the reboot instead of performing it
        #[arg(long)]
        dry_run: bool,

        #[arg(long, default_value = DEFAULT_REBOOT_PROGRAM)]
        reboot_program: PathBuf,

        /// Tool invoked with the SD card partition spec
        #[arg(long)]
        partition_tool: Option<PathBuf>,

        /// Recovery arguments; when present they take precedence over every other source
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show what startup would do, without writing anything
    Resolve {
        #[arg(long)]
        json: bool,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show the control block fields
    Inspect,
    /// Request a recovery session with the given arguments on next boot
    Stage {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Clear the recovery request so the next boot is normal
    Clear,
}

fn process_argv(args: Vec<String>) -> Vec<String> {
    let program = std::env::args().next().unwrap_or_else(|| "recovery".to_string());
    std::iter::once(program).chain(args).collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_logging(cli.log_file.as_deref())?;

    let config = cli.paths.into_config();
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Startup {
            dry_run,
            reboot_program,
            partition_tool,
            args,
        } => {
            let options = StartupOptions {
                reboot_program,
                partition_tool,
                dry_run,
            };
            let target = startup::run(&config, process_argv(args), &options)?;
            println!("Reboot target: {}", target);
            Ok(())
        }
        Commands::Resolve { json, args } => resolve::run(&config, process_argv(args), json),
        Commands::Inspect => inspect::run(&config),
        Commands::Stage { args } => stage::run(&config, &args),
        Commands::Clear => clear::run(&config),
    }
}
