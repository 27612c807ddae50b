// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Startup pipeline.
//!
//! `Resolved` -> `Committed` -> `Executed` -> reboot. Each stage consumes
//! the previous one, so directives can only run after the control block
//! write has been attempted, and the reboot is always the last call.

use crate::args::{resolve_arguments, CommandSource, ResolvedArguments};
use crate::config::RecoveryConfig;
use crate::control_block::{read_or_zeroed, BootControlBlock, ControlBlockStore};
use crate::directive::{parse_directives, Directive, DirectivePlan};
use crate::error::Result;
use crate::reboot::{dispatch, RebootPrimitive, RebootTarget};
use crate::writer::ControlBlockWriter;

/// Queue read by the recovery script interpreter.
pub trait ScriptQueue {
    fn insert(&mut self, command: &str) -> Result<()>;
}

pub trait SdCardPartitioner {
    fn format_sdcard(&mut self, spec: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct Resolved {
    block: BootControlBlock,
    args: ResolvedArguments,
    directives: Vec<Directive>,
    plan: DirectivePlan,
}

impl Resolved {
    /// Reads the control block once and resolves this session's arguments.
    pub fn resolve<S, C>(argv: Vec<String>, store: &mut S, commands: &mut C, config: &RecoveryConfig) -> Self
    where
        S: ControlBlockStore + ?Sized,
        C: CommandSource + ?Sized,
    {
        let block = read_or_zeroed(store);
        block.log_boot_state();
        let args = resolve_arguments(argv, &block, commands, config);
        let directives = parse_directives(&args);
        let plan = DirectivePlan::from_directives(&directives);
        Self {
            block,
            args,
            directives,
            plan,
        }
    }

    pub fn block(&self) -> &BootControlBlock {
        &self.block
    }

    pub fn arguments(&self) -> &ResolvedArguments {
        &self.args
    }

    /// Directives in argument order, before folding into the plan.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn plan(&self) -> &DirectivePlan {
        &self.plan
    }

    /// Writes the re-entry block. A failed write is logged and the session
    /// continues without crash safety.
    pub fn commit<S: ControlBlockStore + ?Sized>(self, store: &mut S) -> Committed {
        let durable = match ControlBlockWriter::new(store).persist(&self.block, self.args.flags()) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("{}. A crash during this session will not return to recovery.", e);
                false
            }
        };
        Committed {
            args: self.args,
            plan: self.plan,
            durable,
        }
    }
}

#[derive(Debug)]
pub struct Committed {
    args: ResolvedArguments,
    plan: DirectivePlan,
    durable: bool,
}

impl Committed {
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn arguments(&self) -> &ResolvedArguments {
        &self.args
    }

    pub fn plan(&self) -> &DirectivePlan {
        &self.plan
    }

    /// Hands the plan to the collaborators: SD card partitioning first, then
    /// script commands in order. Queueing stops at the first refused command.
    pub fn execute<Q, P>(self, queue: &mut Q, partitioner: &mut P) -> Executed
    where
        Q: ScriptQueue + ?Sized,
        P: SdCardPartitioner + ?Sized,
    {
        let mut report = ExecutionReport::default();

        if let Some(spec) = &self.plan.partition_sdcard {
            match partitioner.format_sdcard(spec) {
                Ok(()) => report.partitioned = true,
                Err(e) => tracing::error!("SD card partitioning failed: {}", e),
            }
        }

        let mut commands = self.plan.script_commands().into_iter();
        for command in commands.by_ref() {
            if let Err(e) = queue.insert(&command) {
                tracing::error!("Failed to queue {:?}: {}", command, e);
                report.skipped.push(command);
                break;
            }
            report.queued.push(command);
        }
        report.skipped.extend(commands);

        Executed {
            plan: self.plan,
            report,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub partitioned: bool,
    pub queued: Vec<String>,
    /// The refused command followed by everything not attempted after it.
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub struct Executed {
    plan: DirectivePlan,
    report: ExecutionReport,
}

impl Executed {
    pub fn report(&self) -> &ExecutionReport {
        &self.report
    }

    pub fn reboot_token(&self) -> Option<&str> {
        self.plan.reboot_token.as_deref()
    }

    pub fn reboot_target(&self) -> RebootTarget {
        RebootTarget::from_token(self.reboot_token())
    }

    /// Final step of the session.
    pub fn reboot<R: RebootPrimitive + ?Sized>(self, primitive: &mut R) -> Result<RebootTarget> {
        dispatch(primitive, self.plan.reboot_token.as_deref())
    }
}
