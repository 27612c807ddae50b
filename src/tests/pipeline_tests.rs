use crate::args::ArgumentSource;
use crate::config::RecoveryConfig;
use crate::control_block::{BootControlBlock, BOOT_RECOVERY};
use crate::directive::Wipe;
use crate::pipeline::Resolved;
use crate::reboot::RebootTarget;
use crate::tests::fakes::*;

fn staged_block(recovery: &str) -> BootControlBlock {
    let mut block = BootControlBlock::zeroed();
    block.set_command(BOOT_RECOVERY);
    block.set_recovery(recovery);
    block
}

#[test]
fn test_full_session_order() {
    let journal = Journal::default();
    let mut store = MemoryStore {
        block: Some(staged_block(
            "recovery\n--partition=2048,0,0\n--update_package=/sdcard/rom.zip\n--wipe_data\n--shutdown_to=bootloader\n",
        )),
        journal: journal.clone(),
        ..MemoryStore::default()
    };
    let mut commands = MemoryCommands::default();
    let config = RecoveryConfig::default();

    let resolved = Resolved::resolve(argv(&["/sbin/recovery"]), &mut store, &mut commands, &config);
    assert_eq!(resolved.arguments().source(), ArgumentSource::ControlBlockArgs);
    assert_eq!(resolved.plan().wipe, Some(Wipe::FactoryReset));
    assert_eq!(commands.reads, 0, "command file must not be read when the block has arguments");

    let committed = resolved.commit(&mut store);
    assert!(committed.is_durable());

    let executed = committed.execute(
        &mut RecordingQueue {
            journal: journal.clone(),
            ..RecordingQueue::default()
        },
        &mut RecordingPartitioner {
            journal: journal.clone(),
        },
    );
    assert_eq!(executed.reboot_target(), RebootTarget::Bootloader);

    let target = executed
        .reboot(&mut RecordingReboot {
            journal: journal.clone(),
        })
        .unwrap();
    assert_eq!(target, RebootTarget::Bootloader);

    assert_eq!(
        *journal.borrow(),
        vec![
            "write-block".to_string(),
            "partition 2048,0,0".to_string(),
            "install /sdcard/rom.zip".to_string(),
            "wipe data".to_string(),
            "reboot bootloader".to_string(),
        ]
    );
}

#[test]
fn test_write_happens_once_even_without_directives() {
    let mut store = MemoryStore::default();
    let resolved = Resolved::resolve(argv(&["/sbin/recovery"]), &mut store, &mut MemoryCommands::default(), &RecoveryConfig::default());
    assert!(resolved.plan().is_idle());

    let committed = resolved.commit(&mut store);
    assert!(committed.is_durable());
    assert_eq!(store.writes, 1);

    let block = store.block.clone().unwrap();
    assert_eq!(block.command().as_text(), Some(BOOT_RECOVERY));
    assert_eq!(block.recovery().as_text(), Some("recovery\n"));
}

#[test]
fn test_read_failure_falls_through_to_command_file() {
    let mut store = MemoryStore {
        fail_reads: true,
        ..MemoryStore::default()
    };
    let mut commands = MemoryCommands::with_lines(&["--wipe_cache"]);

    let resolved = Resolved::resolve(argv(&["/sbin/recovery"]), &mut store, &mut commands, &RecoveryConfig::default());
    assert_eq!(resolved.arguments().source(), ArgumentSource::CommandFileArgs);
    assert!(resolved.block().is_zeroed());
    assert_eq!(resolved.plan().wipe, Some(Wipe::Cache));
}

#[test]
fn test_write_failure_does_not_abort() {
    let journal = Journal::default();
    let mut store = MemoryStore {
        fail_writes: true,
        journal: journal.clone(),
        ..MemoryStore::default()
    };

    let resolved = Resolved::resolve(
        argv(&["/sbin/recovery", "--wipe_cache"]),
        &mut store,
        &mut MemoryCommands::default(),
        &RecoveryConfig::default(),
    );
    let committed = resolved.commit(&mut store);
    assert!(!committed.is_durable());

    let executed = committed.execute(
        &mut RecordingQueue {
            journal: journal.clone(),
            ..RecordingQueue::default()
        },
        &mut RecordingPartitioner::default(),
    );
    assert_eq!(executed.report().queued, vec!["wipe cache".to_string()]);
    assert_eq!(executed.reboot_target(), RebootTarget::System);
}

#[test]
fn test_refused_command_stops_queueing() {
    let mut store = MemoryStore::default();
    let resolved = Resolved::resolve(
        argv(&["/sbin/recovery", "--nandroid", "--update_package=a.zip", "--wipe_cache"]),
        &mut store,
        &mut MemoryCommands::default(),
        &RecoveryConfig::default(),
    );

    let executed = resolved.commit(&mut store).execute(
        &mut RecordingQueue {
            refuse: Some("install a.zip".to_string()),
            ..RecordingQueue::default()
        },
        &mut RecordingPartitioner::default(),
    );

    let report = executed.report();
    assert_eq!(report.queued, vec!["backup BSDCAE".to_string()]);
    assert_eq!(report.skipped, vec!["install a.zip".to_string(), "wipe cache".to_string()]);
    assert!(!report.partitioned);
}
