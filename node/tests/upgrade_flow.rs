use gala_api::prelude::*;
use gala_node::store::{BlockContext, BlockHeader, KvRead, StakingOps, UpgradeOps};
use gala_node::upgrade::{power_index_mutation, Migration, ReconcileOutcome, UpgradeError};
use gala_node::{App, AppBuilder, GenesisState, Msg, NodeError};
use std::path::Path;
use tempdir::TempDir;

const TEST_UPGRADE: MigrationDescriptor = MigrationDescriptor::at_height("1.0.0", 5, "test upgrade");

fn build(dir: &Path, migrations: Vec<Migration>) -> App {
    AppBuilder::new(dir).migrations(migrations).build().unwrap()
}

fn genesis() -> GenesisState {
    GenesisState::new("gala-test", 0)
}

fn block(app: &mut App, height: u64, msgs: &[Msg]) -> Result<gala_node::BlockResult, NodeError> {
    app.process_block(BlockHeader::new(height, height * 10), msgs)
}

fn upgrade_events(result: &gala_node::BlockResult) -> usize {
    result.events.iter().filter(|e| e.kind == EVENT_TYPE_UPGRADE).count()
}

#[test]
fn test_upgrade_runs_once_at_trigger_height() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    app.init_chain(&genesis()).unwrap();

    for height in 1..=8 {
        let result = block(&mut app, height, &[]).unwrap();
        if height == 5 {
            assert_eq!(result.upgrade.as_deref(), Some("1.0.0"));
            assert_eq!(upgrade_events(&result), 1);
        } else {
            assert_eq!(result.upgrade, None, "unexpected upgrade at {height}");
            assert_eq!(upgrade_events(&result), 0);
        }
    }

    let done = app.store().get_done("1.0.0").unwrap().unwrap();
    assert_eq!(done.height, 5);
    assert_eq!(done.info, "test upgrade");
    assert!(app.pending_upgrades().is_empty());
}

#[test]
fn test_restart_does_not_reapply() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    {
        let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
        app.init_chain(&genesis()).unwrap();
        for height in 1..=6 {
            block(&mut app, height, &[]).unwrap();
        }
    }

    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    assert_eq!(
        app.reconcile_outcomes(),
        &[("1.0.0".to_string(), ReconcileOutcome::AlreadyApplied { height: 5 })]
    );
    assert!(app.registry().contains("1.0.0"));
    assert!(app.pending_upgrades().is_empty());
    let result = block(&mut app, 7, &[]).unwrap();
    assert_eq!(result.upgrade, None);
}

#[test]
fn test_binary_installed_after_trigger_applies_next_block() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    {
        let mut app = build(temp_dir.path(), Vec::new());
        app.init_chain(&genesis()).unwrap();
        for height in 1..=7 {
            block(&mut app, height, &[]).unwrap();
        }
    }

    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    assert_eq!(app.pending_upgrades().head().map(|p| p.height), Some(8));
    let result = block(&mut app, 8, &[]).unwrap();
    assert_eq!(result.upgrade.as_deref(), Some("1.0.0"));
}

#[test]
fn test_governance_plan_without_handler_halts() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let governance = MigrationDescriptor::governance("9.9.9", "next release");
    {
        let mut app = build(temp_dir.path(), Vec::new());
        app.init_chain(&genesis()).unwrap();
        block(&mut app, 1, &[Msg::ScheduleUpgrade(Plan::new("9.9.9", 3, "next release"))]).unwrap();
        block(&mut app, 2, &[]).unwrap();

        let err = block(&mut app, 3, &[]).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            NodeError::Upgrade(UpgradeError::UpgradeNeeded { ref name, height: 3 }) if name == "9.9.9"
        ));
        assert_eq!(app.latest_height().unwrap(), Some(2));
        assert_eq!(app.upgrade_info().read().unwrap().map(|p| p.name), Some("9.9.9".to_string()));
    }

    let mut app = build(temp_dir.path(), vec![Migration::new(governance, None)]);
    assert_eq!(
        app.reconcile_outcomes(),
        &[("9.9.9".to_string(), ReconcileOutcome::Registered)]
    );
    let result = block(&mut app, 3, &[]).unwrap();
    assert_eq!(result.upgrade.as_deref(), Some("9.9.9"));
    assert_eq!(app.store().get_plan().unwrap(), None);
    assert_eq!(app.store().get_done("9.9.9").unwrap().map(|d| d.height), Some(3));
}

#[test]
fn test_invalid_schedule_messages_are_rejected() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    app.init_chain(&genesis()).unwrap();
    for height in 1..=5 {
        block(&mut app, height, &[]).unwrap();
    }

    block(
        &mut app,
        6,
        &[
            Msg::ScheduleUpgrade(Plan::new("1.0.0", 10, "")),
            Msg::ScheduleUpgrade(Plan::new("2.0.0", 6, "")),
        ],
    )
    .unwrap();
    assert_eq!(app.store().get_plan().unwrap(), None);

    block(&mut app, 7, &[Msg::ScheduleUpgrade(Plan::new("2.0.0", 20, ""))]).unwrap();
    assert_eq!(app.store().get_plan().unwrap().map(|p| p.height), Some(20));
    block(&mut app, 8, &[Msg::CancelUpgrade]).unwrap();
    assert_eq!(app.store().get_plan().unwrap(), None);
}

#[test]
fn test_power_index_repair_upgrade() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let repair = Migration::new(MigrationDescriptor::at_height("0.1.2", 2, "repair"), Some(power_index_mutation));
    let mut app = build(temp_dir.path(), vec![repair]);

    let a = Validator::new(Address::new([0xa1; 20]), 40 * DEFAULT_POWER_REDUCTION);
    let b = Validator::new(Address::new([0xb2; 20]), 25 * DEFAULT_POWER_REDUCTION);
    let mut genesis = genesis();
    genesis.staking.validators = vec![a.clone(), b.clone()];
    app.init_chain(&genesis).unwrap();

    // Corrupt the index: a stale entry for `a` at a wrong power.
    let mut ctx = BlockContext::new(app.store(), BlockHeader::new(0, 0));
    ctx.put_power_index_key(power_index_key_for(4, &a.operator), &a.operator);
    ctx.commit().unwrap();
    assert_eq!(app.store().get_power_index_keys().unwrap().len(), 3);

    block(&mut app, 1, &[]).unwrap();
    let result = block(&mut app, 2, &[]).unwrap();
    assert_eq!(result.upgrade.as_deref(), Some("0.1.2"));

    let keys = app.store().get_power_index_keys().unwrap();
    assert_eq!(keys.len(), 2);
    for validator in [&a, &b] {
        let entries: Vec<_> = keys
            .iter()
            .map(|key| parse_power_index_key(key).unwrap())
            .filter(|(_, operator)| *operator == validator.operator)
            .collect();
        assert_eq!(entries, vec![(validator.consensus_power(), validator.operator)]);
    }
    let repairs = result
        .events
        .iter()
        .filter(|e| e.kind == EVENT_TYPE_POWER_INDEX_REPAIR)
        .count();
    assert_eq!(repairs, 2);
}

#[test]
fn test_failed_block_leaves_no_trace() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let mut app = build(temp_dir.path(), Vec::new());
    app.init_chain(&genesis()).unwrap();
    block(&mut app, 1, &[Msg::ScheduleUpgrade(Plan::new("9.9.9", 2, ""))]).unwrap();

    let before = app.store().prefix_scan(gala_node::store::ColumnFamily::Bank, &[]).unwrap();
    assert!(block(&mut app, 2, &[]).is_err());
    let after = app.store().prefix_scan(gala_node::store::ColumnFamily::Bank, &[]).unwrap();
    assert_eq!(before, after);
    assert_eq!(app.latest_height().unwrap(), Some(1));
    assert!(matches!(
        block(&mut app, 3, &[]),
        Err(NodeError::UnexpectedHeight { expected: 2, got: 3 })
    ));
}

fn seed_plan(app: &App, plan: Plan) {
    let mut ctx = BlockContext::new(app.store(), BlockHeader::new(0, 0));
    ctx.set_plan(&plan).unwrap();
    ctx.commit().unwrap();
}

#[test]
fn test_plan_below_trigger_height_is_rejected() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    app.init_chain(&genesis()).unwrap();

    block(&mut app, 1, &[Msg::ScheduleUpgrade(Plan::new("1.0.0", 2, ""))]).unwrap();
    assert_eq!(app.store().get_plan().unwrap(), None);

    for height in 2..=4 {
        assert_eq!(block(&mut app, height, &[]).unwrap().upgrade, None);
    }
    let result = block(&mut app, 5, &[]).unwrap();
    assert_eq!(result.upgrade.as_deref(), Some("1.0.0"));
    assert_eq!(app.store().get_done("1.0.0").unwrap().map(|d| d.height), Some(5));
}

#[test]
fn test_stored_plan_below_trigger_halts() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let mut app = build(temp_dir.path(), vec![Migration::new(TEST_UPGRADE, None)]);
    app.init_chain(&genesis()).unwrap();
    seed_plan(&app, Plan::new("1.0.0", 2, ""));

    block(&mut app, 1, &[]).unwrap();
    let err = block(&mut app, 2, &[]).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        NodeError::Upgrade(UpgradeError::BelowTrigger { height: 2, trigger: 5, .. })
    ));
    assert_eq!(app.latest_height().unwrap(), Some(1));
    assert_eq!(app.store().get_done("1.0.0").unwrap(), None);
}

#[test]
fn test_governance_plan_waits_for_earlier_upgrade() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let migrations = || {
        vec![
            Migration::new(MigrationDescriptor::at_height("1.0.0", 10, ""), None),
            Migration::new(MigrationDescriptor::governance("1.1.0", ""), None),
        ]
    };
    let mut app = build(temp_dir.path(), migrations());
    app.init_chain(&genesis()).unwrap();

    block(&mut app, 1, &[Msg::ScheduleUpgrade(Plan::new("1.1.0", 3, ""))]).unwrap();
    assert_eq!(app.store().get_plan().unwrap(), None);
    block(&mut app, 2, &[Msg::ScheduleUpgrade(Plan::new("1.1.0", 10, ""))]).unwrap();
    assert_eq!(app.store().get_plan().unwrap(), None);

    block(&mut app, 3, &[Msg::ScheduleUpgrade(Plan::new("1.1.0", 12, ""))]).unwrap();
    assert_eq!(app.store().get_plan().unwrap().map(|p| p.height), Some(12));

    let mut applied = Vec::new();
    for height in 4..=12 {
        if let Some(name) = block(&mut app, height, &[]).unwrap().upgrade {
            applied.push((name, height));
        }
    }
    assert_eq!(applied, vec![("1.0.0".to_string(), 10), ("1.1.0".to_string(), 12)]);
}

#[test]
fn test_stored_plan_ahead_of_sequence_halts() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let migrations = vec![
        Migration::new(MigrationDescriptor::at_height("1.0.0", 10, ""), None),
        Migration::new(MigrationDescriptor::governance("1.1.0", ""), None),
    ];
    let mut app = build(temp_dir.path(), migrations);
    app.init_chain(&genesis()).unwrap();
    seed_plan(&app, Plan::new("1.1.0", 3, ""));

    block(&mut app, 1, &[]).unwrap();
    block(&mut app, 2, &[]).unwrap();
    let err = block(&mut app, 3, &[]).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        NodeError::Upgrade(UpgradeError::OutOfOrder { ref name, ref other }) if name == "1.1.0" && other == "1.0.0"
    ));
    assert_eq!(app.store().get_done("1.1.0").unwrap(), None);
}

#[test]
fn test_earlier_queued_upgrade_runs_before_stored_plan() {
    let temp_dir = TempDir::new("upgrade_flow").unwrap();
    let migrations = vec![
        Migration::new(MigrationDescriptor::at_height("1.0.0", 4, ""), None),
        Migration::new(MigrationDescriptor::governance("1.1.0", ""), None),
    ];
    let mut app = build(temp_dir.path(), migrations);
    app.init_chain(&genesis()).unwrap();
    seed_plan(&app, Plan::new("1.1.0", 4, ""));

    for height in 1..=3 {
        block(&mut app, height, &[]).unwrap();
    }
    assert_eq!(block(&mut app, 4, &[]).unwrap().upgrade.as_deref(), Some("1.0.0"));
    assert_eq!(block(&mut app, 5, &[]).unwrap().upgrade.as_deref(), Some("1.1.0"));
    assert_eq!(app.store().get_plan().unwrap(), None);
}
