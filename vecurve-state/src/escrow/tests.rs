use vecurve_core::{week_floor, MAXTIME, WEEK};

use super::*;
use crate::access::LOCK_CREATOR;
use crate::ledger::MemoryLedger;

const OWNER: Address = [1u8; 20];
const ESCROW: Address = [0xee; 20];
const ALICE: Address = [0xa1; 20];
const BOB: Address = [0xb0; 20];

fn start() -> u64 {
    week_floor(1_700_000_000) + 100
}

fn tokens(n: u64) -> U256 {
    U256::from_wad_units(n)
}

fn auth(nonce: u64) -> Authorization {
    Authorization::new(nonce, u64::MAX, vec![1])
}

fn setup() -> (VotingEscrow, MemoryLedger, ExecutionContext) {
    let ctx = ExecutionContext::new(OWNER, start(), 1);
    let escrow = VotingEscrow::new(ESCROW, EscrowConfig::default(), &ctx);
    let mut ledger = MemoryLedger::new();
    ledger.mint(&ALICE, tokens(1_000_000));
    ledger.mint(&BOB, tokens(1_000_000));
    (escrow, ledger, ctx)
}

fn slope_of(amount: U256) -> i128 {
    (amount / U256::from(MAXTIME)).low_u128() as i128
}

#[test]
fn test_create_lock_line() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    let amount = tokens(100_000);
    escrow
        .create_lock(&alice, &mut ledger, amount, start() + MAXTIME, &auth(0))
        .unwrap();

    let end = week_floor(start() + MAXTIME);
    assert_eq!(escrow.locked(&ALICE), LockedBalance::new(amount, end));
    assert_eq!(escrow.supply(), amount);
    assert_eq!(ledger.balance_of(&ESCROW), amount);

    let slope = slope_of(amount);
    assert_eq!(escrow.get_last_user_slope(&ALICE), slope);
    assert_eq!(escrow.slope_change(end), -slope);
    let t = start() + WEEK;
    assert_eq!(
        escrow.balance_of(&ALICE, t),
        U256::from_u128((slope * (end - t) as i128) as u128)
    );
    assert_eq!(escrow.balance_of(&ALICE, end), U256::zero());
    assert_eq!(escrow.total_supply(t), escrow.balance_of(&ALICE, t));
}

#[test]
fn test_create_lock_validation() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);

    assert_eq!(
        escrow.create_lock(&alice, &mut ledger, U256::zero(), start() + WEEK * 2, &auth(0)),
        Err(StateError::ZeroAmount)
    );
    assert!(matches!(
        escrow.create_lock(&alice, &mut ledger, tokens(1), start() + WEEK, &auth(0)),
        Err(StateError::UnlockTimeTooSoon { .. })
    ));
    assert!(matches!(
        escrow.create_lock(&alice, &mut ledger, tokens(1), start() + MAXTIME + 2 * WEEK, &auth(0)),
        Err(StateError::UnlockTimeTooLate { .. })
    ));

    escrow
        .create_lock(&alice, &mut ledger, tokens(1), start() + 2 * WEEK, &auth(0))
        .unwrap();
    assert_eq!(
        escrow.create_lock(&alice, &mut ledger, tokens(1), start() + 2 * WEEK, &auth(1)),
        Err(StateError::LockAlreadyExists { account: ALICE })
    );
    assert_eq!(ledger.balance_of(&ESCROW), tokens(1));
}

#[test]
fn test_failed_transfer_leaves_no_state() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    let expired = Authorization::new(0, start() - 1, vec![1]);
    assert!(matches!(
        escrow.create_lock(&alice, &mut ledger, tokens(10), start() + 4 * WEEK, &expired),
        Err(StateError::AuthorizationExpired { .. })
    ));
    assert!(escrow.locked(&ALICE).is_empty());
    assert_eq!(escrow.epoch(), 0);
    assert_eq!(escrow.user_point_epoch(&ALICE), 0);
    assert!(escrow.take_events().is_empty());
}

#[test]
fn test_increase_amount() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    let end = week_floor(start() + 52 * WEEK);
    escrow
        .create_lock(&alice, &mut ledger, tokens(100), end, &auth(0))
        .unwrap();
    let before = escrow.balance_of(&ALICE, start());

    let later = alice.advance(WEEK, 100);
    escrow
        .increase_amount(&later, &mut ledger, tokens(100), &auth(1))
        .unwrap();
    assert_eq!(escrow.locked(&ALICE), LockedBalance::new(tokens(200), end));
    assert!(escrow.balance_of(&ALICE, later.timestamp) > before);
    assert_eq!(escrow.slope_change(end), -slope_of(tokens(200)));
    assert_eq!(escrow.user_point_epoch(&ALICE), 2);
}

#[test]
fn test_deposit_for_requires_active_lock() {
    let (mut escrow, mut ledger, ctx) = setup();
    let bob = ctx.with_caller(BOB);
    assert_eq!(
        escrow.deposit_for(&bob, &mut ledger, ALICE, tokens(5), &auth(0)),
        Err(StateError::NoActiveLock { account: ALICE })
    );

    let alice = ctx.with_caller(ALICE);
    escrow
        .create_lock(&alice, &mut ledger, tokens(10), start() + 10 * WEEK, &auth(0))
        .unwrap();
    escrow
        .deposit_for(&bob, &mut ledger, ALICE, tokens(5), &auth(0))
        .unwrap();
    assert_eq!(escrow.locked(&ALICE).amount, tokens(15));
    assert_eq!(ledger.balance_of(&BOB), tokens(1_000_000 - 5));
}

#[test]
fn test_increase_unlock_time() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    let end = week_floor(start() + 10 * WEEK);
    escrow
        .create_lock(&alice, &mut ledger, tokens(100), end, &auth(0))
        .unwrap();

    assert!(matches!(
        escrow.increase_unlock_time(&alice, end),
        Err(StateError::CanOnlyIncreaseLockDuration { .. })
    ));
    assert!(matches!(
        escrow.increase_unlock_time(&alice, start() + MAXTIME + 2 * WEEK),
        Err(StateError::UnlockTimeTooLate { .. })
    ));

    let new_end = end + 5 * WEEK;
    escrow.increase_unlock_time(&alice, new_end).unwrap();
    assert_eq!(escrow.locked_end(&ALICE), new_end);
    assert_eq!(escrow.slope_change(end), 0);
    assert_eq!(escrow.slope_change(new_end), -slope_of(tokens(100)));
    let remaining = slope_of(tokens(100)) * (5 * WEEK) as i128;
    assert_eq!(escrow.balance_of(&ALICE, end), U256::from_u128(remaining as u128));

    let expired = alice.advance(20 * WEEK, 10);
    assert!(matches!(
        escrow.increase_unlock_time(&expired, new_end + WEEK),
        Err(StateError::LockExpired { .. })
    ));
}

#[test]
fn test_withdraw() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    let end = week_floor(start() + 3 * WEEK);
    escrow
        .create_lock(&alice, &mut ledger, tokens(100), end, &auth(0))
        .unwrap();

    assert_eq!(
        escrow.withdraw(&alice, &mut ledger),
        Err(StateError::LockNotExpired {
            end,
            now: start()
        })
    );

    let after = ExecutionContext::new(ALICE, end, 50);
    assert_eq!(escrow.withdraw(&after, &mut ledger), Ok(tokens(100)));
    assert!(escrow.locked(&ALICE).is_empty());
    assert!(escrow.supply().is_zero());
    assert_eq!(ledger.balance_of(&ALICE), tokens(1_000_000));
    assert_eq!(escrow.user_point_history(&ALICE).map(|h| h.latest().bias), Some(0));
    assert_eq!(
        escrow.withdraw(&after, &mut ledger),
        Err(StateError::NoActiveLock { account: ALICE })
    );
}

#[test]
fn test_total_supply_matches_sum() {
    let (mut escrow, mut ledger, ctx) = setup();
    escrow
        .create_lock(
            &ctx.with_caller(ALICE),
            &mut ledger,
            tokens(1_000),
            start() + 10 * WEEK,
            &auth(0),
        )
        .unwrap();
    let later = ctx.advance(2 * WEEK + 77, 40).with_caller(BOB);
    escrow
        .create_lock(&later, &mut ledger, tokens(3_000), start() + 30 * WEEK, &auth(0))
        .unwrap();

    for offset in [3 * WEEK, 9 * WEEK, 10 * WEEK, 15 * WEEK, 29 * WEEK, 40 * WEEK] {
        let t = start() + offset;
        let sum = escrow.balance_of(&ALICE, t) + escrow.balance_of(&BOB, t);
        assert_eq!(escrow.total_supply(t), sum, "offset {}", offset);
    }
    assert_eq!(escrow.total_supply(start() - 1), U256::zero());
}

#[test]
fn test_balance_at_block() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    escrow
        .create_lock(&alice, &mut ledger, tokens(1_000), start() + 20 * WEEK, &auth(0))
        .unwrap();

    let now = ExecutionContext::new(ALICE, start() + 1_000, 101);
    let at_51 = escrow.balance_of_at_block(&now, &ALICE, 51).unwrap();
    assert_eq!(at_51, escrow.balance_of(&ALICE, start() + 500));
    assert_eq!(
        escrow.total_supply_at_block(&now, 51).unwrap(),
        escrow.total_supply(start() + 500)
    );
    assert_eq!(escrow.balance_of_at_block(&now, &BOB, 51), Ok(U256::zero()));
    assert_eq!(
        escrow.balance_of_at_block(&now, &ALICE, 102),
        Err(StateError::BlockInFuture {
            block: 102,
            latest: 101
        })
    );
}

#[test]
fn test_checkpoint_behind_requires_advance() {
    let ctx = ExecutionContext::new(OWNER, start(), 1);
    let config = EscrowConfig {
        max_replay_weeks: 4,
        ..EscrowConfig::default()
    };
    let mut escrow = VotingEscrow::new(ESCROW, config, &ctx);
    let mut ledger = MemoryLedger::new();
    ledger.mint(&ALICE, tokens(10));

    let idle = ExecutionContext::new(ALICE, start() + 10 * WEEK, 500);
    assert!(matches!(
        escrow.create_lock(&idle, &mut ledger, tokens(10), idle.timestamp + 4 * WEEK, &auth(0)),
        Err(StateError::CheckpointBehind { limit: 4, .. })
    ));

    let first = escrow.advance_checkpoints(&idle, 4);
    assert!(!first.reached_now);
    let mut rounds = 1;
    while !escrow.advance_checkpoints(&idle, 4).reached_now {
        rounds += 1;
    }
    assert!(rounds >= 2);
    assert_eq!(escrow.supply_point(escrow.epoch()).ts, idle.timestamp);

    escrow
        .create_lock(&idle, &mut ledger, tokens(10), idle.timestamp + 4 * WEEK, &auth(0))
        .unwrap();
}

#[test]
fn test_create_lock_for_requires_role() {
    let (mut escrow, mut ledger, ctx) = setup();
    let bob = ctx.with_caller(BOB);
    assert!(matches!(
        escrow.create_lock_for(&bob, &mut ledger, ALICE, tokens(1), start() + 4 * WEEK, &auth(0)),
        Err(StateError::MissingRole { .. })
    ));

    escrow
        .access_mut()
        .grant_role(&ctx, LOCK_CREATOR, BOB)
        .unwrap();
    escrow
        .create_lock_for(&bob, &mut ledger, ALICE, tokens(1), start() + 4 * WEEK, &auth(0))
        .unwrap();
    assert_eq!(escrow.locked(&ALICE).amount, tokens(1));
    assert!(escrow.locked(&BOB).is_empty());
    assert_eq!(ledger.balance_of(&BOB), tokens(1_000_000 - 1));
}

#[test]
fn test_events() {
    let (mut escrow, mut ledger, ctx) = setup();
    let alice = ctx.with_caller(ALICE);
    escrow
        .create_lock(&alice, &mut ledger, tokens(7), start() + 4 * WEEK, &auth(0))
        .unwrap();
    let events = escrow.take_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        Event::Deposit { provider, kind: DepositKind::CreateLock, .. } if *provider == ALICE
    ));
    assert_eq!(
        events[1],
        Event::Supply {
            prev_supply: U256::zero(),
            supply: tokens(7)
        }
    );
    assert!(escrow.take_events().is_empty());
}
