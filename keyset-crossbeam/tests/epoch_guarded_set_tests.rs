use keyset_core::common_tests::set_core_tests::*;
use keyset_core::common_tests::set_stress_tests::*;
use keyset_core::{ConcurrentSet, Key, LockFreeSet};
use keyset_crossbeam::EpochLockFreeSet;
use rstest::rstest;
use serial_test::serial;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type EpochSet = EpochLockFreeSet<u64>;

fn same_key(_: &u64) -> Key {
    7
}

fn two_keys(item: &u64) -> Key {
    (*item % 2) as Key
}

#[rstest]
#[case::epoch_lock_free(EpochSet::default())]
fn test_basic<C: ConcurrentSet<u64>>(#[case] set: C) {
    init_logging();
    test_basic_operations(&set);
}

#[rstest]
#[case::epoch_lock_free(EpochSet::default())]
fn test_round_trip_and_len<C: ConcurrentSet<u64>>(#[case] set: C) {
    init_logging();
    test_round_trip(&set);
    test_idempotent_add(&set);
}

#[test]
fn test_collisions() {
    init_logging();
    let set: EpochLockFreeSet<u64, fn(&u64) -> Key> =
        LockFreeSet::with_key_fn(same_key as fn(&u64) -> Key);
    test_key_collision_distinctness(&set);
}

#[rstest]
#[case::seed_1(1)]
#[case::seed_2(2)]
fn test_sequential(#[case] seed: u64) {
    init_logging();
    test_sequential_equivalence(&EpochSet::default(), seed);
}

#[rstest]
#[case::epoch_lock_free(EpochSet::default())]
fn test_race_linearizes<C: ConcurrentSet<u64> + Default + Send + Sync + 'static>(
    #[case] _set: C,
) {
    init_logging();
    test_add_remove_race_linearizes::<C>();
}

#[rstest]
#[serial(stress_tests)]
#[case::epoch_lock_free(EpochSet::default())]
fn stress_no_lost_updates<C: ConcurrentSet<u64> + Default + Send + Sync + 'static>(
    #[case] _set: C,
) {
    init_logging();
    test_no_lost_updates::<C>();
}

#[test]
#[serial(stress_tests)]
fn stress_no_lost_updates_with_collisions() {
    init_logging();
    test_no_lost_updates_with_collisions(|| -> EpochLockFreeSet<u64, fn(&u64) -> Key> {
        LockFreeSet::with_key_fn(two_keys as fn(&u64) -> Key)
    });
}

#[rstest]
#[serial(stress_tests)]
#[case::epoch_lock_free(EpochSet::default())]
fn stress_contains_during_modifications<
    C: ConcurrentSet<u64> + Default + Send + Sync + 'static,
>(
    #[case] _set: C,
) {
    init_logging();
    test_contains_during_modifications::<C>();
}

#[rstest]
#[serial(stress_tests)]
#[case::epoch_lock_free(EpochSet::default())]
fn stress_extreme_contention<C: ConcurrentSet<u64> + Default + Send + Sync + 'static>(
    #[case] _set: C,
) {
    init_logging();
    test_extreme_contention_single_item::<C>();
}

#[rstest]
#[serial(stress_tests)]
#[case::epoch_lock_free(EpochSet::default())]
fn stress_liveness<C: ConcurrentSet<u64> + Default + Send + Sync + 'static>(#[case] _set: C) {
    init_logging();
    test_liveness_under_deadline::<C>();
}
