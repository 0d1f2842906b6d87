//! Regression tests: merging detached customers must never disturb the
//! shared default address, and customers merged in the same transaction must
//! keep their own addresses.
//!
//! The shared default is process-wide state, so these tests assert it before
//! and after every scenario: any write through it would leak across the whole
//! suite.

use berth_directory::{Address, Customer};
use berth_session::{Database, PersistentRecord, RecordStore, RowKey};

use berth_events::{Event, SessionEvent};

#[test]
fn merging_a_customer_does_not_change_the_shared_default_address() {
    let db = Database::new();

    db.within_transaction(|session| {
        session.merge(&Customer::with_address(
            "Compagnie de Paris",
            Address::new("paris"),
        )?)?;
        assert_eq!(Address::default_address().city(), "london");
        Ok(())
    })
    .unwrap();

    assert_eq!(Address::default_address().city(), "london");
}

#[test]
fn customers_merged_in_one_transaction_keep_their_own_addresses() {
    let db = Database::new();

    db.within_transaction(|session| {
        let paris = session.merge(&Customer::with_address(
            "Compagnie de Paris",
            Address::new("paris"),
        )?)?;
        let berlin = session.merge(&Customer::with_address(
            "Berliner Handel",
            Address::new("berlin"),
        )?)?;

        assert_eq!(paris.address().city(), "paris");
        assert_eq!(berlin.address().city(), "berlin");
        assert_eq!(Address::default_address().city(), "london");
        Ok(())
    })
    .unwrap();

    assert_eq!(Address::default_address().city(), "london");
}

#[test]
fn merging_a_customer_built_from_the_default_leaves_the_default_intact() {
    let db = Database::new();

    let id = db
        .within_transaction(|session| {
            let mut managed = session.merge(&Customer::new("Thames Shipping")?)?;
            managed.relocate(Address::new("paris"));
            let managed = session.merge(&managed)?;
            Ok(managed.record_id())
        })
        .unwrap()
        .expect("merge assigns an identifier");

    let found: Customer = db
        .within_transaction(|session| session.find(id))
        .unwrap()
        .expect("customer was committed");

    assert_eq!(found.address().city(), "paris");
    assert_eq!(Address::default_address().city(), "london");
}

#[test]
fn a_detached_update_advances_the_row_one_version_and_keeps_the_new_state() {
    let db = Database::new();

    let managed = db
        .within_transaction(|session| {
            session.merge(&Customer::with_address(
                "Compagnie de Paris",
                Address::new("paris"),
            )?)
        })
        .unwrap();
    let id = managed.record_id().expect("merge assigns an identifier");

    let mut detached = managed;
    detached.relocate(Address::new("berlin"));
    db.within_transaction(|session| session.merge(&detached).map(|_| ()))
        .unwrap();

    let row = db
        .store()
        .get(&RowKey::new::<Customer>(id))
        .unwrap()
        .expect("row exists");
    assert_eq!(row.version, 2);

    let found: Customer = db
        .within_transaction(|session| session.find(id))
        .unwrap()
        .expect("customer still stored");
    assert_eq!(found.address().city(), "berlin");
    assert_eq!(Address::default_address().city(), "london");
}

#[test]
fn a_failed_transaction_leaves_nothing_behind() {
    let db = Database::new();

    let result = db.within_transaction(|session| {
        session.merge(&Customer::with_address(
            "Compagnie de Paris",
            Address::new("paris"),
        )?)?;
        // Validation failure aborts the scope after a merge already staged.
        Customer::new("   ")?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(db.row_count(), 0);
    assert_eq!(Address::default_address().city(), "london");
}

#[test]
fn each_committed_merge_publishes_one_lifecycle_event() {
    let db = Database::new();
    let subscription = db.subscribe();

    db.within_transaction(|session| {
        session.merge(&Customer::with_address(
            "Compagnie de Paris",
            Address::new("paris"),
        )?)?;
        session.merge(&Customer::with_address(
            "Berliner Handel",
            Address::new("berlin"),
        )?)?;
        Ok(())
    })
    .unwrap();

    let first = subscription.try_recv().unwrap();
    let second = subscription.try_recv().unwrap();

    assert_eq!(first.payload().event_type(), "session.record.merged");
    assert_eq!(second.payload().event_type(), "session.record.merged");
    assert!(matches!(first.payload(), SessionEvent::RecordMerged { .. }));
    assert!(subscription.try_recv().is_err());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: no merge, whatever the city, disturbs the shared default,
        /// and the managed copy always equals the pre-merge state.
        #[test]
        fn merging_any_customer_never_disturbs_the_shared_default(
            city in "[a-z]{1,16}",
            name in "[A-Za-z][A-Za-z ]{0,31}"
        ) {
            let db = Database::new();
            let detached = Customer::with_address(name.clone(), Address::new(city.clone())).unwrap();

            let managed = db
                .within_transaction(|session| session.merge(&detached))
                .unwrap();

            prop_assert_eq!(managed.address().city(), city.as_str());
            prop_assert_eq!(managed.name(), name.as_str());
            // The detached input keeps its own state too.
            prop_assert_eq!(detached.address().city(), city.as_str());
            prop_assert_eq!(Address::default_address().city(), "london");
        }
    }
}
