// tests/properties.rs

use std::collections::BTreeSet;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;
use watchf::types::{EventName, RawEventKind};
use watchf::watch::throttle::{allow, ThrottleGate};
use watchf::watch::{classify, EventMask};

fn raw_kind() -> impl Strategy<Value = RawEventKind> {
    prop_oneof![
        Just(RawEventKind::Create),
        Just(RawEventKind::Modify),
        Just(RawEventKind::Delete),
        Just(RawEventKind::Rename),
        Just(RawEventKind::AttributeChange),
    ]
}

fn mask() -> impl Strategy<Value = BTreeSet<EventName>> {
    proptest::sample::subsequence(EventName::ALL.to_vec(), 0..=4)
        .prop_map(|names| names.into_iter().collect())
}

proptest! {
    #[test]
    fn classifier_admits_exactly_the_masked_kinds(kind in raw_kind(), names in mask()) {
        let mask = EventMask::from_names(names.clone());
        let admitted = mask.admit(kind);

        match classify(kind) {
            Some(name) => {
                let expected = if names.contains(&name) { Some(name) } else { None };
                prop_assert_eq!(admitted, expected);
            }
            None => {
                prop_assert_eq!(kind, RawEventKind::AttributeChange);
                prop_assert_eq!(admitted, None);
            }
        }
    }

    #[test]
    fn attribute_changes_are_never_admitted(names in mask()) {
        prop_assert_eq!(EventMask::from_names(names).admit(RawEventKind::AttributeChange), None);
        prop_assert_eq!(EventMask::all().admit(RawEventKind::AttributeChange), None);
    }

    #[test]
    fn second_event_runs_iff_gap_exceeds_interval(
        interval_ms in 1u64..10_000,
        gap_ms in 0u64..20_000,
    ) {
        let interval = Duration::from_millis(interval_ms);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(gap_ms);

        let mut gate = ThrottleGate::new(interval);
        prop_assert!(gate.try_pass(t0));
        prop_assert_eq!(gate.try_pass(t1), gap_ms > interval_ms);
        prop_assert_eq!(allow(Some(t0), interval, t1), gap_ms > interval_ms);
    }

    #[test]
    fn zero_interval_never_throttles(gaps in proptest::collection::vec(0u64..50, 1..20)) {
        let mut gate = ThrottleGate::new(Duration::ZERO);
        let mut now = Instant::now();
        for gap in gaps {
            now += Duration::from_millis(gap);
            prop_assert!(gate.try_pass(now));
        }
    }
}
