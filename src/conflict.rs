//! Pairwise host/port conflict detection over a record arena.

use crate::AddressRecord;

/// Annotate every record's conflict lists in place.
///
/// Both lists are reset first, so re-running after a registry rebuild never
/// leaves stale indices behind. For every ordered pair of distinct records,
/// a shared host appends the counterpart's arena index to `host_conflicts`
/// and a shared port appends it to `port_conflicts` — symmetric by
/// construction. Equality is exact: `http://x.localhost` and `x.localhost`
/// are different hosts.
///
/// Quadratic in the number of records, which stays in the tens to low
/// hundreds for real registries.
pub fn annotate(records: &mut [AddressRecord]) {
    for record in records.iter_mut() {
        record.host_conflicts.clear();
        record.port_conflicts.clear();
    }

    for a in 0..records.len() {
        for b in 0..records.len() {
            if a == b {
                continue;
            }
            if records[a].host == records[b].host {
                records[a].host_conflicts.push(b);
            }
            if records[a].port == records[b].port {
                records[a].port_conflicts.push(b);
            }
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::AddressRecord;
    use proptest::prelude::*;

    prop_compose! {
        // Tiny host/port spaces so collisions actually occur
        fn arb_record()(host in "[ab]", port in 30000u16..30003) -> AddressRecord {
            AddressRecord::new(host, port, "~/p/.localhost".to_string(), 1)
        }
    }

    proptest! {
        /// b ∈ a.host_conflicts ⇔ a ∈ b.host_conflicts, likewise for ports,
        /// and no record ever lists itself.
        #[test]
        fn annotate_is_symmetric_and_irreflexive(
            mut records in proptest::collection::vec(arb_record(), 0..12)
        ) {
            annotate(&mut records);
            for (i, rec) in records.iter().enumerate() {
                prop_assert!(!rec.host_conflicts.contains(&i));
                prop_assert!(!rec.port_conflicts.contains(&i));
                for &j in &rec.host_conflicts {
                    prop_assert!(records[j].host_conflicts.contains(&i));
                    prop_assert_eq!(&records[j].host, &rec.host);
                }
                for &j in &rec.port_conflicts {
                    prop_assert!(records[j].port_conflicts.contains(&i));
                    prop_assert_eq!(records[j].port, rec.port);
                }
            }
        }

        /// Annotation is idempotent: a second pass changes nothing.
        #[test]
        fn annotate_twice_is_stable(
            mut records in proptest::collection::vec(arb_record(), 0..12)
        ) {
            annotate(&mut records);
            let first = records.clone();
            annotate(&mut records);
            prop_assert_eq!(records, first);
        }
    }
}
