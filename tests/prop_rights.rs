use proptest::prelude::*;
use ledgerguard_core::rights::{self, core};

proptest! {
    /// For any mask, canonicalise(mask) should be a superset of mask (bitwise).
    #[test]
    fn prop_canonicalise_superset(mask in any::<u32>()) {
        let canon = rights::canonicalise(mask);
        prop_assert_eq!(mask & canon, mask);
    }

    /// MUTATE implies READ after canonicalisation.
    #[test]
    fn prop_mutate_implies_read(mask in any::<u32>()) {
        let canon = rights::canonicalise(mask | core::MUTATE);
        prop_assert!((canon & core::READ) != 0);
    }

    /// Sufficient should be equivalent when `have` is first canonicalised.
    #[test]
    fn prop_sufficient_equivalence(have in any::<u32>(), need in any::<u32>()) {
        let s1 = rights::sufficient(have, need);
        let s2 = rights::sufficient(rights::canonicalise(have), need);
        prop_assert_eq!(s1, s2);
    }

    /// A grant always confers READ, and confers MUTATE exactly when flagged.
    #[test]
    fn prop_grant_rights(can_mutate in any::<bool>()) {
        let mask = rights::for_grant(can_mutate);
        prop_assert!(rights::sufficient(mask, core::READ));
        prop_assert_eq!(rights::sufficient(mask, core::MUTATE), can_mutate);
    }
}
