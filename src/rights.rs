//!
//! Rights algebra for account grants.
//! Defines the bit flags an `AccessGrant` confers and the helpers used by the
//! policy evaluator to decide whether a grant covers an operation.

use crate::types::RightsMask;

/// Core rights bit flags (bits 0-1 defined, 2-15 reserved).
pub mod core {
    use super::RightsMask;

    /// Permission to observe an account and its transactions.
    pub const READ: RightsMask = 1 << 0; // 0b01
    /// Permission to insert and amend transactions on an account. Implies `READ`.
    pub const MUTATE: RightsMask = 1 << 1; // 0b10

    // Bits 2-15 are reserved and must be zero for now.
    // Bits 16-31 are left for deployment-specific extensions; preserved but ignored here.
}

/// Canonicalizes a rights mask by adding any implied rights.
///
/// `MUTATE` implies `READ`: if the `MUTATE` bit is set, the returned mask has
/// `READ` set as well.
#[inline]
pub fn canonicalise(mask: RightsMask) -> RightsMask {
    let mut m = mask;
    if (m & core::MUTATE) == core::MUTATE {
        m |= core::READ;
    }
    m
}

/// Checks if a given `RightsMask` (`have`) satisfies a required `RightsMask` (`need`).
///
/// Corresponds to the rule `(canonicalise(have) & need) == need`.
///
/// # Arguments
/// * `have` - The rights conferred by a grant.
/// * `need` - The rights an operation requires.
#[inline]
pub fn sufficient(have: RightsMask, need: RightsMask) -> bool {
    let canonical_have = canonicalise(have);
    (canonical_have & need) == need
}

/// Rights conferred by a grant with the given mutate flag.
#[inline]
pub fn for_grant(can_mutate: bool) -> RightsMask {
    if can_mutate {
        canonicalise(core::MUTATE)
    } else {
        core::READ
    }
}
