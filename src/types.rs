//!
//! Shared identifier and enumeration types for the ledger.
//!
//! Identifiers are thin newtypes over `i64`. Real rows always carry positive
//! ids; the value `-1` is reserved as the "no access" sentinel used by an
//! unset context, so it can never match a stored row.

use std::fmt;
use std::str::FromStr;

/// Sentinel id carried by an unset context. Matches no row.
pub const NO_ACCESS: i64 = -1;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// The sentinel value carried by an unset context.
            pub const NONE: $name = $name(NO_ACCESS);

            /// Whether this id can name a stored row (strictly positive).
            #[inline]
            pub fn is_assignable(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifies a tenant (customer / organisation boundary).
    TenantId
);
row_id!(
    /// Identifies a user. A user belongs to exactly one tenant.
    UserId
);
row_id!(
    /// Identifies an account. Accounts are scoped to one tenant.
    AccountId
);
row_id!(
    /// Identifies a ledger transaction.
    TransactionId
);

/// RightsMask, a 32-bit field. See [`crate::rights`] for the bit layout.
pub type RightsMask = u32;

/// Kind of a ledger transaction. Fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Fee,
    Dividend,
    Trade,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 5] = [
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::Fee,
        TransactionKind::Dividend,
        TransactionKind::Trade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Fee => "fee",
            TransactionKind::Dividend => "dividend",
            TransactionKind::Trade => "trade",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "fee" => Ok(TransactionKind::Fee),
            "dividend" => Ok(TransactionKind::Dividend),
            "trade" => Ok(TransactionKind::Trade),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A three-letter upper-case currency code such as `USD`.
///
/// Construction validates the shape; membership in an allow-list is a
/// configuration concern checked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        // Only ASCII upper-case letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(format!("Malformed currency code: {:?}", s));
        }
        Ok(CurrencyCode([bytes[0], bytes[1], bytes[2]]))
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for CurrencyCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for CurrencyCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Role of the acting identity, resolved from a role label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Provisioning actor. May create tenants, users, accounts and grants.
    Administrator,
    /// Ordinary application user, subject to row policies.
    Member,
    /// No identity. Carried by an unset context; sees nothing.
    Anonymous,
}

impl Role {
    #[inline]
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Administrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_accepts_three_uppercase_letters() {
        let code: CurrencyCode = "USD".parse().unwrap();
        assert_eq!(code.as_str(), "USD");
        assert!("usd".parse::<CurrencyCode>().is_err());
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("USDT".parse::<CurrencyCode>().is_err());
        assert!("U$D".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn currency_code_serde_is_a_plain_string() {
        let code: CurrencyCode = "EUR".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"EUR\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"eur\"").is_err());
    }

    #[test]
    fn transaction_kind_labels() {
        for kind in TransactionKind::ALL {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn sentinel_ids_are_not_assignable() {
        assert!(!TenantId::NONE.is_assignable());
        assert!(!UserId(0).is_assignable());
        assert!(AccountId(1).is_assignable());
    }
}
