//! Ledger configuration.
//!
//! Loaded from JSON. Every field has a default, so an empty object is a valid
//! configuration. Unknown fields are rejected to catch typos early.

use std::collections::BTreeSet;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::types::{CurrencyCode, Role};

/// Role labels accepted by [`crate::access::ContextCarrier::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLabels {
    pub admin_role: String,
    pub member_role: String,
}

impl Default for RoleLabels {
    fn default() -> Self {
        RoleLabels {
            admin_role: "admin".to_string(),
            member_role: "app_user".to_string(),
        }
    }
}

impl RoleLabels {
    /// Resolves a role label. Unknown labels are rejected rather than mapped
    /// to a default role.
    pub fn resolve(&self, label: &str) -> Result<Role, LedgerError> {
        if label == self.admin_role {
            Ok(Role::Administrator)
        } else if label == self.member_role {
            Ok(Role::Member)
        } else {
            Err(LedgerError::ConstraintViolation(format!("Unknown role label: {:?}", label)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Role label treated as administrative.
    pub admin_role: String,
    /// Role label for ordinary application users.
    pub member_role: String,
    /// Maximum number of decimal places accepted in an amount.
    pub amount_scale: u32,
    /// Optional bound on the absolute value of an amount.
    pub max_abs_amount: Option<Decimal>,
    /// Optional currency allow-list. `None` accepts any well-formed code.
    pub allowed_currencies: Option<BTreeSet<CurrencyCode>>,
    /// Number of audit records retained; oldest are dropped first.
    pub audit_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let roles = RoleLabels::default();
        LedgerConfig {
            admin_role: roles.admin_role,
            member_role: roles.member_role,
            amount_scale: 2,
            max_abs_amount: None,
            allowed_currencies: None,
            audit_capacity: 10_000,
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            serde_json::from_str(raw).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn role_labels(&self) -> RoleLabels {
        RoleLabels {
            admin_role: self.admin_role.clone(),
            member_role: self.member_role.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.admin_role.is_empty() || self.member_role.is_empty() {
            return Err(LedgerError::Config("role labels must not be empty".into()));
        }
        if self.admin_role == self.member_role {
            return Err(LedgerError::Config(
                "admin_role and member_role must differ".into(),
            ));
        }
        if self.amount_scale > 28 {
            return Err(LedgerError::Config(format!(
                "amount_scale {} exceeds decimal precision",
                self.amount_scale
            )));
        }
        if let Some(max) = self.max_abs_amount {
            if max <= Decimal::ZERO {
                return Err(LedgerError::Config("max_abs_amount must be positive".into()));
            }
        }
        if self.audit_capacity == 0 {
            return Err(LedgerError::Config("audit_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Value constraints on a transaction amount.
    pub(crate) fn check_amount(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount.normalize().scale() > self.amount_scale {
            return Err(LedgerError::ConstraintViolation(format!(
                "Amount {} has more than {} decimal places",
                amount, self.amount_scale
            )));
        }
        if let Some(max) = self.max_abs_amount {
            if amount.abs() > max {
                return Err(LedgerError::ConstraintViolation(format!(
                    "Amount {} exceeds the configured bound {}",
                    amount, max
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn check_currency(&self, currency: CurrencyCode) -> Result<(), LedgerError> {
        match &self.allowed_currencies {
            Some(allowed) if !allowed.contains(&currency) => Err(LedgerError::ConstraintViolation(
                format!("Currency {} is not allowed", currency),
            )),
            _ => Ok(()),
        }
    }
}
