//!
//! Audit trail of write attempts.
//!
//! Every insert, amendment and provisioning request appends one record,
//! whether it was allowed or denied. The log is append-only and bounded; once
//! full, the oldest record is dropped.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::access::SessionContext;
use crate::error::{DenyReason, LedgerError};
use crate::types::{TenantId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    InsertTransaction,
    AmendTransaction,
    CreateTenant,
    CreateUser,
    CreateAccount,
    UpdateAccount,
    GrantAccess,
    RevokeAccess,
    LoadSeed,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuditOutcome {
    Allowed,
    Denied { reason: DenyReason },
    Rejected { detail: String },
}

impl AuditOutcome {
    pub(crate) fn of<T>(result: &Result<T, LedgerError>) -> Self {
        match result {
            Ok(_) => AuditOutcome::Allowed,
            Err(LedgerError::AccessDenied(reason)) => AuditOutcome::Denied { reason: *reason },
            Err(other) => AuditOutcome::Rejected { detail: other.to_string() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditRecord {
    pub operation_id: Uuid,
    pub tenant: TenantId,
    pub user: UserId,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    capacity: usize,
    records: VecDeque<AuditRecord>,
}

impl AuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        AuditLog {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    pub fn record<T>(&mut self, ctx: &SessionContext, action: AuditAction, result: &Result<T, LedgerError>) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(AuditRecord {
            operation_id: ctx.operation_id,
            tenant: ctx.tenant,
            user: ctx.user,
            action,
            outcome: AuditOutcome::of(result),
            at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_bounded_and_drops_oldest() {
        let ctx = SessionContext::unset(Uuid::new_v4());
        let mut log = AuditLog::with_capacity(2);
        log.record(&ctx, AuditAction::CreateTenant, &Ok::<(), LedgerError>(()));
        log.record(&ctx, AuditAction::CreateUser, &Err::<(), _>(LedgerError::AccessDenied(DenyReason::NoContext)));
        log.record(&ctx, AuditAction::CreateAccount, &Err::<(), _>(LedgerError::ConstraintViolation("x".into())));
        let records = log.snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, AuditAction::CreateUser);
        assert_eq!(records[0].outcome, AuditOutcome::Denied { reason: DenyReason::NoContext });
        assert!(matches!(records[1].outcome, AuditOutcome::Rejected { .. }));
    }
}
