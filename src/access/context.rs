//! Per-operation identity.
//!
//! A [`ContextCarrier`] is created for one logical operation, set once by the
//! hosting request layer, and then handed (as a [`SessionContext`]) to every
//! evaluator and store call. There is no global or thread-local slot: two
//! concurrent operations can only share an identity by passing it explicitly.

use uuid::Uuid;

use crate::config::RoleLabels;
use crate::error::LedgerError;
use crate::types::{Role, TenantId, UserId};

/// The identity a policy decision is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionContext {
    pub operation_id: Uuid,
    pub tenant: TenantId,
    pub user: UserId,
    pub role: Role,
}

impl SessionContext {
    /// The fail-closed identity: sentinel tenant and user, anonymous role.
    pub fn unset(operation_id: Uuid) -> Self {
        SessionContext {
            operation_id,
            tenant: TenantId::NONE,
            user: UserId::NONE,
            role: Role::Anonymous,
        }
    }

    /// Whether this context names a real identity. Sentinel or anonymous
    /// contexts are never established.
    #[inline]
    pub fn is_established(&self) -> bool {
        self.tenant.is_assignable() && self.user.is_assignable() && self.role != Role::Anonymous
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.is_established() && self.role.is_admin()
    }
}

/// Holds the identity of one operation. Deliberately not `Clone`.
#[derive(Debug)]
pub struct ContextCarrier {
    operation_id: Uuid,
    labels: RoleLabels,
    slot: Option<SessionContext>,
}

impl Default for ContextCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextCarrier {
    /// Creates an unset carrier using the default role labels.
    pub fn new() -> Self {
        Self::with_labels(RoleLabels::default())
    }

    pub fn with_labels(labels: RoleLabels) -> Self {
        ContextCarrier {
            operation_id: Uuid::new_v4(),
            labels,
            slot: None,
        }
    }

    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    /// Sets the identity for this operation. Allowed exactly once.
    ///
    /// # Errors
    /// * `ContextAlreadySet` on a second call; the first identity is kept.
    /// * `ConstraintViolation` if `role` is not a configured label.
    pub fn set(
        &mut self,
        tenant_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<SessionContext, LedgerError> {
        if self.slot.is_some() {
            return Err(LedgerError::ContextAlreadySet(self.operation_id));
        }
        let ctx = SessionContext {
            operation_id: self.operation_id,
            tenant: TenantId(tenant_id),
            user: UserId(user_id),
            role: self.labels.resolve(role)?,
        };
        tracing::debug!(
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user,
            role = ?ctx.role,
            "context set"
        );
        self.slot = Some(ctx);
        Ok(ctx)
    }

    /// The identity for this operation, or the sentinel identity if unset.
    pub fn current(&self) -> SessionContext {
        self.slot
            .unwrap_or_else(|| SessionContext::unset(self.operation_id))
    }

    pub fn is_set(&self) -> bool {
        self.slot.is_some()
    }
}
