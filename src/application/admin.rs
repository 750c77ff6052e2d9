use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::BackendError;
use crate::domain::order::{Order, OrderStatus, OrderWithItems};
use crate::domain::ports::{AuthApi, OrderStore};
use crate::domain::session::SessionUser;

/// Backend role required for every back-office operation.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Admin access required")]
    AccessDenied,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Back-office operations, all gated on the backend's role check.
pub struct AdminService {
    auth: Arc<dyn AuthApi>,
    orders: Arc<dyn OrderStore>,
}

impl AdminService {
    pub fn new(auth: Arc<dyn AuthApi>, orders: Arc<dyn OrderStore>) -> Self {
        Self { auth, orders }
    }

    pub async fn require_admin(&self, user: &SessionUser) -> Result<(), AdminError> {
        if self.auth.has_role(user.id, ADMIN_ROLE).await? {
            Ok(())
        } else {
            Err(AdminError::AccessDenied)
        }
    }

    pub async fn recent_orders(
        &self,
        limit: i64,
    ) -> Result<Vec<OrderWithItems>, BackendError> {
        self.orders.recent_orders(limit).await
    }

    /// Overwrites the order status. Any status can follow any other; the
    /// back office is trusted to know what it is doing.
    pub async fn set_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        self.orders.update_status(order_id, status).await
    }

    /// Orders that never left `pending` and were created before `cutoff`.
    /// These are checkouts whose item or status write failed and need manual
    /// review.
    pub async fn stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Order>, BackendError> {
        self.orders.pending_older_than(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryBackend;

    fn service(backend: &Arc<MemoryBackend>) -> AdminService {
        AdminService::new(backend.clone(), backend.clone())
    }

    #[tokio::test]
    async fn users_without_the_role_are_denied() {
        let backend = Arc::new(MemoryBackend::new());
        let user_id = backend.add_user("eve@example.com", "pw", "Eve");
        let admin = service(&backend);

        let user = SessionUser {
            id: user_id,
            email: "eve@example.com".to_string(),
        };
        let result = admin.require_admin(&user).await;

        assert!(matches!(result, Err(AdminError::AccessDenied)));
    }

    #[tokio::test]
    async fn granted_role_passes_the_gate() {
        let backend = Arc::new(MemoryBackend::new());
        let user_id = backend.add_user("root@example.com", "pw", "Root");
        backend.grant_role(user_id, ADMIN_ROLE);
        let admin = service(&backend);

        let user = SessionUser {
            id: user_id,
            email: "root@example.com".to_string(),
        };
        admin.require_admin(&user).await.expect("gate should pass");
    }
}
