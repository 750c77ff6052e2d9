use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::errors::BackendError;
use crate::domain::order::OrderWithItems;
use crate::domain::ports::{AuthApi, OrderStore, ProfileStore};
use crate::domain::profile::{Profile, ProfileUpdate};
use crate::domain::session::{AuthChange, AuthSession, SessionUser};

const AUTH_EVENT_CAPACITY: usize = 16;

/// Account lifecycle: sessions, profile, order history.
///
/// Sign-in and sign-out are announced on a broadcast channel so interested
/// parts of the process can react without the service knowing about them.
/// Publishing never blocks; a subscriber that falls behind misses events.
pub struct AccountService {
    auth: Arc<dyn AuthApi>,
    profiles: Arc<dyn ProfileStore>,
    orders: Arc<dyn OrderStore>,
    events: broadcast::Sender<AuthChange>,
}

impl AccountService {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        profiles: Arc<dyn ProfileStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            auth,
            profiles,
            orders,
            events,
        }
    }

    /// Creates the account and signs it in. The backend provisions the
    /// matching profile row itself.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession, BackendError> {
        let session = self.auth.sign_up(email, password, full_name).await?;
        let _ = self.events.send(AuthChange::SignedIn(session.user.clone()));
        Ok(session)
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let session = self.auth.sign_in(email, password).await?;
        let _ = self.events.send(AuthChange::SignedIn(session.user.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.auth.sign_out(access_token).await?;
        let _ = self.events.send(AuthChange::SignedOut);
        Ok(())
    }

    pub async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionUser>, BackendError> {
        self.auth.current_user(access_token).await
    }

    pub async fn profile(&self, user: &SessionUser) -> Result<Profile, BackendError> {
        self.profiles.find(user.id).await?.ok_or(BackendError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user: &SessionUser,
        update: ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        if update.is_empty() {
            return self.profile(user).await;
        }
        self.profiles.update(user.id, update).await
    }

    /// The user's orders with items, newest first.
    pub async fn order_history(
        &self,
        user: &SessionUser,
    ) -> Result<Vec<OrderWithItems>, BackendError> {
        self.orders.orders_for_user(user.id).await
    }

    /// Subscribe to sign-in/sign-out notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
