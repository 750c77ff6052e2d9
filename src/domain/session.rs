use uuid::Uuid;

/// The identity a bearer token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated backend session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub user: SessionUser,
}

/// Sign-in/sign-out notification published on the account event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn(SessionUser),
    SignedOut,
}
