//! Session Context
//!
//! Owns the authenticated identity and its `users` profile row. The
//! [`Session`] handle is a cheap clone shared with the other stores, so
//! they can ask "who am I" without reaching back into the context.

use crate::error::{StoreError, StoreResult};
use crate::persist::{DeviceStorage, SESSION_KEY};
use shared::models::{ProfileInsert, ProfileUpdate, Role, UserProfile};
use std::sync::Arc;
use tokio::sync::RwLock;
use verda_client::{AuthApi, AuthEvent, AuthSession, AuthUser, RowStore, SelectQuery};

#[derive(Debug, Default)]
struct SessionState {
    user: Option<AuthUser>,
    profile: Option<UserProfile>,
}

/// Shared read view of the signed-in identity
///
/// Cloning shares the underlying state with every other holder.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.inner.read().await.user.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.inner.read().await.user.as_ref().map(|u| u.id.clone())
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.inner.read().await.profile.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.user.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.inner
            .read()
            .await
            .profile
            .as_ref()
            .is_some_and(UserProfile::is_admin)
    }

    /// Signed-in user id, or [`StoreError::Unauthenticated`].
    pub(crate) async fn require_user_id(&self) -> StoreResult<String> {
        self.user_id().await.ok_or(StoreError::Unauthenticated)
    }

    async fn set(&self, user: AuthUser, profile: Option<UserProfile>) {
        let mut state = self.inner.write().await;
        state.user = Some(user);
        state.profile = profile;
    }

    async fn set_profile(&self, profile: Option<UserProfile>) {
        self.inner.write().await.profile = profile;
    }

    async fn clear(&self) {
        let mut state = self.inner.write().await;
        state.user = None;
        state.profile = None;
    }
}

/// Auth lifecycle store
pub struct SessionContext<A, R> {
    auth: Arc<A>,
    rows: Arc<R>,
    storage: Arc<DeviceStorage>,
    session: Session,
}

impl<A, R> SessionContext<A, R>
where
    A: AuthApi + 'static,
    R: RowStore + 'static,
{
    pub fn new(auth: Arc<A>, rows: Arc<R>, storage: Arc<DeviceStorage>) -> Self {
        Self {
            auth,
            rows,
            storage,
            session: Session::default(),
        }
    }

    /// Handle for injecting into the other stores.
    pub fn session(&self) -> Session {
        self.session.clone()
    }

    /// Restore any persisted session and start following auth events.
    ///
    /// A persisted session is adopted without a network round trip; its
    /// profile row is then resolved best-effort, so a dead network still
    /// opens the app signed in.
    pub async fn initialize(&self) -> StoreResult<()> {
        if let Some(saved) = self.storage.load::<AuthSession>(SESSION_KEY) {
            tracing::info!(user = %saved.user.email, "restoring persisted session");
            self.auth.restore(&saved);
            let profile = self.fetch_profile(&saved.user.id).await;
            self.session.set(saved.user, profile).await;
        }

        let mut events = self.auth.subscribe();
        let session = self.session.clone();
        let rows = Arc::clone(&self.rows);
        let storage = Arc::clone(&self.storage);
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    AuthEvent::SignedIn(user) => {
                        let profile = resolve_profile(rows.as_ref(), &user.id).await;
                        session.set(user, profile).await;
                    }
                    AuthEvent::SignedOut => {
                        storage.remove(SESSION_KEY);
                        session.clear().await;
                    }
                }
            }
        });
        Ok(())
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> StoreResult<AuthUser> {
        let auth_session = self.auth.sign_up(email, password).await?;
        let user = auth_session.user.clone();

        let insert = ProfileInsert {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: full_name.map(str::to_string),
            role: Role::Customer,
        };
        let profile = match self.rows.insert_one::<UserProfile, _>("users", &insert).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "profile row creation failed after sign-up");
                None
            }
        };

        self.storage.save(SESSION_KEY, &auth_session);
        self.session.set(user.clone(), profile).await;
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthUser> {
        let auth_session = self.auth.sign_in(email, password).await?;
        let user = auth_session.user.clone();
        let profile = self.fetch_profile(&user.id).await;

        self.storage.save(SESSION_KEY, &auth_session);
        self.session.set(user.clone(), profile).await;
        Ok(user)
    }

    pub async fn sign_out(&self) -> StoreResult<()> {
        self.auth.sign_out().await?;
        self.storage.remove(SESSION_KEY);
        self.session.clear().await;
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> StoreResult<()> {
        self.auth.reset_password(email).await?;
        Ok(())
    }

    pub async fn update_profile(&self, patch: ProfileUpdate) -> StoreResult<UserProfile> {
        let user_id = self.session.require_user_id().await?;
        let updated: UserProfile = self
            .rows
            .update("users", SelectQuery::new().eq("id", &user_id), &patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Remote(verda_client::ClientError::NotFound("users".into())))?;
        self.session.set_profile(Some(updated.clone())).await;
        Ok(updated)
    }

    /// Re-read the profile row for the signed-in user.
    pub async fn refresh_profile(&self) -> StoreResult<Option<UserProfile>> {
        let user_id = self.session.require_user_id().await?;
        let profile = self.fetch_profile(&user_id).await;
        self.session.set_profile(profile.clone()).await;
        Ok(profile)
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.session.current_user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn is_admin(&self) -> bool {
        self.session.is_admin().await
    }

    async fn fetch_profile(&self, user_id: &str) -> Option<UserProfile> {
        resolve_profile(self.rows.as_ref(), user_id).await
    }
}

async fn resolve_profile<R: RowStore>(rows: &R, user_id: &str) -> Option<UserProfile> {
    match rows
        .select_one::<UserProfile>("users", SelectQuery::new().eq("id", user_id))
        .await
    {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "profile resolution failed");
            None
        }
    }
}
