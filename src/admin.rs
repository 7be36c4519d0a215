//! Admin-set membership and directory enumeration.
//!
//! The first admin is installed with [`QuotaGuard::bootstrap_admin`], which
//! only succeeds while the set is empty. After that, only admins can change
//! membership, and the last admin cannot be removed.

use tower_service::Service;

use crate::error::{QuotaError, Result};
use crate::guard::{storage_failure, QuotaGuard};
use crate::identity::CallerIdentity;
use crate::model::UserProfile;
use crate::store::QuotaStore;
use crate::telemetry::{QuotaEvent, QuotaSink};

impl<S, K> QuotaGuard<S, K>
where
    S: QuotaStore + 'static,
    K: QuotaSink,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
{
    /// Install `caller` as the first admin. Fails once any admin exists.
    pub async fn bootstrap_admin(&self, caller: &CallerIdentity) -> Result<()> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("become an admin"));
        }
        let _lock = self.locks.admins().await;
        if self.store.admin_count().await.map_err(storage_failure)? > 0 {
            return Err(QuotaError::PermissionDenied("An admin already exists".into()));
        }
        self.store.add_admin(caller).await.map_err(storage_failure)?;
        tracing::info!(identity = %caller, "admin bootstrapped");
        self.emit(QuotaEvent::AdminChanged { identity: caller.clone(), granted: true }).await;
        Ok(())
    }

    /// Whether `id` is in the admin set. Anonymous is never an admin.
    pub async fn is_admin(&self, id: &CallerIdentity) -> Result<bool> {
        if id.is_anonymous() {
            return Ok(false);
        }
        self.store.is_admin(id).await.map_err(storage_failure)
    }

    /// Grant admin to `target`. Returns `false` if it already was one.
    pub async fn add_admin(&self, caller: &CallerIdentity, target: &CallerIdentity) -> Result<bool> {
        if target.is_anonymous() {
            return Err(QuotaError::AnonymousNotAllowed(
                "The anonymous caller cannot be an admin".into(),
            ));
        }
        let _lock = self.locks.admins().await;
        self.require_admin(caller).await?;
        let added = self.store.add_admin(target).await.map_err(storage_failure)?;
        if added {
            tracing::info!(by = %caller, identity = %target, "admin granted");
            self.emit(QuotaEvent::AdminChanged { identity: target.clone(), granted: true }).await;
        }
        Ok(added)
    }

    /// Revoke admin from `target`. Returns `false` if it was not one.
    pub async fn remove_admin(
        &self,
        caller: &CallerIdentity,
        target: &CallerIdentity,
    ) -> Result<bool> {
        if target.is_anonymous() {
            return Err(QuotaError::AnonymousNotAllowed(
                "The anonymous caller cannot be an admin".into(),
            ));
        }
        let _lock = self.locks.admins().await;
        self.require_admin(caller).await?;
        if !self.store.is_admin(target).await.map_err(storage_failure)? {
            return Ok(false);
        }
        if self.store.admin_count().await.map_err(storage_failure)? <= 1 {
            return Err(QuotaError::PermissionDenied("Cannot remove the last admin".into()));
        }
        let removed = self.store.remove_admin(target).await.map_err(storage_failure)?;
        if removed {
            tracing::info!(by = %caller, identity = %target, "admin revoked");
            self.emit(QuotaEvent::AdminChanged { identity: target.clone(), granted: false }).await;
        }
        Ok(removed)
    }

    /// Every admin, sorted.
    pub async fn list_admins(&self, caller: &CallerIdentity) -> Result<Vec<CallerIdentity>> {
        self.require_admin(caller).await?;
        self.store.admins().await.map_err(storage_failure)
    }

    /// Every user's public profile, sorted by identity.
    pub async fn list_users(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<(CallerIdentity, UserProfile)>> {
        self.require_admin(caller).await?;
        let users = self.store.users().await.map_err(storage_failure)?;
        Ok(users.into_iter().map(|(id, user)| (id, user.profile())).collect())
    }

    async fn require_admin(&self, caller: &CallerIdentity) -> Result<()> {
        if caller.is_anonymous() {
            return Err(QuotaError::anonymous("perform admin actions"));
        }
        if self.store.is_admin(caller).await.map_err(storage_failure)? {
            Ok(())
        } else {
            Err(QuotaError::PermissionDenied("Admin privileges required".into()))
        }
    }
}
