//! SigV4 credentials resolved from the metadata store.

use std::sync::Arc;

use async_trait::async_trait;
use courier_s3_auth::{AuthError, Credential, CredentialProvider};
use tracing::debug;

use crate::state::MetadataStore;

/// A [`CredentialProvider`] that looks users up in a [`MetadataStore`].
#[derive(Clone)]
pub struct StoreCredentialProvider {
    store: Arc<dyn MetadataStore>,
}

impl std::fmt::Debug for StoreCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentialProvider").finish_non_exhaustive()
    }
}

impl StoreCredentialProvider {
    /// Create a provider over `store`.
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CredentialProvider for StoreCredentialProvider {
    async fn get_credential(&self, access_key_id: &str) -> Result<Credential, AuthError> {
        let user = self
            .store
            .find_user(access_key_id)
            .await
            .map_err(|e| AuthError::CredentialLookup(e.to_string()))?
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))?;

        debug!(access_key_id, "Resolved credential");
        Ok(Credential {
            secret_key: user.secret_key,
            display_name: user.name,
        })
    }
}
