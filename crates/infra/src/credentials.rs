//! API key storage backed by the system keyring

use keyring::Entry;
use packtrail_core::sync::ports::CredentialStore;
use packtrail_domain::{ApiProvider, PacktrailError, Result};

const SERVICE_NAME: &str = "com.packtrail.app";

/// System-keyring implementation of the credential store.
///
/// Keys are stored under one service name with a per-provider account.
#[derive(Debug, Default)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    /// Create a new credential store.
    pub fn new() -> Self {
        Self
    }

    fn entry(provider: ApiProvider) -> Result<Entry> {
        Entry::new(SERVICE_NAME, provider.credential_account())
            .map_err(|e| PacktrailError::Storage(format!("failed to access keyring: {e}")))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn read(&self, provider: ApiProvider) -> Result<Option<String>> {
        match Self::entry(provider)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(PacktrailError::Storage(format!("failed to read API key: {e}"))),
        }
    }

    fn write(&self, provider: ApiProvider, secret: &str) -> Result<()> {
        Self::entry(provider)?
            .set_password(secret)
            .map_err(|e| PacktrailError::Storage(format!("failed to store API key: {e}")))
    }

    fn delete(&self, provider: ApiProvider) -> Result<()> {
        match Self::entry(provider)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(PacktrailError::Storage(format!("failed to delete API key: {e}"))),
        }
    }
}
