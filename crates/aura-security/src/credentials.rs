//! Opaque credential holder
//!
//! Secret bytes submitted for authentication. The holder copies the bytes in,
//! keeps the first value it is given, and is purged by the chain at the end of
//! every authentication pass.
//!
//! # Security
//!
//! - Secret bytes are copied, never borrowed from the caller
//! - Purging overwrites every byte with zero before releasing the buffer
//! - All sensitive fields are zeroized on drop
//! - `Debug` output never contains the secret

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Shared, lockable credential holder handed out by security contexts
pub type SharedCredentials = Arc<RwLock<OpaqueCredentials>>;

/// Write-once container for secret credential bytes
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct OpaqueCredentials {
    secret: Option<Vec<u8>>,
}

impl OpaqueCredentials {
    /// Create an empty holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this holder into a shared handle
    pub fn into_shared(self) -> SharedCredentials {
        Arc::new(RwLock::new(self))
    }

    /// Store a copy of `credentials`; ignored once a value is present
    pub fn set_credentials(&mut self, credentials: &[u8]) {
        if self.secret.is_none() {
            self.secret = Some(credentials.to_vec());
        }
    }

    /// Store the UTF-8 bytes of `credentials`; ignored once a value is present
    pub fn set_credentials_str(&mut self, credentials: &str) {
        self.set_credentials(credentials.as_bytes());
    }

    /// Whether a secret is currently held
    pub fn is_set(&self) -> bool {
        self.secret.is_some()
    }

    /// Borrow the held secret
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.secret.as_deref()
    }

    /// True when no secret is held or every held byte is zero
    pub fn is_zeroed(&self) -> bool {
        self.secret
            .as_ref()
            .map_or(true, |secret| secret.iter().all(|byte| *byte == 0))
    }

    /// Overwrite the held secret with zeros, then release it
    pub fn purge(&mut self) {
        self.wipe();
        self.secret.zeroize();
    }

    /// Overwrite every held byte with zero, keeping the buffer length
    fn wipe(&mut self) {
        if let Some(secret) = self.secret.as_mut() {
            secret.as_mut_slice().zeroize();
        }
    }
}

impl fmt::Debug for OpaqueCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueCredentials")
            .field("secret", &self.secret.as_ref().map(|s| format!("<{} bytes>", s.len())))
            .finish()
    }
}
