//! Principal holder
//!
//! The identity a security context is trying to establish. `uid` and
//! `full_name` are write-once so that a child further down a chain cannot
//! replace an identity an earlier context already committed to.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared, lockable principal holder handed out by security contexts
pub type SharedPrincipal = Arc<RwLock<Principal>>;

/// Identity of the party being authenticated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    global_uid: Option<String>,
    uid: Option<String>,
    full_name: Option<String>,
}

impl Principal {
    /// Create an empty principal
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a principal carrying over every field of `other`
    ///
    /// This is the only way `global_uid` gets a value.
    pub fn from_principal(other: &Principal) -> Self {
        other.clone()
    }

    /// Wrap this principal into a shared holder
    pub fn into_shared(self) -> SharedPrincipal {
        Arc::new(RwLock::new(self))
    }

    /// Globally unique identifier, if copied from another principal
    pub fn global_uid(&self) -> Option<&str> {
        self.global_uid.as_deref()
    }

    /// Local user identifier
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Human readable name
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Set the user identifier; ignored once a value is present
    pub fn set_uid(&mut self, uid: impl Into<String>) {
        if self.uid.is_none() {
            self.uid = Some(uid.into());
        }
    }

    /// Set the human readable name; ignored once a value is present
    pub fn set_full_name(&mut self, full_name: impl Into<String>) {
        if self.full_name.is_none() {
            self.full_name = Some(full_name.into());
        }
    }

    /// Whether neither `uid` nor `full_name` has been assigned
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.full_name.is_none()
    }
}
