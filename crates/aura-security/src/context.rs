//! Security context capability contract
//!
//! Every authenticator, leaf or composite, implements [`SecurityContext`].
//! Contexts that want the principal and credentials their parent already
//! holds additionally implement [`ParentAwareSecurityContext`] and advertise
//! it through [`SecurityContext::as_parent_aware`].

use crate::credentials::SharedCredentials;
use crate::descriptor::AdditionalDescriptor;
use crate::errors::{Result, SecurityError};
use crate::principal::SharedPrincipal;
use std::fmt;
use std::sync::Arc;

/// Capability contract shared by all security contexts
///
/// Methods take `&self`: contexts are shared behind `Arc` once registered in a
/// chain, so implementations keep their state behind interior locks.
pub trait SecurityContext: Send + Sync + fmt::Debug {
    /// Attempt authentication with the principal and credentials held so far
    fn authenticate(&self) -> Result<()>;

    /// Parent-aware view of this context, if it supports one
    fn as_parent_aware(&self) -> Option<&dyn ParentAwareSecurityContext> {
        None
    }

    /// Whether this context considers itself authenticated
    fn is_authenticated(&self) -> bool;

    /// Authenticated principal; `None` until authenticated
    fn principal(&self) -> Option<SharedPrincipal>;

    /// Authenticated credentials; `None` until authenticated
    fn opaque_credentials(&self) -> Option<SharedCredentials>;

    /// Additional descriptor; `None` until authenticated
    fn additional_descriptor(&self) -> Option<Arc<dyn AdditionalDescriptor>>;

    /// Working principal holder
    ///
    /// Returns the live holder before authentication and a fresh, empty one
    /// afterwards, so authenticated state cannot be altered through it.
    fn principal_instance(&self) -> SharedPrincipal;

    /// Working credential holder, with the same rules as
    /// [`SecurityContext::principal_instance`]
    fn opaque_credentials_instance(&self) -> SharedCredentials;

    /// Register a named child context
    fn add_sub_context(&self, name: &str, _context: Arc<dyn SecurityContext>) -> Result<()> {
        Err(SecurityError::unsupported(format!("add_sub_context({name})")))
    }

    /// Look up a child context by name
    fn sub_context(&self, _name: &str) -> Option<Arc<dyn SecurityContext>> {
        None
    }

    /// Child contexts in registration order
    fn sub_contexts(&self) -> Vec<Arc<dyn SecurityContext>> {
        Vec::new()
    }

    /// Child names in registration order
    fn sub_context_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Optional capability: authenticate with access to the parent context
pub trait ParentAwareSecurityContext: SecurityContext {
    /// Authenticate after reading whatever the parent has already established
    fn authenticate_with_parent(&self, parent: &dyn SecurityContext) -> Result<()>;
}

/// Copy the parent's working principal and credentials into a child's holders
///
/// Write-once rules apply on the child side: values the child already holds
/// are kept.
pub fn inherit_from_parent(
    parent: &dyn SecurityContext,
    principal: &SharedPrincipal,
    credentials: &SharedCredentials,
) {
    let parent_principal = parent.principal_instance();
    if !Arc::ptr_eq(&parent_principal, principal) {
        let (uid, full_name) = {
            let source = parent_principal.read();
            (
                source.uid().map(str::to_owned),
                source.full_name().map(str::to_owned),
            )
        };
        let mut target = principal.write();
        if let Some(uid) = uid {
            target.set_uid(uid);
        }
        if let Some(full_name) = full_name {
            target.set_full_name(full_name);
        }
    }

    let parent_credentials = parent.opaque_credentials_instance();
    if !Arc::ptr_eq(&parent_credentials, credentials) {
        let source = parent_credentials.read();
        if let Some(secret) = source.as_bytes() {
            credentials.write().set_credentials(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::OpaqueCredentials;
    use crate::principal::Principal;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default)]
    struct Holder {
        principal: SharedPrincipal,
        credentials: SharedCredentials,
        authenticated: AtomicBool,
    }

    impl SecurityContext for Holder {
        fn authenticate(&self) -> Result<()> {
            self.authenticated.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_authenticated(&self) -> bool {
            self.authenticated.load(Ordering::SeqCst)
        }

        fn principal(&self) -> Option<SharedPrincipal> {
            self.is_authenticated().then(|| Arc::clone(&self.principal))
        }

        fn opaque_credentials(&self) -> Option<SharedCredentials> {
            self.is_authenticated().then(|| Arc::clone(&self.credentials))
        }

        fn additional_descriptor(&self) -> Option<Arc<dyn AdditionalDescriptor>> {
            None
        }

        fn principal_instance(&self) -> SharedPrincipal {
            Arc::clone(&self.principal)
        }

        fn opaque_credentials_instance(&self) -> SharedCredentials {
            Arc::clone(&self.credentials)
        }
    }

    #[test]
    fn test_leaf_rejects_sub_contexts() {
        let leaf = Holder::default();
        let result = leaf.add_sub_context("child", Arc::new(Holder::default()));

        assert!(matches!(result, Err(SecurityError::Unsupported { .. })));
        assert!(leaf.sub_context("child").is_none());
        assert!(leaf.sub_contexts().is_empty());
        assert!(leaf.sub_context_names().is_empty());
        assert!(leaf.as_parent_aware().is_none());
    }

    #[test]
    fn test_inherit_copies_parent_state() {
        let parent = Holder::default();
        parent.principal.write().set_uid("alice");
        parent.credentials.write().set_credentials(b"secret");

        let principal = Principal::new().into_shared();
        let credentials = OpaqueCredentials::new().into_shared();
        inherit_from_parent(&parent, &principal, &credentials);

        assert_eq!(principal.read().uid(), Some("alice"));
        assert_eq!(credentials.read().as_bytes(), Some(&b"secret"[..]));
    }

    #[test]
    fn test_inherit_keeps_child_values() {
        let parent = Holder::default();
        parent.principal.write().set_uid("alice");
        parent.principal.write().set_full_name("Alice");
        parent.credentials.write().set_credentials(b"parent");

        let mut own = Principal::new();
        own.set_uid("bob");
        let principal = own.into_shared();
        let mut own_credentials = OpaqueCredentials::new();
        own_credentials.set_credentials(b"child");
        let credentials = own_credentials.into_shared();

        inherit_from_parent(&parent, &principal, &credentials);

        assert_eq!(principal.read().uid(), Some("bob"));
        assert_eq!(principal.read().full_name(), Some("Alice"));
        assert_eq!(credentials.read().as_bytes(), Some(&b"child"[..]));
    }

    #[test]
    fn test_inherit_from_self_is_noop() {
        let parent = Holder::default();
        parent.principal.write().set_uid("alice");

        inherit_from_parent(&parent, &parent.principal, &parent.credentials);
        assert_eq!(parent.principal.read().uid(), Some("alice"));
    }
}
