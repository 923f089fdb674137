//! Chaining security context
//!
//! A composite context that authenticates nothing itself. It walks its
//! registered children in order, hands each the chain as parent when the child
//! asks for it, isolates child failures, honours the stop policy, and always
//! purges the credential secret when the pass ends.
//!
//! # Concurrency
//!
//! Registry access and authentication passes on one chain are serialised by a
//! single reentrant lock. A child calling back into its parent from the same
//! thread during a pass re-enters that lock instead of deadlocking. Other
//! threads wait until the pass completes. Children run strictly one after
//! another with no timeout; a child that blocks stalls the whole pass.

use crate::config::ChainingConfig;
use crate::context::SecurityContext;
use crate::credentials::{OpaqueCredentials, SharedCredentials};
use crate::descriptor::{AdditionalDescriptor, ChainingAdditionalDescriptor};
use crate::errors::{Result, SecurityError};
use crate::principal::{Principal, SharedPrincipal};
use crate::registry::{SubcontextEntry, SubcontextRegistry};
use parking_lot::{ReentrantMutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Composite security context driving an ordered chain of children
pub struct ChainingSecurityContext {
    config: ChainingConfig,
    authenticated: AtomicBool,
    principal: SharedPrincipal,
    credentials: SharedCredentials,
    descriptor: RwLock<Arc<dyn AdditionalDescriptor>>,
    registry: ReentrantMutex<RefCell<SubcontextRegistry>>,
}

impl ChainingSecurityContext {
    /// Create a chain using the process-wide [`ChainingConfig`]
    pub fn new() -> Self {
        Self::with_config(*ChainingConfig::global())
    }

    /// Create a chain with an explicit configuration
    pub fn with_config(config: ChainingConfig) -> Self {
        Self {
            config,
            authenticated: AtomicBool::new(false),
            principal: Principal::new().into_shared(),
            credentials: OpaqueCredentials::new().into_shared(),
            descriptor: RwLock::new(Arc::new(ChainingAdditionalDescriptor)),
            registry: ReentrantMutex::new(RefCell::new(SubcontextRegistry::new())),
        }
    }

    /// Replace the placeholder descriptor with a richer one
    pub fn with_descriptor(mut self, descriptor: Arc<dyn AdditionalDescriptor>) -> Self {
        *self.descriptor.get_mut() = descriptor;
        self
    }

    /// Configuration this chain was built with
    pub fn config(&self) -> &ChainingConfig {
        &self.config
    }

    /// Mark this chain itself as authenticated
    ///
    /// The traversal never does this on its own; composing contexts such as
    /// [`crate::UnionSecurityContext`] decide when the chain as a whole counts
    /// as authenticated.
    pub(crate) fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    /// Expose `descriptor` instead of the current one once authenticated
    pub(crate) fn adopt_descriptor(&self, descriptor: Arc<dyn AdditionalDescriptor>) {
        *self.descriptor.write() = descriptor;
    }

    /// Whether a child is registered under `name`
    pub fn does_sub_context_exist(&self, name: &str) -> bool {
        let registry = self.registry.lock();
        let exists = registry.borrow().exists(name);
        exists
    }

    /// Number of registered children
    pub fn len(&self) -> usize {
        let registry = self.registry.lock();
        let len = registry.borrow().len();
        len
    }

    /// Whether no children are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` while holding this chain's exclusive lock
    pub(crate) fn with_exclusive_access<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.registry.lock();
        f(self)
    }

    fn authenticate_child(&self, entry: &SubcontextEntry) {
        let context = entry.context();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match context.as_parent_aware() {
            Some(parent_aware) => parent_aware.authenticate_with_parent(self),
            None => context.authenticate(),
        }));

        let failure = match outcome {
            Ok(Ok(())) => {
                tracing::debug!(
                    child = %entry.name(),
                    authenticated = context.is_authenticated(),
                    "Subcontext authentication attempted"
                );
                return;
            }
            Ok(Err(err)) => SecurityError::child_authentication(entry.name(), err.to_string()),
            Err(payload) => {
                SecurityError::child_authentication(entry.name(), panic_message(payload.as_ref()))
            }
        };

        tracing::error!(
            child = %entry.name(),
            context = ?context,
            error = %failure,
            "Exception authenticating subcontext"
        );
    }
}

impl Default for ChainingSecurityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChainingSecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .registry
            .try_lock()
            .and_then(|registry| registry.try_borrow().ok().map(|r| r.names()));
        f.debug_struct("ChainingSecurityContext")
            .field("authenticated", &self.is_authenticated())
            .field("stop_when_authenticated", &self.config.stop_when_authenticated)
            .field("sub_contexts", &names)
            .finish_non_exhaustive()
    }
}

/// Zeroes and releases secrets when a pass ends, unwinding included
///
/// Covers the chain's own buffer and the copies parent-aware children took
/// from it during the pass.
struct CredentialPurge<'a> {
    own: &'a SharedCredentials,
    inheritors: Vec<Arc<dyn SecurityContext>>,
}

impl<'a> CredentialPurge<'a> {
    fn new(own: &'a SharedCredentials) -> Self {
        Self {
            own,
            inheritors: Vec::new(),
        }
    }

    fn track(&mut self, child: &Arc<dyn SecurityContext>) {
        if child.as_parent_aware().is_some() {
            self.inheritors.push(Arc::clone(child));
        }
    }
}

impl Drop for CredentialPurge<'_> {
    fn drop(&mut self) {
        for child in &self.inheritors {
            if let Some(credentials) = child.opaque_credentials() {
                if !Arc::ptr_eq(&credentials, self.own) {
                    credentials.write().purge();
                }
            }
            let working = child.opaque_credentials_instance();
            if !Arc::ptr_eq(&working, self.own) {
                working.write().purge();
            }
        }
        self.own.write().purge();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

impl SecurityContext for ChainingSecurityContext {
    fn authenticate(&self) -> Result<()> {
        let registry = self.registry.lock();
        let mut purge = CredentialPurge::new(&self.credentials);
        let entries = registry.borrow().snapshot();

        for entry in &entries {
            purge.track(entry.context());
            self.authenticate_child(entry);

            if self.config.stop_when_authenticated && entry.context().is_authenticated() {
                tracing::debug!(child = %entry.name(), "Subcontext authenticated, stopping chain");
                break;
            }
        }

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
        self.is_authenticated().then(|| Arc::clone(&*self.descriptor.read()))
    }

    fn principal_instance(&self) -> SharedPrincipal {
        if self.is_authenticated() {
            Principal::new().into_shared()
        } else {
            Arc::clone(&self.principal)
        }
    }

    fn opaque_credentials_instance(&self) -> SharedCredentials {
        if self.is_authenticated() {
            OpaqueCredentials::new().into_shared()
        } else {
            Arc::clone(&self.credentials)
        }
    }

    fn add_sub_context(&self, name: &str, context: Arc<dyn SecurityContext>) -> Result<()> {
        let registry = self.registry.lock();
        let result = registry.borrow_mut().add(name, context);
        if let Err(err) = &result {
            tracing::error!(child = %name, error = %err, "Subcontext already exists");
        }
        result
    }

    fn sub_context(&self, name: &str) -> Option<Arc<dyn SecurityContext>> {
        let registry = self.registry.lock();
        let found = registry.borrow().get(name);
        if found.is_none() {
            let miss = SecurityError::subcontext_not_found(name);
            tracing::debug!(child = %name, error = %miss, "No such subcontext");
        }
        found
    }

    fn sub_contexts(&self) -> Vec<Arc<dyn SecurityContext>> {
        let registry = self.registry.lock();
        let contexts = registry.borrow().contexts();
        contexts
    }

    fn sub_context_names(&self) -> Vec<String> {
        let registry = self.registry.lock();
        let names = registry.borrow().names();
        names
    }
}
