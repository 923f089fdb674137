//! Test utilities for security chain testing
//!
//! Scripted leaf contexts that record every invocation, so tests can assert
//! which children a chain pass reached and in what order.

#![allow(dead_code)]

use aura_security::{
    inherit_from_parent, AdditionalDescriptor, OpaqueCredentials, ParentAwareSecurityContext,
    Principal, Result, SecurityContext, SecurityError, SharedCredentials, SharedPrincipal,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Install a test subscriber so chain logs show up with `--nocapture`
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// What a scripted context does when asked to authenticate
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Authenticate as the given uid
    Succeed(&'static str),
    /// Return an authentication error with this message
    Fail(&'static str),
    /// Panic with this message
    Panic(&'static str),
    /// Return Ok without authenticating
    Decline,
    /// Authenticate only when the inherited credentials match
    RequireSecret(&'static [u8]),
}

/// Shared, ordered log of invoked context names
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Leaf context driven by a [`Behavior`]
#[derive(Debug)]
pub struct ScriptedContext {
    name: String,
    behavior: Behavior,
    parent_aware: bool,
    log: CallLog,
    calls: AtomicUsize,
    parent_calls: AtomicUsize,
    authenticated: AtomicBool,
    principal: SharedPrincipal,
    credentials: SharedCredentials,
    descriptor: Option<Arc<dyn AdditionalDescriptor>>,
}

impl ScriptedContext {
    pub fn new(name: &str, behavior: Behavior, log: &CallLog) -> Arc<Self> {
        Arc::new(Self::build(name, behavior, false, log))
    }

    pub fn parent_aware(name: &str, behavior: Behavior, log: &CallLog) -> Arc<Self> {
        Arc::new(Self::build(name, behavior, true, log))
    }

    /// Context exposing `descriptor` once authenticated
    pub fn describing(
        name: &str,
        behavior: Behavior,
        log: &CallLog,
        descriptor: Arc<dyn AdditionalDescriptor>,
    ) -> Arc<Self> {
        let mut context = Self::build(name, behavior, false, log);
        context.descriptor = Some(descriptor);
        Arc::new(context)
    }

    fn build(name: &str, behavior: Behavior, parent_aware: bool, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            parent_aware,
            log: Arc::clone(log),
            calls: AtomicUsize::new(0),
            parent_calls: AtomicUsize::new(0),
            authenticated: AtomicBool::new(false),
            principal: Principal::new().into_shared(),
            credentials: OpaqueCredentials::new().into_shared(),
            descriptor: None,
        }
    }

    /// Total authenticate invocations, plain or parent-aware
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parent-aware invocations only
    pub fn parent_calls(&self) -> usize {
        self.parent_calls.load(Ordering::SeqCst)
    }

    /// Working principal, regardless of authentication state
    pub fn working_principal(&self) -> SharedPrincipal {
        Arc::clone(&self.principal)
    }

    /// Working credentials, regardless of authentication state
    pub fn working_credentials(&self) -> SharedCredentials {
        Arc::clone(&self.credentials)
    }

    fn run(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(self.name.clone());

        match &self.behavior {
            Behavior::Succeed(uid) => {
                self.principal.write().set_uid(*uid);
                self.authenticated.store(true, Ordering::SeqCst);
                Ok(())
            }
            Behavior::Fail(message) => Err(SecurityError::authentication(*message)),
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::Decline => Ok(()),
            Behavior::RequireSecret(expected) => {
                let matches = self.credentials.read().as_bytes() == Some(*expected);
                if matches {
                    self.authenticated.store(true, Ordering::SeqCst);
                    Ok(())
                } else {
                    Err(SecurityError::authentication("bad credentials"))
                }
            }
        }
    }
}

impl SecurityContext for ScriptedContext {
    fn authenticate(&self) -> Result<()> {
        self.run()
    }

    fn as_parent_aware(&self) -> Option<&dyn ParentAwareSecurityContext> {
        if self.parent_aware {
            Some(self)
        } else {
            None
        }
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
        if self.is_authenticated() {
            self.descriptor.clone()
        } else {
            None
        }
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
}

impl ParentAwareSecurityContext for ScriptedContext {
    fn authenticate_with_parent(&self, parent: &dyn SecurityContext) -> Result<()> {
        self.parent_calls.fetch_add(1, Ordering::SeqCst);
        inherit_from_parent(parent, &self.principal, &self.credentials);
        self.run()
    }
}
