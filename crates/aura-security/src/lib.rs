//! Aura Security Chain
//!
//! Composite security contexts that do not validate credentials themselves but
//! drive an ordered chain of named child contexts, each a pluggable authenticator.
//!
//! This crate handles WHICH authenticators run and in WHAT order:
//! - "Try the directory check, then the local database, then the guest fallback"
//! - "Stop as soon as one of them reports success"
//! - "Zero the submitted secret once the pass is over, whatever happened"
//!
//! Leaf authenticators implement [`SecurityContext`] (and optionally
//! [`ParentAwareSecurityContext`]) and decide their own outcome. The chain only
//! sequences them, isolates their failures, and purges credential material.

pub mod chaining;
pub mod config;
pub mod context;
pub mod credentials;
pub mod descriptor;
pub mod errors;
pub mod principal;
pub mod registry;
pub mod union;

// Re-export commonly used types
pub use chaining::ChainingSecurityContext;
pub use config::{ChainingConfig, SecurityProperties, STOP_WHEN_AUTHENTICATED_KEY};
pub use context::{inherit_from_parent, ParentAwareSecurityContext, SecurityContext};
pub use credentials::{OpaqueCredentials, SharedCredentials};
pub use descriptor::{AdditionalDescriptor, ChainingAdditionalDescriptor};
pub use errors::{Result, SecurityError};
pub use principal::{Principal, SharedPrincipal};
pub use registry::{SubcontextEntry, SubcontextRegistry};
pub use union::UnionSecurityContext;
