//! Additional descriptor extension point

use std::fmt;

/// Extra data a security context exposes after authentication
///
/// Carries no required fields. Collaborators attach richer descriptors
/// through [`crate::ChainingSecurityContext::with_descriptor`].
pub trait AdditionalDescriptor: Send + Sync + fmt::Debug {}

/// Placeholder descriptor installed by default on every chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainingAdditionalDescriptor;

impl AdditionalDescriptor for ChainingAdditionalDescriptor {}
