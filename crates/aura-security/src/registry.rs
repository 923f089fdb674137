//! Ordered registry of named subcontexts
//!
//! Names are unique and iteration always follows registration order. The
//! registry itself is not synchronised; [`crate::ChainingSecurityContext`]
//! keeps it behind its per-instance lock.

use crate::context::SecurityContext;
use crate::errors::{Result, SecurityError};
use std::fmt;
use std::sync::Arc;

/// One named child of a chain
#[derive(Clone)]
pub struct SubcontextEntry {
    name: String,
    context: Arc<dyn SecurityContext>,
}

impl SubcontextEntry {
    /// Registry name of the child
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The child context
    pub fn context(&self) -> &Arc<dyn SecurityContext> {
        &self.context
    }
}

impl fmt::Debug for SubcontextEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubcontextEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered, uniquely keyed list of subcontexts
#[derive(Debug, Clone, Default)]
pub struct SubcontextRegistry {
    entries: Vec<SubcontextEntry>,
}

impl SubcontextRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named context
    ///
    /// Fails with [`SecurityError::DuplicateSubcontext`] if the name is taken,
    /// leaving the registry untouched.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        context: Arc<dyn SecurityContext>,
    ) -> Result<()> {
        let name = name.into();
        if self.exists(&name) {
            return Err(SecurityError::duplicate_subcontext(name));
        }
        self.entries.push(SubcontextEntry { name, context });
        Ok(())
    }

    /// Whether a context is registered under `name`
    pub fn exists(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Context registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn SecurityContext>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.context))
    }

    /// Registered names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Registered contexts in insertion order
    pub fn contexts(&self) -> Vec<Arc<dyn SecurityContext>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(&entry.context))
            .collect()
    }

    /// Copy of every entry in insertion order
    pub fn snapshot(&self) -> Vec<SubcontextEntry> {
        self.entries.clone()
    }

    /// Number of registered contexts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
