//! Union security context
//!
//! A chain that counts as authenticated when any of its children does. After
//! the pass it adopts the identity and additional descriptor of the first
//! authenticated child, in registration order.

use crate::chaining::ChainingSecurityContext;
use crate::config::ChainingConfig;
use crate::context::SecurityContext;
use crate::credentials::SharedCredentials;
use crate::descriptor::AdditionalDescriptor;
use crate::errors::Result;
use crate::principal::SharedPrincipal;
use std::sync::Arc;

/// Chain that authenticates when at least one child authenticates
#[derive(Debug)]
pub struct UnionSecurityContext {
    chain: ChainingSecurityContext,
}

impl UnionSecurityContext {
    /// Create a union using the process-wide [`ChainingConfig`]
    pub fn new() -> Self {
        Self::from_chain(ChainingSecurityContext::new())
    }

    /// Create a union with an explicit configuration
    pub fn with_config(config: ChainingConfig) -> Self {
        Self::from_chain(ChainingSecurityContext::with_config(config))
    }

    /// Wrap an existing chain
    pub fn from_chain(chain: ChainingSecurityContext) -> Self {
        Self { chain }
    }

    /// The underlying chain
    pub fn chain(&self) -> &ChainingSecurityContext {
        &self.chain
    }

    /// Whether a child is registered under `name`
    pub fn does_sub_context_exist(&self, name: &str) -> bool {
        self.chain.does_sub_context_exist(name)
    }

    fn adopt_identity(&self, child: &dyn SecurityContext) {
        if let Some(descriptor) = child.additional_descriptor() {
            self.chain.adopt_descriptor(descriptor);
        }

        let Some(source) = child.principal() else {
            return;
        };
        let (uid, full_name) = {
            let source = source.read();
            (
                source.uid().map(str::to_owned),
                source.full_name().map(str::to_owned),
            )
        };

        let principal = self.chain.principal_instance();
        let mut target = principal.write();
        if let Some(uid) = uid {
            target.set_uid(uid);
        }
        if let Some(full_name) = full_name {
            target.set_full_name(full_name);
        }
    }
}

impl Default for UnionSecurityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityContext for UnionSecurityContext {
    fn authenticate(&self) -> Result<()> {
        self.chain.with_exclusive_access(|chain| {
            chain.authenticate()?;

            let names = chain.sub_context_names();
            let first = names
                .iter()
                .zip(chain.sub_contexts())
                .find(|(_, child)| child.is_authenticated());

            match first {
                Some((name, child)) => {
                    self.adopt_identity(child.as_ref());
                    chain.mark_authenticated();
                    tracing::debug!(child = %name, "Union authenticated through subcontext");
                }
                None => tracing::debug!("No subcontext authenticated"),
            }
            Ok(())
        })
    }

    fn is_authenticated(&self) -> bool {
        self.chain.is_authenticated()
    }

    fn principal(&self) -> Option<SharedPrincipal> {
        self.chain.principal()
    }

    fn opaque_credentials(&self) -> Option<SharedCredentials> {
        self.chain.opaque_credentials()
    }

    fn additional_descriptor(&self) -> Option<Arc<dyn AdditionalDescriptor>> {
        self.chain.additional_descriptor()
    }

    fn principal_instance(&self) -> SharedPrincipal {
        self.chain.principal_instance()
    }

    fn opaque_credentials_instance(&self) -> SharedCredentials {
        self.chain.opaque_credentials_instance()
    }

    fn add_sub_context(&self, name: &str, context: Arc<dyn SecurityContext>) -> Result<()> {
        self.chain.add_sub_context(name, context)
    }

    fn sub_context(&self, name: &str) -> Option<Arc<dyn SecurityContext>> {
        self.chain.sub_context(name)
    }

    fn sub_contexts(&self) -> Vec<Arc<dyn SecurityContext>> {
        self.chain.sub_contexts()
    }

    fn sub_context_names(&self) -> Vec<String> {
        self.chain.sub_context_names()
    }
}
