//! Error type for security context operations

/// Errors raised by security contexts and the chain that drives them
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityError {
    /// A subcontext with the same name is already registered
    #[error("Subcontext already exists: {name}")]
    DuplicateSubcontext {
        /// Name that was registered twice
        name: String,
    },

    /// Lookup of an unknown subcontext
    ///
    /// Only ever built for diagnostics; lookups report a miss as `None`.
    #[error("No such subcontext: {name}")]
    SubcontextNotFound {
        /// Name that was looked up
        name: String,
    },

    /// A leaf context rejected the supplied principal or credentials
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Reason reported by the authenticator
        message: String,
    },

    /// A child context failed while the chain was driving it
    #[error("Subcontext {child} failed to authenticate: {message}")]
    ChildAuthentication {
        /// Registry name of the failing child
        child: String,
        /// Rendered error or panic payload
        message: String,
    },

    /// Operation is not available on this kind of context
    #[error("Unsupported operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation
        operation: String,
    },

    /// Security properties could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration failure
        message: String,
    },
}

impl SecurityError {
    /// Create a duplicate subcontext error
    pub fn duplicate_subcontext(name: impl Into<String>) -> Self {
        Self::DuplicateSubcontext { name: name.into() }
    }

    /// Create a subcontext not found error
    pub fn subcontext_not_found(name: impl Into<String>) -> Self {
        Self::SubcontextNotFound { name: name.into() }
    }

    /// Create an authentication failure
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a child authentication failure
    pub fn child_authentication(child: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChildAuthentication {
            child: child.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard Result type for security context operations
pub type Result<T> = std::result::Result<T, SecurityError>;

impl From<std::io::Error> for SecurityError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::de::Error> for SecurityError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Invalid TOML: {err}"))
    }
}
