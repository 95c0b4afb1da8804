//! Failure taxonomy and error-channel reporting.
//!
//! No error here crosses a component boundary as a Rust error: every rejected
//! operation is converted into a synchronous `error` event carrying the
//! operation name and a reason string, and the triggering call returns a
//! sentinel. Callers that ignore return values learn about failures only by
//! subscribing to the error channel.

use std::fmt;

use datapool_core::{events, NotificationPort, Value};

/// Which mutation hit the constant lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantAction {
    /// A `set` on a constant-marked key.
    Override,
    /// A `remove` on a constant-marked key.
    Remove,
}

impl fmt::Display for ConstantAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Override => "override",
            Self::Remove => "remove",
        })
    }
}

/// Why a store operation was rejected.
///
/// The `Display` output is the reason string published on the error channel,
/// so the phrasing is part of the in-process wire format.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Empty or missing key, or a missing value argument.
    #[error("{reason}")]
    InvalidArgument {
        /// Human-readable reason, published verbatim.
        reason: String,
    },

    /// Write or removal attempted on a key marked constant.
    #[error("cannot {action}, name marked as constant (name: {name})")]
    ConstantViolation {
        /// The rejected mutation.
        action: ConstantAction,
        /// The constant-marked key.
        name: String,
    },

    /// A backend id was registered twice.
    #[error("Given id exists already: {id}")]
    DuplicateRegistration {
        /// The already-taken backend id.
        id: String,
    },

    /// A registered backend returned an error during dispatch.
    #[error("{0}")]
    BackendFailure(#[from] anyhow::Error),
}

impl StoreError {
    /// An empty or missing `name` argument.
    #[must_use]
    pub fn faulty_name() -> Self {
        Self::InvalidArgument {
            reason: "faulty name argument".to_string(),
        }
    }

    /// An empty or missing `key` argument.
    #[must_use]
    pub fn faulty_key() -> Self {
        Self::InvalidArgument {
            reason: "faulty key".to_string(),
        }
    }

    /// A call that omitted the value argument. `slot` names the identifier
    /// argument as the caller knows it (`"name"` or `"key"`).
    #[must_use]
    pub fn missing_value(slot: &str, identifier: &str) -> Self {
        Self::InvalidArgument {
            reason: format!("missing \"value\" argument ({slot}: {identifier})"),
        }
    }

    /// A `set` rejected by the constant lock.
    #[must_use]
    pub fn constant_override(name: &str) -> Self {
        Self::ConstantViolation {
            action: ConstantAction::Override,
            name: name.to_string(),
        }
    }

    /// A `remove` rejected by the constant lock.
    #[must_use]
    pub fn constant_remove(name: &str) -> Self {
        Self::ConstantViolation {
            action: ConstantAction::Remove,
            name: name.to_string(),
        }
    }

    /// A registration under an id that is already taken.
    #[must_use]
    pub fn duplicate_registration(id: &str) -> Self {
        Self::DuplicateRegistration { id: id.to_string() }
    }
}

/// Converts a rejection into its observable form: a `warn` log line and an
/// `error` event carrying `(operation, reason)`.
pub fn report(port: &dyn NotificationPort, operation: &str, error: &StoreError) {
    tracing::warn!(operation, error = %error, "operation rejected");
    port.publish(
        events::ERROR,
        &[Value::from(operation), Value::from(error.to_string())],
    );
}
