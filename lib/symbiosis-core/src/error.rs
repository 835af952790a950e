use std::fmt;

use symbiosis_client::ClientError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Operation a reconciler was performing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// What a convergence wait for this action is waiting for
    pub fn goal(&self) -> &'static str {
        match self {
            Action::Delete => "be deleted",
            _ => "become ready",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

/// Bad input caught before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quantity must be a positive integer, got {0}")]
    NonPositiveQuantity(i64),

    #[error("quantity {0} is out of range")]
    QuantityOutOfRange(i64),

    #[error("invalid autoscaling settings: {0}")]
    AutoscalingBounds(String),

    #[error("{field} cannot be changed in place, the resource has to be recreated")]
    ImmutableField { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Invalid {kind} {key}: {source}")]
    Validation {
        kind: &'static str,
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("Failed to {action} {kind} {key}: {source}")]
    Client {
        kind: &'static str,
        key: String,
        action: Action,
        #[source]
        source: ClientError,
    },

    #[error(
        "Timed out waiting for {kind} {key} to {goal} after {attempts} attempts, last observed state: {last_state}",
        goal = .action.goal()
    )]
    ConvergenceTimeout {
        kind: &'static str,
        key: String,
        action: Action,
        last_state: String,
        attempts: u32,
    },

    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// The API accepted the create but a follow-up step failed
    #[error("{kind} {id} was created but did not complete: {source}")]
    Incomplete {
        kind: &'static str,
        id: String,
        #[source]
        source: Box<ReconcileError>,
    },
}

impl ReconcileError {
    /// Identity assigned by the API before the operation failed
    pub fn assigned_id(&self) -> Option<&str> {
        match self {
            ReconcileError::Incomplete { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ReconcileError::ConvergenceTimeout { .. } => true,
            ReconcileError::Incomplete { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReconcileError::Validation { .. })
    }

    /// The underlying client error, if the API or transport failed
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            ReconcileError::Client { source, .. } => Some(source),
            ReconcileError::Incomplete { source, .. } => source.client_error(),
            _ => None,
        }
    }
}
