//! Generic create/read/update/delete orchestration
//!
//! A [`ManagedResource`] describes how one entity type maps onto the API. A
//! [`Reconciler`] drives any such strategy through validation, the API call,
//! and the optional convergence wait.

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use symbiosis_client::{ClientError, Deleted, SymbiosisApi};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Action, ReconcileError, Result, ValidationError};
use crate::poll::{self, PollError, Probe, Wait};

/// Per-entity strategy plugged into [`Reconciler`]
#[async_trait]
pub trait ManagedResource: Send + Sync + 'static {
    /// Declared desired state
    type Spec: Send + Sync;
    /// Identity of an existing entity
    type Key: Clone + fmt::Display + Send + Sync;
    /// Wire request sent on create
    type CreateRequest: Send + Sync;
    /// Latest snapshot of remote state
    type Observed: Send;
    /// In-place change of one mutable field group
    type Patch: fmt::Debug + Send + Sync;

    /// Singular noun used in logs and errors
    const KIND: &'static str;

    /// Human label of a spec, used before the API assigns an identity
    fn label(spec: &Self::Spec) -> String;

    /// Validate a spec and map it to the create request, without any network call
    fn create_request(spec: &Self::Spec) -> std::result::Result<Self::CreateRequest, ValidationError>;

    /// Send the create request and return the identity the API assigned
    async fn submit(api: &dyn SymbiosisApi, request: &Self::CreateRequest) -> symbiosis_client::Result<Self::Key>;

    /// Fetch the current snapshot, `None` if the entity does not exist
    async fn describe(api: &dyn SymbiosisApi, key: &Self::Key) -> symbiosis_client::Result<Option<Self::Observed>>;

    /// Full observation returned to callers, e.g. with credentials attached
    async fn observe(api: &dyn SymbiosisApi, key: &Self::Key) -> symbiosis_client::Result<Option<Self::Observed>> {
        Self::describe(api, key).await
    }

    /// Patches turning `current` into `desired`, one per changed field group
    ///
    /// A changed identity field is an error, it can only be applied by recreating.
    fn changes(current: &Self::Spec, desired: &Self::Spec) -> std::result::Result<Vec<Self::Patch>, ValidationError>;

    async fn apply_patch(api: &dyn SymbiosisApi, key: &Self::Key, patch: &Self::Patch) -> symbiosis_client::Result<()>;

    async fn delete(api: &dyn SymbiosisApi, key: &Self::Key) -> symbiosis_client::Result<Deleted>;

    /// Lifecycle state reported while polling
    fn state(_observed: &Self::Observed) -> String {
        "present".to_string()
    }

    /// Whether a freshly created entity has reached its terminal success state
    fn is_converged(_observed: &Self::Observed) -> bool {
        true
    }
}

/// Result of a successful create
#[derive(Debug)]
pub struct Created<K, O> {
    pub key: K,
    /// `None` if the entity was not yet visible right after creation
    pub observed: Option<O>,
}

/// Drives one [`ManagedResource`] against the API
pub struct Reconciler<R: ManagedResource> {
    api: Arc<dyn SymbiosisApi>,
    convergence: poll::Convergence,
    _resource: PhantomData<fn() -> R>,
}

impl<R: ManagedResource> Clone for Reconciler<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            convergence: self.convergence.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: ManagedResource> Reconciler<R> {
    /// Reconciler that returns as soon as the API accepts each request
    pub fn new(api: Arc<dyn SymbiosisApi>) -> Self {
        Self {
            api,
            convergence: poll::Convergence::none(),
            _resource: PhantomData,
        }
    }

    pub fn with_convergence(mut self, convergence: poll::Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn convergence(&self) -> &poll::Convergence {
        &self.convergence
    }

    fn client_error(key: impl fmt::Display, action: Action, source: ClientError) -> ReconcileError {
        ReconcileError::Client {
            kind: R::KIND,
            key: key.to_string(),
            action,
            source,
        }
    }

    /// Create the entity and optionally wait until it is ready
    ///
    /// Failures after the API accepted the create are wrapped in
    /// [`ReconcileError::Incomplete`] carrying the assigned identity.
    pub async fn create(&self, spec: &R::Spec) -> Result<Created<R::Key, R::Observed>> {
        let label = R::label(spec);
        let request = R::create_request(spec).map_err(|source| ReconcileError::Validation {
            kind: R::KIND,
            key: label.clone(),
            source,
        })?;

        let started = Instant::now();
        debug!("Creating {} {}", R::KIND, label);

        let key = R::submit(self.api.as_ref(), &request)
            .await
            .map_err(|e| Self::client_error(&label, Action::Create, e))?;
        info!("Created {} {}", R::KIND, key);

        let incomplete = |source: ReconcileError| ReconcileError::Incomplete {
            kind: R::KIND,
            id: key.to_string(),
            source: Box::new(source),
        };

        if let Some(wait) = &self.convergence.create {
            self.wait_until_ready(&key, wait, started)
                .await
                .map_err(incomplete)?;
        }

        let observed = R::observe(self.api.as_ref(), &key)
            .await
            .map_err(|e| incomplete(Self::client_error(&key, Action::Read, e)))?;

        Ok(Created { key, observed })
    }

    async fn wait_until_ready(&self, key: &R::Key, wait: &Wait, started: Instant) -> Result<()> {
        let api = self.api.as_ref();
        let deadline = started + wait.timeout;
        info!("Waiting up to {:?} for {} {} to become ready", wait.timeout, R::KIND, key);

        let result = poll::until_converged(deadline, &wait.backoff, || async move {
            match R::describe(api, key).await {
                Ok(Some(observed)) if R::is_converged(&observed) => Probe::Converged(()),
                Ok(Some(observed)) => Probe::NotYet(R::state(&observed)),
                Ok(None) => Probe::NotYet("not found".to_string()),
                Err(e) => Probe::Fatal(e),
            }
        })
        .await;

        self.poll_result(key, Action::Create, result)
    }

    async fn wait_until_absent(&self, key: &R::Key, wait: &Wait, started: Instant) -> Result<()> {
        let api = self.api.as_ref();
        let deadline = started + wait.timeout;
        info!("Waiting up to {:?} for {} {} to be deleted", wait.timeout, R::KIND, key);

        let result = poll::until_converged(deadline, &wait.backoff, || async move {
            match R::describe(api, key).await {
                Ok(None) => Probe::Converged(()),
                Ok(Some(observed)) => Probe::NotYet(R::state(&observed)),
                Err(e) => Probe::Fatal(e),
            }
        })
        .await;

        self.poll_result(key, Action::Delete, result)
    }

    fn poll_result(
        &self,
        key: &R::Key,
        action: Action,
        result: std::result::Result<(), PollError<ClientError>>,
    ) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(PollError::Fatal(e)) => Err(Self::client_error(key, action, e)),
            Err(PollError::DeadlineExceeded {
                last_reason,
                attempts,
            }) => Err(ReconcileError::ConvergenceTimeout {
                kind: R::KIND,
                key: key.to_string(),
                action,
                last_state: last_reason,
                attempts,
            }),
        }
    }

    /// Current state, `None` if the entity no longer exists
    pub async fn read(&self, key: &R::Key) -> Result<Option<R::Observed>> {
        let observed = R::observe(self.api.as_ref(), key)
            .await
            .map_err(|e| Self::client_error(key, Action::Read, e))?;
        if observed.is_none() {
            debug!("{} {} is gone", R::KIND, key);
        }
        Ok(observed)
    }

    /// Apply in place every mutable difference between `current` and `desired`
    ///
    /// Returns the number of patches sent, zero when nothing changed.
    pub async fn update(&self, key: &R::Key, current: &R::Spec, desired: &R::Spec) -> Result<usize> {
        let patches = R::changes(current, desired).map_err(|source| ReconcileError::Validation {
            kind: R::KIND,
            key: key.to_string(),
            source,
        })?;

        for patch in &patches {
            debug!("Patching {} {}: {:?}", R::KIND, key, patch);
            R::apply_patch(self.api.as_ref(), key, patch)
                .await
                .map_err(|e| Self::client_error(key, Action::Update, e))?;
        }

        if !patches.is_empty() {
            info!("Updated {} {} ({} patches)", R::KIND, key, patches.len());
        }
        Ok(patches.len())
    }

    /// Delete the entity, treating an already absent one as success
    pub async fn delete(&self, key: &R::Key) -> Result<Deleted> {
        let started = Instant::now();
        let deleted = R::delete(self.api.as_ref(), key)
            .await
            .map_err(|e| Self::client_error(key, Action::Delete, e))?;

        match deleted {
            Deleted::AlreadyAbsent => {
                info!("{} {} was already deleted", R::KIND, key);
                return Ok(deleted);
            }
            Deleted::Accepted => info!("Deleting {} {}", R::KIND, key),
        }

        if let Some(wait) = &self.convergence.delete {
            self.wait_until_absent(key, wait, started).await?;
        }
        Ok(deleted)
    }
}
