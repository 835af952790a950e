//! Ordered fallback lookups
//!
//! Some entities live behind more than one describe endpoint (an accepted team
//! member or a pending invitation). `first_present` tries each lookup in order
//! and stops at the first one that finds something.

use futures::future::BoxFuture;

/// A deferred describe call
pub type Lookup<'a, T, E> = Box<dyn FnOnce() -> BoxFuture<'a, Result<Option<T>, E>> + Send + 'a>;

/// Run lookups in order, returning the index and value of the first hit
///
/// The first error aborts the search. Later lookups are not invoked once one succeeds.
pub async fn first_present<'a, T, E>(lookups: Vec<Lookup<'a, T, E>>) -> Result<Option<(usize, T)>, E> {
    for (index, lookup) in lookups.into_iter().enumerate() {
        if let Some(found) = lookup().await? {
            return Ok(Some((index, found)));
        }
    }
    Ok(None)
}
