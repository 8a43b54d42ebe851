//! Listener contract for change-set notifications.

use std::sync::Arc;

use thiserror::Error;

use crate::change::ChangeSet;

/// Errors a listener may report back to the bus.
///
/// The bus logs these and carries on; they never reach the publisher.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listener refused the change-set.
    #[error("change-set rejected: {0}")]
    Rejected(String),

    /// The listener failed while handling the change-set.
    #[error("listener failed: {0}")]
    Failed(String),

    /// Any other error raised by the listener.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A capability that receives change-sets from a change bus.
///
/// Listeners are called from the bus worker thread, one change-set at a time,
/// in the order each publisher published them. A slow listener delays every
/// later change-set on the same bus.
pub trait ChangeSetListener: Send + Sync {
    /// Handle one published change-set.
    fn notify(&self, change_set: &ChangeSet) -> Result<(), ListenerError>;

    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a registered listener.
///
/// Two handles denote the same listener iff they point at the same allocation.
pub type ListenerRef = Arc<dyn ChangeSetListener>;

/// Check whether two handles refer to the same listener instance.
pub fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl<F> ChangeSetListener for F
where
    F: Fn(&ChangeSet) -> Result<(), ListenerError> + Send + Sync,
{
    fn notify(&self, change_set: &ChangeSet) -> Result<(), ListenerError> {
        self(change_set)
    }
}
