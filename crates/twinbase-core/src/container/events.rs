//! Change notification
//!
//! Observers are plain subscriptions on the container. Transport concerns
//! (pushing to clients, brokers) belong to whoever subscribes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEventKind {
    Created,
    Updated,
    Deleted,
}

/// A mutation below `parent_path`
///
/// `identity` is the IdShort of the affected child, or its index for list
/// children. Deleted events carry the identity that was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    pub kind: ContainerEventKind,
    pub parent_path: String,
    pub identity: String,
}

impl ContainerEvent {
    pub(crate) fn new(
        kind: ContainerEventKind,
        parent_path: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            parent_path: parent_path.into(),
            identity: identity.into(),
        }
    }
}

pub trait ContainerObserver: Send + Sync {
    fn on_event(&self, event: &ContainerEvent);
}

impl<F> ContainerObserver for F
where
    F: Fn(&ContainerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ContainerEvent) {
        self(event)
    }
}
