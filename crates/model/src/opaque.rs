use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-owned copy of an assistant reply.
///
/// Some providers need the exact reply they produced (tool call ids,
/// reasoning fields) when it is sent back as history. The crew runner
/// cannot interpret it, so it only stores and replays it. Identity is the
/// `id`, which must be unique within one conversation.
#[derive(Clone)]
pub struct OpaqueMessage {
    id: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueMessage {
    /// Wraps a provider value under the given id.
    #[inline]
    pub fn new<ID, T>(id: ID, value: T) -> Self
    where
        ID: AsRef<str>,
        T: Send + Sync + 'static,
    {
        Self {
            id: Arc::from(id.as_ref()),
            value: Arc::new(value),
        }
    }

    /// The id this message was created with.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrows the wrapped value if it has type `T`.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
