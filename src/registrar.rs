use log::trace;

use crate::{
    error::BoxError,
    pending::{PendingHandle, PendingRegistry, boxed_producer},
    realized::RealizedStore,
};

/// Hands out strictly increasing insertion indices. Never reset.
#[derive(Debug, Default)]
pub(crate) struct IndexCounter {
    next: usize,
}

impl IndexCounter {
    pub(crate) fn allocate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }
}

/// Registration access to an [`ElementSource`] while it is being flushed.
///
/// Realization listeners receive one of these so they can add elements or
/// register pending producers in the middle of a flush. Pending entries
/// registered this way are realized by the same flush.
///
/// [`ElementSource`]: crate::ElementSource
pub struct Registrar<'a, T> {
    pub(crate) counter: &'a mut IndexCounter,
    pub(crate) realized: &'a mut RealizedStore<T>,
    pub(crate) pending: &'a mut PendingRegistry<T>,
}

impl<T> Registrar<'_, T> {
    /// Appends a realized element at a fresh insertion index.
    pub fn add(&mut self, element: T) {
        let index = self.counter.allocate();
        trace!("Adding realized element at index {index}.");
        self.realized.append(index, element);
    }

    /// Number of entries not realized yet, including ones registered during
    /// the current flush.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.count()
    }
}

impl<T> Registrar<'_, T>
where
    T: 'static,
{
    /// Registers an infallible producer at a fresh insertion index.
    pub fn add_pending<F, I>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> I + 'static,
        I: IntoIterator<Item = T> + 'static,
    {
        self.try_add_pending(move || Ok::<_, BoxError>(producer()))
    }

    /// Registers a fallible producer at a fresh insertion index.
    pub fn try_add_pending<F, I, E>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> Result<I, E> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<BoxError> + 'static,
    {
        let index = self.counter.allocate();
        self.pending.register(index, boxed_producer(producer))
    }
}
