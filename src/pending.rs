use std::{collections::BTreeMap, fmt};

use log::{trace, warn};

use crate::error::{BoxError, ElementSourceError, Result};

/// A deferred producer of zero, one or many elements.
pub(crate) type Producer<T> = Box<dyn FnOnce() -> std::result::Result<Vec<T>, BoxError>>;

pub(crate) fn boxed_producer<T, F, I, E>(producer: F) -> Producer<T>
where
    T: 'static,
    F: FnOnce() -> std::result::Result<I, E> + 'static,
    I: IntoIterator<Item = T> + 'static,
    E: Into<BoxError> + 'static,
{
    Box::new(move || {
        producer()
            .map(|values| values.into_iter().collect())
            .map_err(Into::into)
    })
}

/// Identifies a pending entry by its insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingHandle {
    index: usize,
}

impl PendingHandle {
    /// Orders after every handle that can be registered.
    pub(crate) const LAST: PendingHandle = PendingHandle { index: usize::MAX };

    /// The insertion index this entry was registered at.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

/// Producers that have not been invoked yet, keyed by insertion index.
///
/// Taking a producer out of the map is what marks its entry realized, so an
/// entry can never be invoked twice.
pub(crate) struct PendingRegistry<T> {
    unrealized: BTreeMap<usize, Producer<T>>,
}

impl<T> Default for PendingRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            unrealized: BTreeMap::new(),
        }
    }

    pub(crate) fn register(&mut self, index: usize, producer: Producer<T>) -> PendingHandle {
        debug_assert!(
            self.unrealized
                .last_key_value()
                .is_none_or(|(newest, _)| *newest < index),
            "Pending index {index} is not fresh"
        );
        trace!("Registering pending entry {index}.");
        self.unrealized.insert(index, producer);
        PendingHandle { index }
    }

    /// Invokes the producer of `handle`, unless it was already realized or
    /// cancelled, in which case `Ok(None)` is returned.
    pub(crate) fn realize(&mut self, handle: PendingHandle) -> Result<Option<Vec<T>>> {
        let Some(producer) = self.unrealized.remove(&handle.index) else {
            trace!(
                "Pending entry {} is already realized or cancelled.",
                handle.index
            );
            return Ok(None);
        };
        invoke(handle.index, producer).map(Some)
    }

    /// Realizes the lowest unrealized entry, in index order, until none up to
    /// and including `last` are left. Pass [`PendingHandle::LAST`] to drain
    /// everything.
    ///
    /// `on_realized` may register further entries through the registry it is
    /// handed; those are realized before this returns unless their index is
    /// past `last`. The first producer failure stops the drain and is
    /// returned. Returns the number of entries realized.
    pub(crate) fn drain_through<F>(
        &mut self,
        last: PendingHandle,
        mut on_realized: F,
    ) -> Result<usize>
    where
        F: FnMut(&mut Self, PendingHandle, Vec<T>),
    {
        let mut drained = 0;
        while let Some(handle) = self.next_unrealized().filter(|handle| *handle <= last) {
            if let Some(values) = self.realize(handle)? {
                drained += 1;
                on_realized(self, handle, values);
            }
        }
        Ok(drained)
    }

    fn next_unrealized(&self) -> Option<PendingHandle> {
        self.unrealized
            .first_key_value()
            .map(|(index, _)| PendingHandle { index: *index })
    }

    pub(crate) fn is_pending(&self, handle: PendingHandle) -> bool {
        self.unrealized.contains_key(&handle.index)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.unrealized.is_empty()
    }

    pub(crate) fn count(&self) -> usize {
        self.unrealized.len()
    }

    pub(crate) fn cancel(&mut self, handle: PendingHandle) -> bool {
        if self.unrealized.remove(&handle.index).is_some() {
            trace!("Cancelled pending entry {}.", handle.index);
            true
        } else {
            warn!(
                "Attempted to cancel pending entry {} that is not pending",
                handle.index
            );
            false
        }
    }

    /// Drops every unrealized producer without invoking it.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let cancelled = self.unrealized.len();
        self.unrealized.clear();
        cancelled
    }
}

fn invoke<T>(index: usize, producer: Producer<T>) -> Result<Vec<T>> {
    trace!("Realizing pending entry {index}.");
    producer().map_err(|source| {
        warn!("Producer of pending entry {index} failed: {source}");
        ElementSourceError::RealizationFailed { index, source }
    })
}

impl<T> fmt::Debug for PendingRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistry")
            .field("unrealized", &self.unrealized.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn counting(calls: &Rc<Cell<usize>>, values: Vec<u32>) -> Producer<u32> {
        let calls = Rc::clone(calls);
        boxed_producer(move || {
            calls.set(calls.get() + 1);
            Ok::<_, BoxError>(values)
        })
    }

    fn failing(message: &'static str) -> Producer<u32> {
        boxed_producer(move || Err::<Vec<u32>, _>(message))
    }

    #[test]
    fn test_realize_invokes_producer_once() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        let handle = registry.register(0, counting(&calls, vec![7, 8]));

        assert!(registry.has_pending());
        assert_eq!(registry.realize(handle).unwrap(), Some(vec![7, 8]));
        assert_eq!(registry.realize(handle).unwrap(), None);
        assert_eq!(calls.get(), 1);
        assert!(!registry.has_pending());
    }

    #[test]
    fn test_drain_follows_index_order() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        registry.register(2, counting(&calls, vec![2]));
        registry.register(5, counting(&calls, vec![5]));

        let mut seen = Vec::new();
        let drained = registry
            .drain_through(PendingHandle::LAST, |_, handle, values| {
                seen.push((handle.index(), values));
            })
            .unwrap();

        assert_eq!(drained, 2);
        assert_eq!(seen, vec![(2, vec![2]), (5, vec![5])]);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_drain_picks_up_entries_registered_mid_drain() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        registry.register(0, counting(&calls, vec![0]));

        let mut next_index = 1;
        let mut seen = Vec::new();
        registry
            .drain_through(PendingHandle::LAST, |registry, handle, _| {
                seen.push(handle.index());
                if next_index < 3 {
                    registry.register(next_index, counting(&calls, vec![]));
                    next_index += 1;
                }
            })
            .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_failure_stops_drain_and_keeps_later_entries() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        registry.register(0, counting(&calls, vec![1]));
        registry.register(1, failing("broken"));
        let later = registry.register(2, counting(&calls, vec![3]));

        let error = registry
            .drain_through(PendingHandle::LAST, |_, _, _| {})
            .unwrap_err();

        assert_eq!(error.index(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(registry.count(), 1);

        assert_eq!(registry.realize(later).unwrap(), Some(vec![3]));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_drain_through_stops_after_the_given_entry() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        registry.register(0, counting(&calls, vec![0]));
        let middle = registry.register(1, counting(&calls, vec![1]));
        let last = registry.register(2, counting(&calls, vec![2]));

        let mut seen = Vec::new();
        let drained = registry
            .drain_through(middle, |registry, handle, _| {
                seen.push(handle.index());
                if handle.index() == 0 {
                    registry.register(3, counting(&calls, vec![3]));
                }
            })
            .unwrap();

        assert_eq!(drained, 2);
        assert_eq!(seen, vec![0, 1]);
        assert!(registry.is_pending(last));
        assert!(!registry.is_pending(middle));
        assert_eq!(registry.count(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cancel_never_invokes() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PendingRegistry::new();
        let first = registry.register(0, counting(&calls, vec![1]));
        registry.register(1, counting(&calls, vec![2]));

        assert!(registry.cancel(first));
        assert!(!registry.cancel(first));
        assert_eq!(registry.cancel_all(), 1);
        assert!(!registry.has_pending());
        assert_eq!(
            registry
                .drain_through(PendingHandle::LAST, |_, _, _| {})
                .unwrap(),
            0
        );
        assert_eq!(calls.get(), 0);
    }
}
