use log::{debug, trace};

use crate::{
    PendingSource, WithEstimatedSize,
    error::{BoxError, Result},
    listeners::{Realization, RealizationListeners},
    pending::{PendingHandle, PendingRegistry},
    realized::{Iter, RealizedStore},
    registrar::{IndexCounter, Registrar},
};

/// An ordered collection of realized elements and pending producers.
///
/// Every element and every producer gets an insertion index when it is
/// registered. Realized values of a producer take the position of the
/// producer, so the collection reads the same regardless of when an entry
/// was realized.
///
/// Operations are split into two families:
///
/// - *No-flush* operations ([`iter_no_flush`], [`constant_time_is_empty`],
///   [`estimated_size`], [`add`], [`clear`]) never run a producer.
/// - *Flushing* operations ([`iter`], [`size`], [`is_empty`], [`contains`],
///   [`contains_all`], [`remove`]) first realize every pending entry, then
///   answer from the realized elements. They fail if a producer fails.
///
/// # Examples
///
/// ```rust
/// use element_source::{ElementSource, PendingSource};
///
/// let mut source = ElementSource::new();
/// source.add(1);
/// source.add_pending(|| [2, 3]);
/// source.add(4);
///
/// assert_eq!(source.iter_no_flush().copied().collect::<Vec<_>>(), [1, 4]);
/// assert_eq!(source.iter()?.copied().collect::<Vec<_>>(), [1, 2, 3, 4]);
/// # Ok::<(), element_source::ElementSourceError>(())
/// ```
///
/// [`iter_no_flush`]: ElementSource::iter_no_flush
/// [`constant_time_is_empty`]: ElementSource::constant_time_is_empty
/// [`estimated_size`]: ElementSource::estimated_size
/// [`add`]: ElementSource::add
/// [`clear`]: ElementSource::clear
/// [`iter`]: ElementSource::iter
/// [`size`]: ElementSource::size
/// [`is_empty`]: ElementSource::is_empty
/// [`contains`]: ElementSource::contains
/// [`contains_all`]: ElementSource::contains_all
/// [`remove`]: ElementSource::remove
#[derive(Debug)]
pub struct ElementSource<T> {
    counter: IndexCounter,
    realized: RealizedStore<T>,
    pending: PendingRegistry<T>,
    listeners: RealizationListeners<T>,
}

impl<T> Default for ElementSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ElementSource<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: IndexCounter::default(),
            realized: RealizedStore::new(),
            pending: PendingRegistry::new(),
            listeners: RealizationListeners::default(),
        }
    }

    /// Iterates over all elements after realizing every pending entry.
    ///
    /// # Errors
    ///
    /// Fails with the first producer failure. Entries realized before it
    /// keep their values; the iteration is not started.
    pub fn iter(&mut self) -> Result<Iter<'_, T>> {
        self.flush()?;
        Ok(self.realized.iter())
    }

    /// Iterates over the elements realized so far without running any
    /// producer.
    #[must_use]
    pub fn iter_no_flush(&self) -> Iter<'_, T> {
        self.realized.iter()
    }

    /// Returns `true` if there is nothing realized and nothing pending.
    ///
    /// A pending producer may still yield no values, so `false` does not
    /// guarantee a non-empty flush.
    #[must_use]
    pub fn constant_time_is_empty(&self) -> bool {
        self.realized.is_empty() && !self.pending.has_pending()
    }

    /// Realized elements plus unrealized entries, without flushing.
    ///
    /// This is an approximation: each pending entry counts as one element,
    /// whatever its producer eventually yields.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        self.realized.len() + self.pending.count()
    }

    /// Number of pending entries not realized yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.count()
    }

    /// # Errors
    ///
    /// Fails if realizing a pending entry fails.
    pub fn contains(&mut self, element: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        self.flush()?;
        Ok(self.realized.contains(element))
    }

    /// # Errors
    ///
    /// Fails if realizing a pending entry fails.
    pub fn contains_all<'a, I>(&mut self, elements: I) -> Result<bool>
    where
        T: PartialEq + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.flush()?;
        Ok(self.realized.contains_all(elements))
    }

    /// # Errors
    ///
    /// Fails if realizing a pending entry fails.
    pub fn is_empty(&mut self) -> Result<bool> {
        self.flush()?;
        Ok(self.realized.is_empty())
    }

    /// Exact number of elements, realizing every pending entry first.
    ///
    /// # Errors
    ///
    /// Fails if realizing a pending entry fails.
    pub fn size(&mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.realized.len())
    }

    /// Appends a realized element at a fresh insertion index.
    pub fn add(&mut self, element: T) {
        self.registrar().add(element);
    }

    /// Same as [`add`](ElementSource::add).
    pub fn add_realized(&mut self, element: T) {
        self.add(element);
    }

    /// Drops every element and cancels every pending entry without running
    /// its producer. Insertion indices keep increasing afterwards.
    pub fn clear(&mut self) {
        let cancelled = self.pending.cancel_all();
        debug!(
            "Clearing {} realized element(s) and {cancelled} pending entries.",
            self.realized.len()
        );
        self.realized.clear();
    }

    /// Removes the first element equal to `element`, realizing every pending
    /// entry first.
    ///
    /// # Errors
    ///
    /// Fails if realizing a pending entry fails; nothing is removed then.
    pub fn remove(&mut self, element: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        self.flush()?;
        Ok(self.realized.remove(element))
    }

    fn flush(&mut self) -> Result<()> {
        if !self.pending.has_pending() {
            return Ok(());
        }
        debug!("Flushing {} pending entries.", self.pending.count());
        let drained = self.drain_through(PendingHandle::LAST)?;
        debug!(
            "Flush realized {drained} entries, {} element(s) now realized.",
            self.realized.len()
        );
        Ok(())
    }

    /// Realizes pending entries in index order up to and including `last`,
    /// notifying listeners and storing values for each.
    fn drain_through(&mut self, last: PendingHandle) -> Result<usize> {
        let Self {
            counter,
            realized,
            pending,
            listeners,
        } = self;
        pending.drain_through(last, |pending, handle, values| {
            settle(
                &mut *listeners,
                Registrar {
                    counter: &mut *counter,
                    realized: &mut *realized,
                    pending,
                },
                handle.index(),
                values,
            );
        })
    }
}

/// Notifies listeners of a realized entry, then stores its values at the
/// entry's index.
fn settle<T>(
    listeners: &mut RealizationListeners<T>,
    mut registrar: Registrar<'_, T>,
    index: usize,
    values: Vec<T>,
) {
    listeners.dispatch(
        &Realization {
            index,
            values: &values,
        },
        &mut registrar,
    );
    registrar.realized.insert_at(index, values);
}

impl<T> PendingSource<T> for ElementSource<T>
where
    T: 'static,
{
    fn add_pending<F, I>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> I + 'static,
        I: IntoIterator<Item = T> + 'static,
    {
        self.registrar().add_pending(producer)
    }

    fn try_add_pending<F, I, E>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> std::result::Result<I, E> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<BoxError> + 'static,
    {
        self.registrar().try_add_pending(producer)
    }

    fn remove_pending(&mut self, handle: PendingHandle) -> bool {
        self.pending.cancel(handle)
    }

    fn realize(&mut self, handle: PendingHandle) -> Result<bool> {
        if !self.pending.is_pending(handle) {
            trace!(
                "Pending entry {} is already realized or cancelled.",
                handle.index()
            );
            return Ok(false);
        }
        debug!("Realizing pending entries up to {}.", handle.index());
        self.drain_through(handle)?;
        Ok(true)
    }

    fn realize_pending(&mut self) -> Result<()> {
        self.flush()
    }

    fn on_realize<L>(&mut self, listener: L)
    where
        L: FnMut(&Realization<'_, T>, &mut Registrar<'_, T>) + 'static,
    {
        self.listeners.subscribe(Box::new(listener));
    }
}

impl<T> ElementSource<T> {
    fn registrar(&mut self) -> Registrar<'_, T> {
        Registrar {
            counter: &mut self.counter,
            realized: &mut self.realized,
            pending: &mut self.pending,
        }
    }
}

impl<T> WithEstimatedSize for ElementSource<T> {
    fn estimated_size(&self) -> usize {
        ElementSource::estimated_size(self)
    }
}

impl<T> Extend<T> for ElementSource<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        for element in elements {
            self.add(element);
        }
    }
}

impl<T> FromIterator<T> for ElementSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(elements: I) -> Self {
        let mut source = Self::new();
        source.extend(elements);
        source
    }
}
