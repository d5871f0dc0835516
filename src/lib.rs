//! # Lazily realized collections with `element-source`
//!
//! This crate provides an ordered collection that mixes realized elements
//! with *pending* entries: producers that are only run when their values are
//! needed.
//!
//! The [`ElementSource`] struct keeps both kinds of entry in one insertion
//! order. Cheap queries such as [`ElementSource::iter_no_flush`] and
//! [`ElementSource::estimated_size`] never run a producer, while queries that
//! need exact answers, such as [`ElementSource::size`], first *flush*: they
//! run every outstanding producer exactly once and put its values where the
//! producer was registered.
//!
//! Pending entries are registered through the [`PendingSource`] trait. Import
//! it to use [`PendingSource::add_pending`] and friends.
mod error;
mod listeners;
mod pending;
mod realized;
mod registrar;
mod source;

pub use error::{BoxError, ElementSourceError, Result};
pub use listeners::Realization;
pub use pending::PendingHandle;
pub use realized::Iter;
pub use registrar::Registrar;
pub use source::ElementSource;

/// A collection that can tell roughly how many elements it holds without
/// doing any expensive work.
///
/// Downstream collections can use the estimate as a capacity hint.
pub trait WithEstimatedSize {
    /// An approximation of the number of elements.
    fn estimated_size(&self) -> usize;
}

/// A collection that accepts deferred producers of elements.
pub trait PendingSource<T> {
    /// Registers a producer that is run once, when the collection is flushed
    /// or the entry is realized explicitly.
    ///
    /// # Example
    ///
    /// ```rust
    /// use element_source::{ElementSource, PendingSource};
    ///
    /// let mut source = ElementSource::new();
    /// let handle = source.add_pending(|| vec!["configured"]);
    /// assert_eq!(source.estimated_size(), 1);
    /// assert!(source.realize(handle)?);
    /// assert_eq!(source.iter_no_flush().next(), Some(&"configured"));
    /// # Ok::<(), element_source::ElementSourceError>(())
    /// ```
    fn add_pending<F, I>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> I + 'static,
        I: IntoIterator<Item = T> + 'static;

    /// Registers a producer that may fail.
    ///
    /// A failure surfaces from the operation that realizes the entry, as
    /// [`ElementSourceError::RealizationFailed`]. The producer is not run
    /// again afterwards.
    fn try_add_pending<F, I, E>(&mut self, producer: F) -> PendingHandle
    where
        F: FnOnce() -> std::result::Result<I, E> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<BoxError> + 'static;

    /// Cancels a pending entry without running its producer.
    ///
    /// Returns `false` if the entry was already realized or cancelled.
    fn remove_pending(&mut self, handle: PendingHandle) -> bool;

    /// Realizes a pending entry together with every pending entry registered
    /// before it, in insertion order.
    ///
    /// Entries registered by listeners during this call come after `handle`
    /// and stay pending until the next flush. Returns `false`, realizing
    /// nothing, if the entry was already realized or cancelled.
    ///
    /// # Errors
    ///
    /// Fails with the first producer failure. Entries after the failing one
    /// stay pending, which includes `handle` unless it is the one that failed.
    fn realize(&mut self, handle: PendingHandle) -> Result<bool>;

    /// Realizes every pending entry, including entries registered by
    /// listeners while this runs.
    ///
    /// # Errors
    ///
    /// Fails with the first producer failure. Entries that were not reached
    /// stay pending.
    fn realize_pending(&mut self) -> Result<()>;

    /// Subscribes to realizations of pending entries.
    ///
    /// The listener is called once per realized entry, in insertion order,
    /// whether the entry is realized by a flush or by [`realize`]. It may
    /// register further entries through the [`Registrar`] it is handed.
    ///
    /// [`realize`]: PendingSource::realize
    fn on_realize<L>(&mut self, listener: L)
    where
        L: FnMut(&Realization<'_, T>, &mut Registrar<'_, T>) + 'static;
}
