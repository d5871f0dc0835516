use std::fmt;

use log::trace;

use crate::registrar::Registrar;

/// A pending entry that has just been realized.
#[derive(Debug)]
pub struct Realization<'a, T> {
    pub(crate) index: usize,
    pub(crate) values: &'a [T],
}

impl<T> Realization<'_, T> {
    /// Insertion index of the realized entry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Values the producer returned, in order. May be empty.
    #[must_use]
    pub fn values(&self) -> &[T] {
        self.values
    }
}

pub(crate) type Listener<T> = Box<dyn FnMut(&Realization<'_, T>, &mut Registrar<'_, T>)>;

pub(crate) struct RealizationListeners<T> {
    listeners: Vec<Listener<T>>,
}

impl<T> Default for RealizationListeners<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T> RealizationListeners<T> {
    pub(crate) fn subscribe(&mut self, listener: Listener<T>) {
        trace!("Subscribing realization listener {}.", self.listeners.len());
        self.listeners.push(listener);
    }

    /// Notifies every listener, in subscription order, of one realization.
    pub(crate) fn dispatch(
        &mut self,
        realization: &Realization<'_, T>,
        registrar: &mut Registrar<'_, T>,
    ) {
        for (listener_id, listener) in self.listeners.iter_mut().enumerate() {
            trace!(
                "Notifying listener {listener_id} of entry {}.",
                realization.index
            );
            listener(realization, &mut *registrar);
        }
    }
}

impl<T> fmt::Debug for RealizationListeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealizationListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
