use std::{
    collections::{BTreeMap, btree_map},
    iter::{Flatten, FusedIterator},
};

use log::trace;

/// Materialized elements ordered by insertion index.
///
/// A directly added element occupies a bucket of its own. A realized pending
/// entry places all of its values in the bucket at the entry's index, in the
/// order its producer returned them.
#[derive(Debug)]
pub(crate) struct RealizedStore<T> {
    buckets: BTreeMap<usize, Vec<T>>,
    len: usize,
}

impl<T> Default for RealizedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RealizedStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    pub(crate) fn append(&mut self, index: usize, element: T) {
        self.insert_at(index, vec![element]);
    }

    /// Places the values of a realized entry at its insertion index.
    ///
    /// # Panics
    ///
    /// Panics if the index is already occupied, which means an entry was
    /// realized twice or an index was handed out twice.
    pub(crate) fn insert_at(&mut self, index: usize, values: Vec<T>) {
        if values.is_empty() {
            trace!("Entry {index} realized to no values.");
            return;
        }
        assert!(
            !self.buckets.contains_key(&index),
            "Realized store already holds entry {index}"
        );
        trace!("Storing {} value(s) at index {index}.", values.len());
        self.len += values.len();
        self.buckets.insert(index, values);
    }

    /// Removes the first element equal to `element` in index order.
    pub(crate) fn remove(&mut self, element: &T) -> bool
    where
        T: PartialEq,
    {
        let Some(index) = self.buckets.iter_mut().find_map(|(index, bucket)| {
            let position = bucket.iter().position(|value| value == element)?;
            trace!("Removed value at index {index}, position {position}.");
            bucket.remove(position);
            Some(*index)
        }) else {
            return false;
        };
        self.len -= 1;
        if self.buckets.get(&index).is_some_and(Vec::is_empty) {
            self.buckets.remove(&index);
        }
        true
    }

    pub(crate) fn contains(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|value| value == element)
    }

    pub(crate) fn contains_all<'a, I>(&self, elements: I) -> bool
    where
        T: PartialEq + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        elements.into_iter().all(|element| self.contains(element))
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.buckets.values().flatten(),
            remaining: self.len,
        }
    }
}

/// Iterator over realized elements in insertion order.
///
/// Returned by [`ElementSource::iter`] and [`ElementSource::iter_no_flush`].
///
/// [`ElementSource::iter`]: crate::ElementSource::iter
/// [`ElementSource::iter_no_flush`]: crate::ElementSource::iter_no_flush
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: Flatten<btree_map::Values<'a, usize, Vec<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
