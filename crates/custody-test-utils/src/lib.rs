//! Test utilities and tracked deleters for custody development.
//!
//! Provides release policies that count how often they run
//! ([`CountingDeleter`], [`CountingArrayDeleter`]) and a drop-tracked
//! [`Widget`] resource, all reporting into a shared [`ReleaseCounter`].

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use custody::{Deleter, UniqueArray, UniqueOwner};

/// A shared, thread-safe event counter.
///
/// Clones observe the same count, so one counter can be handed to a
/// deleter and kept by the test for assertions.
#[derive(Clone, Debug, Default)]
pub struct ReleaseCounter {
    count: Arc<AtomicUsize>,
}

impl ReleaseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    pub fn bump(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Events recorded so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Frees a boxed value and counts the call.
#[derive(Clone, Debug, Default)]
pub struct CountingDeleter {
    pub releases: ReleaseCounter,
}

impl CountingDeleter {
    pub fn new(releases: &ReleaseCounter) -> Self {
        Self {
            releases: releases.clone(),
        }
    }
}

impl<T: ?Sized> Deleter<T> for CountingDeleter {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self.releases.bump();
        // SAFETY: owners only hand us addresses they adopted from `Box`.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// Frees a boxed slice and counts the call, once per block.
#[derive(Clone, Debug, Default)]
pub struct CountingArrayDeleter {
    pub releases: ReleaseCounter,
}

impl CountingArrayDeleter {
    pub fn new(releases: &ReleaseCounter) -> Self {
        Self {
            releases: releases.clone(),
        }
    }
}

impl<T> Deleter<[T]> for CountingArrayDeleter {
    unsafe fn delete(&mut self, ptr: NonNull<[T]>) {
        self.releases.bump();
        // SAFETY: owners only hand us blocks they adopted from `Box<[T]>`.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// A resource that counts its own destruction.
#[derive(Debug)]
pub struct Widget {
    pub value: i32,
    drops: ReleaseCounter,
}

impl Widget {
    pub fn new(value: i32, drops: &ReleaseCounter) -> Self {
        Self {
            value,
            drops: drops.clone(),
        }
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        self.drops.bump();
    }
}

/// Box `value` into an owner whose releases are counted by `releases`.
pub fn counted_owner<T>(value: T, releases: &ReleaseCounter) -> UniqueOwner<T, CountingDeleter> {
    let ptr = NonNull::from(Box::leak(Box::new(value)));
    // SAFETY: `ptr` is a fresh `Box` allocation, which `CountingDeleter` frees.
    unsafe { UniqueOwner::with_deleter(Some(ptr), CountingDeleter::new(releases)) }
}

/// Box `values` into an array owner whose releases are counted by `releases`.
pub fn counted_array<T>(
    values: Vec<T>,
    releases: &ReleaseCounter,
) -> UniqueArray<T, CountingArrayDeleter> {
    let ptr = NonNull::from(Box::leak(values.into_boxed_slice()));
    // SAFETY: `ptr` is a fresh `Box<[T]>` allocation, which
    // `CountingArrayDeleter` frees.
    unsafe { UniqueArray::with_deleter(Some(ptr), CountingArrayDeleter::new(releases)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_clones_share_count() {
        let counter = ReleaseCounter::new();
        let clone = counter.clone();
        clone.bump();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn widget_counts_drop() {
        let drops = ReleaseCounter::new();
        drop(Widget::new(1, &drops));
        assert_eq!(drops.count(), 1);
    }

    #[test]
    fn counted_owner_releases_once() {
        let releases = ReleaseCounter::new();
        drop(counted_owner(5u8, &releases));
        assert_eq!(releases.count(), 1);
    }
}
