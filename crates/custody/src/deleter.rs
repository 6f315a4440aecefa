//! Release policies.
//!
//! A [`Deleter`] is invoked by an owner with the address it holds, exactly
//! once, when that address must be released. The two default policies
//! mirror the two storage shapes: [`DefaultDelete`] frees a single boxed
//! value, [`DefaultDeleteArray`] frees a boxed slice as one block.
//!
//! Any `FnMut(NonNull<T>)` closure or plain `fn` pointer is also a deleter.

use std::ptr::NonNull;

/// A release policy for resources of type `T`.
pub trait Deleter<T: ?Sized> {
    /// Release the resource at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live resource that this policy knows how to
    /// release (for the default policies: memory obtained from `Box`), and
    /// nothing may use `ptr` after the call. Owners guarantee this by
    /// calling `delete` at most once per address they hold.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

impl<T: ?Sized, F> Deleter<T> for F
where
    F: FnMut(NonNull<T>),
{
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self(ptr)
    }
}

/// Releases a single value allocated through `Box`.
///
/// Works for unsized targets too: a `dyn Trait` pointer obtained by
/// coercing a boxed concrete value is dropped through its vtable and
/// deallocated with the concrete layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DefaultDelete;

impl<T: ?Sized> Deleter<T> for DefaultDelete {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // SAFETY: the caller guarantees `ptr` came from `Box` and is not
        // used again.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// Releases a runtime-sized array allocated as `Box<[T]>`.
///
/// Every element is dropped and the block is deallocated in one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DefaultDeleteArray;

impl<T> Deleter<[T]> for DefaultDeleteArray {
    unsafe fn delete(&mut self, ptr: NonNull<[T]>) {
        // SAFETY: the caller guarantees `ptr` came from `Box<[T]>` (length
        // included) and is not used again.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}
