//! Low-level address primitives shared by both owner shapes.
//!
//! Everything that inspects a pointer without dereferencing it lives here,
//! so the comparison and reset paths agree on what "the same address" means.

use std::mem;
use std::ptr::{self, NonNull};

/// Thin address of an optional pointer, with `None` mapped to null.
///
/// Metadata (slice length, vtable) is discarded: two owners are the same
/// custodian iff their data pointers coincide.
#[inline]
pub(crate) fn thin<T: ?Sized>(ptr: Option<NonNull<T>>) -> *const () {
    match ptr {
        Some(p) => p.cast::<()>().as_ptr().cast_const(),
        None => ptr::null(),
    }
}

/// Whether two optional pointers name the same address.
#[inline]
pub(crate) fn same_address<T: ?Sized>(a: Option<NonNull<T>>, b: Option<NonNull<T>>) -> bool {
    thin(a) == thin(b)
}

/// Whether resetting from `held` to `new` leaves custody unchanged.
///
/// Every zero-sized resource sits at the same dangling address, so a
/// matching address only identifies the held resource when it occupies
/// memory. Distinct zero-sized resources are never a self-reset.
///
/// # Safety
///
/// A non-null `held` must point to a live resource.
#[inline]
pub(crate) unsafe fn is_self_reset<T: ?Sized>(
    held: Option<NonNull<T>>,
    new: Option<NonNull<T>>,
) -> bool {
    match held {
        None => new.is_none(),
        Some(ptr) => {
            // SAFETY: forwarded from the caller.
            same_address(held, new) && mem::size_of_val(unsafe { ptr.as_ref() }) != 0
        }
    }
}

/// Split a slice pointer into its element pointer and length.
#[inline]
pub(crate) fn slice_parts<T>(ptr: NonNull<[T]>) -> (NonNull<T>, usize) {
    (ptr.cast::<T>(), ptr.len())
}
