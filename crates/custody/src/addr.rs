//! Address-based comparison and the empty sentinel.
//!
//! Every relation between owners is derived from one primitive,
//! [`compare_addresses`], over the thin address each side reports through
//! [`Addressed`]. Element type, storage shape, and deleter play no part:
//! two owners are equal iff they hold the same address, and an empty owner
//! sorts with the null address.

use std::cmp::Ordering;
use std::fmt;

/// Something that can report the address of the resource it refers to.
pub trait Addressed {
    /// Thin address of the held resource, or null when nothing is held.
    fn address(&self) -> *const ();
}

/// Total order over the addresses reported by `a` and `b`.
#[inline]
pub fn compare_addresses<A, B>(a: &A, b: &B) -> Ordering
where
    A: Addressed + ?Sized,
    B: Addressed + ?Sized,
{
    a.address().cmp(&b.address())
}

/// The empty sentinel: compares like an owner that holds nothing.
///
/// `owner == NULL` is the emptiness test, and `owner > NULL` holds for
/// every non-empty owner.
#[derive(Clone, Copy, Default)]
pub struct Null;

/// The [`Null`] sentinel value.
pub const NULL: Null = Null;

impl Addressed for Null {
    fn address(&self) -> *const () {
        std::ptr::null()
    }
}

impl fmt::Debug for Null {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NULL")
    }
}

/// Implements the full comparison suite for an [`Addressed`] type.
///
/// Generates `PartialEq<O>` and `PartialOrd<O>` against every addressed
/// `O` (other owners, [`Null`]), plus `Eq`, `Ord`, and `Hash`, all through
/// [`compare_addresses`].
macro_rules! address_relations {
    ([$($gen:tt)*] $ty:ty) => {
        impl<$($gen)*, O> PartialEq<O> for $ty
        where
            O: $crate::addr::Addressed + ?Sized,
        {
            #[inline]
            fn eq(&self, other: &O) -> bool {
                $crate::addr::compare_addresses(self, other).is_eq()
            }
        }

        impl<$($gen)*> Eq for $ty {}

        impl<$($gen)*, O> PartialOrd<O> for $ty
        where
            O: $crate::addr::Addressed + ?Sized,
        {
            #[inline]
            fn partial_cmp(&self, other: &O) -> Option<::std::cmp::Ordering> {
                Some($crate::addr::compare_addresses(self, other))
            }
        }

        impl<$($gen)*> Ord for $ty {
            #[inline]
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                $crate::addr::compare_addresses(self, other)
            }
        }

        impl<$($gen)*> ::std::hash::Hash for $ty {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(&$crate::addr::Addressed::address(self), state);
            }
        }
    };
}

pub(crate) use address_relations;

impl<O: Addressed + ?Sized> PartialEq<O> for Null {
    fn eq(&self, other: &O) -> bool {
        compare_addresses(self, other).is_eq()
    }
}

impl Eq for Null {}

impl<O: Addressed + ?Sized> PartialOrd<O> for Null {
    fn partial_cmp(&self, other: &O) -> Option<Ordering> {
        Some(compare_addresses(self, other))
    }
}

impl Ord for Null {
    fn cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}
