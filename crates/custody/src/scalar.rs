//! Exclusive ownership of a single heap value.
//!
//! [`UniqueOwner<T, D>`] holds at most one address and releases it through
//! its deleter `D` exactly once: on [`reset`](UniqueOwner::reset), on
//! [`clear`](UniqueOwner::clear), or when dropped. Custody leaves an owner
//! only through [`release`](UniqueOwner::release), a move, or one of the
//! converting transfers, and the source never releases what it gave away.
//!
//! `T` may be unsized. A concrete owner becomes a trait-object owner with
//! [`coerce_owner!`](crate::coerce_owner), which is how ownership moves
//! "up" from a concrete resource to an interface it implements.

use std::fmt;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use log::trace;

use crate::addr::{address_relations, Addressed, Null};
use crate::deleter::{DefaultDelete, Deleter};
use crate::raw;
use crate::traits::Custody;

/// An exclusive owner of one resource of type `T`, released through `D`.
///
/// Not `Clone`: at most one `UniqueOwner` holds a given address.
pub struct UniqueOwner<T: ?Sized, D: Deleter<T> = DefaultDelete> {
    /// The held address; `None` is the empty state.
    ptr: Option<NonNull<T>>,
    deleter: D,
}

// SAFETY: a `UniqueOwner` is the sole custodian of its resource, so moving
// it to another thread moves the `T` and the `D`, like `Box<T>`.
unsafe impl<T: ?Sized + Send, D: Deleter<T> + Send> Send for UniqueOwner<T, D> {}

// SAFETY: shared access only hands out `&T` and `&D`.
unsafe impl<T: ?Sized + Sync, D: Deleter<T> + Sync> Sync for UniqueOwner<T, D> {}

impl<T: ?Sized, D: Deleter<T> + Default> UniqueOwner<T, D> {
    /// An empty owner with a default-constructed deleter.
    pub fn null() -> Self {
        Self {
            ptr: None,
            deleter: D::default(),
        }
    }

    /// Take custody of `ptr` with a default-constructed deleter.
    ///
    /// # Safety
    ///
    /// `ptr` must be releasable by `D` and in nobody else's custody.
    pub unsafe fn from_non_null(ptr: NonNull<T>) -> Self {
        Self {
            ptr: Some(ptr),
            deleter: D::default(),
        }
    }

    /// Move custody out, leaving `self` empty with a fresh deleter.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::null())
    }
}

impl<T, D: Deleter<T> + Default> UniqueOwner<T, D> {
    /// Take custody of a raw pointer; null yields an empty owner.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be releasable by `D` and in nobody else's
    /// custody.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            deleter: D::default(),
        }
    }
}

impl<T: ?Sized> UniqueOwner<T> {
    /// Take custody of a boxed value.
    pub fn from_box(boxed: Box<T>) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(boxed))),
            deleter: DefaultDelete,
        }
    }

    /// Give up custody as a `Box`, or `None` if empty.
    pub fn into_box(mut self) -> Option<Box<T>> {
        // SAFETY: with `DefaultDelete`, every held address came from `Box`.
        self.release()
            .map(|ptr| unsafe { Box::from_raw(ptr.as_ptr()) })
    }
}

impl<T: ?Sized, D: Deleter<T>> UniqueOwner<T, D> {
    /// Take custody of `ptr` (possibly empty) with an explicit deleter.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be releasable by `deleter` and in nobody
    /// else's custody.
    pub unsafe fn with_deleter(ptr: Option<NonNull<T>>, deleter: D) -> Self {
        Self { ptr, deleter }
    }

    /// The held address, without giving up custody.
    #[inline]
    pub fn get(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// The release policy.
    #[inline]
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Mutable access to the release policy.
    #[inline]
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Whether nothing is held.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Whether an address is held.
    #[inline]
    pub fn is_some(&self) -> bool {
        self.ptr.is_some()
    }

    /// Give up custody and return the held address.
    ///
    /// The owner is empty afterwards and its deleter is never invoked for
    /// the returned address.
    #[inline]
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Release the held address (if any), then take custody of `ptr`.
    ///
    /// The old resource is fully released by the current deleter before
    /// `ptr` is installed. Resetting to the address already held does
    /// nothing: the deleter is not called and custody is unchanged. A
    /// zero-sized resource is always released, since every zero-sized
    /// resource shares one dangling address.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be releasable by this owner's deleter and, unless
    /// it is the address already held, in nobody else's custody. For a
    /// zero-sized target, `ptr` must denote a resource other than the held
    /// one.
    pub unsafe fn reset(&mut self, ptr: Option<NonNull<T>>) {
        // SAFETY: a held address is live until released.
        if unsafe { raw::is_self_reset(self.ptr, ptr) } {
            return;
        }
        if let Some(old) = self.ptr.take() {
            // SAFETY: `old` was in our custody and has just been detached.
            unsafe { self.dispose(old) };
        }
        self.ptr = ptr;
    }

    /// Release the held address, leaving the owner empty.
    pub fn clear(&mut self) {
        // SAFETY: installing the empty state carries no obligation.
        unsafe { self.reset(None) }
    }

    /// Exchange address and deleter with `other`.
    ///
    /// This is the move-assignment form that never releases anything
    /// itself: each side's resource is released later by whichever owner
    /// ends up holding it.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Shared access to the held value.
    #[inline]
    pub fn as_ref(&self) -> Option<&T> {
        // SAFETY: a held address is live for as long as we hold it, and
        // `&self` prevents it from being released meanwhile.
        self.ptr.map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Exclusive access to the held value.
    #[inline]
    pub fn as_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as in `as_ref`; `&mut self` makes the access exclusive.
        self.ptr.map(|mut ptr| unsafe { ptr.as_mut() })
    }

    /// Split into the held address and the deleter without releasing.
    pub fn into_raw_parts(self) -> (Option<NonNull<T>>, D) {
        let mut this = ManuallyDrop::new(self);
        let ptr = this.ptr.take();
        // SAFETY: `this` is never dropped, so the deleter is moved out
        // exactly once.
        let deleter = unsafe { ptr::read(&this.deleter) };
        (ptr, deleter)
    }

    /// Move custody into an owner whose deleter is built from ours.
    ///
    /// This is the converting move: the address is released from `self`
    /// and adopted by the result in one step.
    pub fn convert_deleter<E>(self) -> UniqueOwner<T, E>
    where
        E: Deleter<T> + From<D>,
    {
        let (ptr, deleter) = self.into_raw_parts();
        UniqueOwner {
            ptr,
            deleter: E::from(deleter),
        }
    }

    /// Move custody into an owner of a different target type.
    ///
    /// `cast` maps the held address; it is not called for an empty owner.
    /// Prefer [`coerce_owner!`](crate::coerce_owner), which only permits
    /// compiler-checked unsizing casts.
    ///
    /// # Safety
    ///
    /// The pointer returned by `cast` must denote the same resource, and
    /// `E` built from our deleter must be able to release it.
    pub unsafe fn cast_into<U, E>(
        self,
        cast: impl FnOnce(NonNull<T>) -> NonNull<U>,
    ) -> UniqueOwner<U, E>
    where
        U: ?Sized,
        E: Deleter<U> + From<D>,
    {
        let (ptr, deleter) = self.into_raw_parts();
        UniqueOwner {
            ptr: ptr.map(cast),
            deleter: E::from(deleter),
        }
    }

    /// Run the deleter on a detached address.
    ///
    /// # Safety
    ///
    /// `ptr` must have been in this owner's custody and no longer be stored
    /// in `self.ptr`.
    unsafe fn dispose(&mut self, ptr: NonNull<T>) {
        trace!("releasing owned value at {ptr:p}");
        // SAFETY: forwarded from the caller.
        unsafe { self.deleter.delete(ptr) }
    }
}

impl<T, D: Deleter<T>> UniqueOwner<T, D> {
    /// The held address as a raw pointer, null when empty.
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// The element `index` positions past the held address.
    ///
    /// Pointer-arithmetic access for owners whose resource is the first of
    /// several contiguous values. No bounds are checked.
    ///
    /// # Safety
    ///
    /// The owner must be non-empty and `index` must stay within the
    /// allocation the held address belongs to.
    pub unsafe fn offset_unchecked(&self, index: usize) -> &T {
        // SAFETY: forwarded from the caller.
        unsafe { &*self.as_ptr().add(index) }
    }
}

impl<T> UniqueOwner<MaybeUninit<T>> {
    /// Reinterpret overwrite-only storage as initialised.
    ///
    /// # Safety
    ///
    /// A held value must have been fully initialised.
    pub unsafe fn assume_init(self) -> UniqueOwner<T> {
        let (ptr, deleter) = self.into_raw_parts();
        UniqueOwner {
            ptr: ptr.map(NonNull::cast::<T>),
            deleter,
        }
    }

    /// Initialise the held storage with `value`.
    ///
    /// An empty owner stays empty and `value` is dropped.
    pub fn write(mut self, value: T) -> UniqueOwner<T> {
        if let Some(slot) = self.as_mut() {
            slot.write(value);
        }
        // SAFETY: the slot, if any, was initialised just above.
        unsafe { self.assume_init() }
    }
}

impl<T: ?Sized, D: Deleter<T>> Drop for UniqueOwner<T, D> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` was in our custody and has just been detached.
            unsafe { self.dispose(ptr) };
        }
    }
}

impl<T: ?Sized, D: Deleter<T> + Default> Default for UniqueOwner<T, D> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, D: Deleter<T> + Default> From<Null> for UniqueOwner<T, D> {
    fn from(_: Null) -> Self {
        Self::null()
    }
}

impl<T: ?Sized> From<Box<T>> for UniqueOwner<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_box(boxed)
    }
}

impl<T: ?Sized, D: Deleter<T>> Deref for UniqueOwner<T, D> {
    type Target = T;

    fn deref(&self) -> &T {
        self.as_ref().expect("dereferenced an empty UniqueOwner")
    }
}

impl<T: ?Sized, D: Deleter<T>> DerefMut for UniqueOwner<T, D> {
    fn deref_mut(&mut self) -> &mut T {
        self.as_mut().expect("dereferenced an empty UniqueOwner")
    }
}

impl<T: ?Sized + fmt::Debug, D: Deleter<T>> fmt::Debug for UniqueOwner<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ref() {
            Some(value) => f.debug_tuple("UniqueOwner").field(&value).finish(),
            None => f.write_str("UniqueOwner(null)"),
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> fmt::Pointer for UniqueOwner<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.address(), f)
    }
}

impl<T: ?Sized, D: Deleter<T>> Addressed for UniqueOwner<T, D> {
    #[inline]
    fn address(&self) -> *const () {
        raw::thin(self.ptr)
    }
}

address_relations!([T: ?Sized, D: Deleter<T>] UniqueOwner<T, D>);

impl<T: ?Sized, D: Deleter<T>> Custody for UniqueOwner<T, D> {
    type Target = T;
    type Deleter = D;

    fn get(&self) -> Option<NonNull<T>> {
        UniqueOwner::get(self)
    }

    fn release(&mut self) -> Option<NonNull<T>> {
        UniqueOwner::release(self)
    }

    unsafe fn reset(&mut self, ptr: Option<NonNull<T>>) {
        // SAFETY: forwarded from the caller.
        unsafe { UniqueOwner::reset(self, ptr) }
    }

    fn deleter(&self) -> &D {
        UniqueOwner::deleter(self)
    }

    fn deleter_mut(&mut self) -> &mut D {
        UniqueOwner::deleter_mut(self)
    }

    fn is_null(&self) -> bool {
        UniqueOwner::is_null(self)
    }
}

/// Convert an owner into an owner of a supertype, such as a trait object.
///
/// Only casts the compiler accepts as implicit unsizing coercions are
/// allowed, so the address and its release policy stay valid. The deleter
/// is converted with `From`; name it explicitly when inference cannot.
///
/// ```
/// use std::fmt::Debug;
/// use custody::{coerce_owner, make_owner, UniqueOwner};
///
/// let concrete = make_owner(7u32);
/// let erased: UniqueOwner<dyn Debug> = coerce_owner!(concrete => dyn Debug);
/// assert_eq!(format!("{erased:?}"), "UniqueOwner(7)");
/// ```
#[macro_export]
macro_rules! coerce_owner {
    ($owner:expr => $target:ty) => {
        $crate::coerce_owner!($owner => $target, _)
    };
    ($owner:expr => $target:ty, $deleter:ty) => {{
        let owner = $owner;
        // SAFETY: the closure performs an unsizing coercion checked by the
        // compiler; the address and allocation are unchanged.
        unsafe {
            owner.cast_into::<$target, $deleter>(
                |ptr| -> ::core::ptr::NonNull<$target> { ptr },
            )
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts releases, then frees the `Box` allocation.
    #[derive(Clone, Default)]
    struct Tally {
        released: Rc<Cell<usize>>,
    }

    impl Tally {
        fn count(&self) -> usize {
            self.released.get()
        }
    }

    impl<T: ?Sized> Deleter<T> for Tally {
        unsafe fn delete(&mut self, ptr: NonNull<T>) {
            self.released.set(self.released.get() + 1);
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }

    fn tracked(value: u32, tally: &Tally) -> UniqueOwner<u32, Tally> {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        unsafe { UniqueOwner::with_deleter(Some(ptr), tally.clone()) }
    }

    #[test]
    fn drop_releases_once() {
        let tally = Tally::default();
        {
            let owner = tracked(1, &tally);
            assert!(owner.is_some());
        }
        assert_eq!(tally.count(), 1);
    }

    #[test]
    fn empty_owner_never_releases() {
        let tally = Tally::default();
        let owner: UniqueOwner<u32, Tally> =
            unsafe { UniqueOwner::with_deleter(None, tally.clone()) };
        assert!(owner.is_null());
        drop(owner);
        assert_eq!(tally.count(), 0);
    }

    #[test]
    fn release_disowns() {
        let tally = Tally::default();
        let mut owner = tracked(5, &tally);
        let ptr = owner.release().unwrap();
        assert!(owner.is_null());
        drop(owner);
        assert_eq!(tally.count(), 0);
        // Reclaim manually.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }

    #[test]
    fn reset_releases_previous_then_adopts() {
        let tally = Tally::default();
        let mut owner = tracked(1, &tally);
        let next = NonNull::from(Box::leak(Box::new(2u32)));
        unsafe { owner.reset(Some(next)) };
        assert_eq!(tally.count(), 1);
        assert_eq!(owner.get(), Some(next));
        assert_eq!(*owner, 2);
        drop(owner);
        assert_eq!(tally.count(), 2);
    }

    #[test]
    fn self_reset_is_noop() {
        let tally = Tally::default();
        let mut owner = tracked(3, &tally);
        let held = owner.get();
        unsafe { owner.reset(held) };
        assert_eq!(tally.count(), 0);
        assert_eq!(owner.get(), held);
        assert_eq!(*owner, 3);
        drop(owner);
        assert_eq!(tally.count(), 1);
    }

    #[test]
    fn reset_between_zero_sized_values_releases_previous() {
        let tally = Tally::default();
        let first = NonNull::from(Box::leak(Box::new(())));
        let second = NonNull::from(Box::leak(Box::new(())));
        assert_eq!(first, second);
        let mut owner: UniqueOwner<(), Tally> =
            unsafe { UniqueOwner::with_deleter(Some(first), tally.clone()) };
        unsafe { owner.reset(Some(second)) };
        assert_eq!(tally.count(), 1);
        drop(owner);
        assert_eq!(tally.count(), 2);
    }

    #[test]
    fn clear_empties() {
        let tally = Tally::default();
        let mut owner = tracked(3, &tally);
        owner.clear();
        assert!(owner.is_null());
        assert_eq!(tally.count(), 1);
        owner.clear();
        assert_eq!(tally.count(), 1);
    }

    #[test]
    fn swap_exchanges_custody() {
        let tally = Tally::default();
        let mut a = tracked(1, &tally);
        let mut b: UniqueOwner<u32, Tally> = UniqueOwner::null();
        a.swap(&mut b);
        assert!(a.is_null());
        assert_eq!(*b, 1);
        drop(a);
        assert_eq!(tally.count(), 0);
        drop(b);
        assert_eq!(tally.count(), 1);
    }

    #[test]
    fn take_leaves_source_empty() {
        let tally = Tally::default();
        let mut source = tracked(9, &tally);
        let dest = source.take();
        assert!(source.is_null());
        assert_eq!(*dest, 9);
        drop(source);
        assert_eq!(tally.count(), 0);
        drop(dest);
        assert_eq!(tally.count(), 1);
    }

    #[test]
    fn from_box_round_trips() {
        let owner = UniqueOwner::from_box(Box::new(String::from("held")));
        let boxed = owner.into_box().unwrap();
        assert_eq!(*boxed, "held");
    }

    #[test]
    fn from_raw_null_is_empty() {
        let owner: UniqueOwner<u8> = unsafe { UniqueOwner::from_raw(ptr::null_mut()) };
        assert!(owner.is_null());
        assert!(owner.as_ptr().is_null());
        assert!(owner.into_box().is_none());
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty UniqueOwner")]
    fn deref_empty_panics() {
        let owner: UniqueOwner<u32> = UniqueOwner::null();
        let _value: u32 = *owner;
    }

    #[test]
    fn write_initialises_storage() {
        let slot = UniqueOwner::from_box(Box::<u64>::new_uninit());
        let owner = slot.write(11);
        assert_eq!(*owner, 11);
    }

    #[test]
    fn offset_unchecked_walks_block() {
        let block: Box<[u16]> = vec![10, 20, 30].into_boxed_slice();
        let first = NonNull::from(Box::leak(block)).cast::<u16>();
        let owner: UniqueOwner<u16, fn(NonNull<u16>)> =
            unsafe { UniqueOwner::with_deleter(Some(first), |_| {}) };
        assert_eq!(unsafe { *owner.offset_unchecked(2) }, 30);
        // Reclaim the block as a whole.
        let (ptr, _) = owner.into_raw_parts();
        let ptr = ptr.unwrap();
        drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr.as_ptr(), 3)) });
    }

    #[test]
    fn pointer_format_prints_address() {
        let owner: UniqueOwner<u32> = UniqueOwner::null();
        assert_eq!(format!("{owner:p}"), format!("{:p}", ptr::null::<()>()));
        assert_eq!(format!("{owner:?}"), "UniqueOwner(null)");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn moves_never_duplicate_release(
                moves in proptest::collection::vec(0u8..3, 0..32),
            ) {
                let tally = Tally::default();
                let mut held = tracked(7, &tally);
                let mut spare: UniqueOwner<u32, Tally> = UniqueOwner::null();
                for step in moves {
                    match step {
                        0 => held.swap(&mut spare),
                        1 if held.is_some() => spare = held.take(),
                        1 => held = spare.take(),
                        _ => {
                            let moved = held;
                            held = moved;
                        }
                    }
                    prop_assert_eq!(tally.count(), 0);
                }
                drop(held);
                drop(spare);
                prop_assert_eq!(tally.count(), 1);
            }
        }
    }
}
