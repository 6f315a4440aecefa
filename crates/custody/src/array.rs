//! Exclusive ownership of a runtime-sized array.
//!
//! [`UniqueArray<T, D>`] is the array-shaped sibling of
//! [`UniqueOwner`](crate::UniqueOwner). It holds a `[T]` block and releases
//! the whole block in a single deleter call; its default policy,
//! [`DefaultDeleteArray`], frees `Box<[T]>` storage and nothing else.

use std::fmt;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice::{self, SliceIndex};

use log::trace;

use crate::addr::{address_relations, Addressed, Null};
use crate::deleter::{DefaultDeleteArray, Deleter};
use crate::raw;
use crate::traits::Custody;

/// An exclusive owner of a `[T]` block, released through `D`.
///
/// Not `Clone`: at most one `UniqueArray` holds a given block.
pub struct UniqueArray<T, D: Deleter<[T]> = DefaultDeleteArray> {
    /// The held block, length included; `None` is the empty state.
    ptr: Option<NonNull<[T]>>,
    deleter: D,
}

// SAFETY: sole custody of the block, as for `Box<[T]>`.
unsafe impl<T: Send, D: Deleter<[T]> + Send> Send for UniqueArray<T, D> {}

// SAFETY: shared access only hands out `&[T]` and `&D`.
unsafe impl<T: Sync, D: Deleter<[T]> + Sync> Sync for UniqueArray<T, D> {}

impl<T, D: Deleter<[T]> + Default> UniqueArray<T, D> {
    /// An empty owner with a default-constructed deleter.
    pub fn null() -> Self {
        Self {
            ptr: None,
            deleter: D::default(),
        }
    }

    /// Take custody of `len` elements starting at `data`.
    ///
    /// A null `data` yields an empty owner.
    ///
    /// # Safety
    ///
    /// A non-null `data` must start a block of exactly `len` elements that
    /// `D` can release, in nobody else's custody.
    pub unsafe fn from_raw_parts(data: *mut T, len: usize) -> Self {
        Self {
            ptr: NonNull::new(data).map(|data| NonNull::slice_from_raw_parts(data, len)),
            deleter: D::default(),
        }
    }

    /// Take custody of `ptr` with a default-constructed deleter.
    ///
    /// # Safety
    ///
    /// `ptr` must be releasable by `D` and in nobody else's custody.
    pub unsafe fn from_non_null(ptr: NonNull<[T]>) -> Self {
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

impl<T> UniqueArray<T> {
    /// Take custody of a boxed slice.
    pub fn from_box(boxed: Box<[T]>) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(boxed))),
            deleter: DefaultDeleteArray,
        }
    }

    /// Give up custody as a boxed slice, or `None` if empty.
    pub fn into_boxed_slice(mut self) -> Option<Box<[T]>> {
        // SAFETY: with `DefaultDeleteArray`, every held block came from
        // `Box<[T]>`.
        self.release()
            .map(|ptr| unsafe { Box::from_raw(ptr.as_ptr()) })
    }
}

impl<T, D: Deleter<[T]>> UniqueArray<T, D> {
    /// Take custody of `ptr` (possibly empty) with an explicit deleter.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be releasable by `deleter` and in nobody
    /// else's custody.
    pub unsafe fn with_deleter(ptr: Option<NonNull<[T]>>, deleter: D) -> Self {
        Self { ptr, deleter }
    }

    /// The held block, without giving up custody.
    #[inline]
    pub fn get(&self) -> Option<NonNull<[T]>> {
        self.ptr
    }

    /// Pointer to the first element, null when empty.
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr
            .map_or(ptr::null_mut(), |ptr| raw::slice_parts(ptr).0.as_ptr())
    }

    /// Number of elements held; zero when empty.
    #[inline]
    pub fn len(&self) -> usize {
        self.ptr.map_or(0, |ptr| ptr.len())
    }

    /// Whether the held block has no elements (or nothing is held).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
    ///
    /// A held zero-length block is not null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Whether a block is held.
    #[inline]
    pub fn is_some(&self) -> bool {
        self.ptr.is_some()
    }

    /// Give up custody and return the held block.
    #[inline]
    pub fn release(&mut self) -> Option<NonNull<[T]>> {
        self.ptr.take()
    }

    /// Release the held block (if any), then take custody of `ptr`.
    ///
    /// Resetting to the block already held does nothing, and the held
    /// length is kept. Zero-length blocks and blocks of zero-sized
    /// elements occupy no memory and are always released.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be releasable by this owner's deleter and,
    /// unless it is the block already held, in nobody else's custody. If
    /// the held block occupies no memory, `ptr` must denote another block.
    pub unsafe fn reset(&mut self, ptr: Option<NonNull<[T]>>) {
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

    /// Release the held block, leaving the owner empty.
    pub fn clear(&mut self) {
        // SAFETY: installing the empty state carries no obligation.
        unsafe { self.reset(None) }
    }

    /// Exchange block and deleter with `other`.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move-assign from `other`.
    ///
    /// The incoming block is released from `other` and adopted through
    /// [`reset`](Self::reset), which first releases our previous block
    /// with our own deleter. The deleters are then exchanged so the
    /// adopted block is released by the policy it arrived with. `other`
    /// is left empty.
    pub fn assign_from(&mut self, other: &mut Self) {
        crate::traits::hand_over(other, self);
    }

    /// The held elements; an empty slice when nothing is held.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            Some(ptr) => {
                let (data, len) = raw::slice_parts(ptr);
                // SAFETY: a held block is live and initialised for as long
                // as we hold it.
                unsafe { slice::from_raw_parts(data.as_ptr(), len) }
            }
            None => &[],
        }
    }

    /// The held elements, mutably; an empty slice when nothing is held.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.ptr {
            Some(ptr) => {
                let (data, len) = raw::slice_parts(ptr);
                // SAFETY: as in `as_slice`; `&mut self` makes it exclusive.
                unsafe { slice::from_raw_parts_mut(data.as_ptr(), len) }
            }
            None => &mut [],
        }
    }

    /// Split into the held block and the deleter without releasing.
    pub fn into_raw_parts(self) -> (Option<NonNull<[T]>>, D) {
        let mut this = ManuallyDrop::new(self);
        let ptr = this.ptr.take();
        // SAFETY: `this` is never dropped, so the deleter is moved out
        // exactly once.
        let deleter = unsafe { ptr::read(&this.deleter) };
        (ptr, deleter)
    }

    /// Move custody into an owner whose deleter is built from ours.
    pub fn convert_deleter<E>(self) -> UniqueArray<T, E>
    where
        E: Deleter<[T]> + From<D>,
    {
        let (ptr, deleter) = self.into_raw_parts();
        UniqueArray {
            ptr,
            deleter: E::from(deleter),
        }
    }

    unsafe fn dispose(&mut self, ptr: NonNull<[T]>) {
        trace!(
            "releasing owned block of {} elements at {:p}",
            ptr.len(),
            ptr.cast::<T>()
        );
        // SAFETY: forwarded from the caller.
        unsafe { self.deleter.delete(ptr) }
    }
}

impl<T> UniqueArray<MaybeUninit<T>> {
    /// Reinterpret overwrite-only storage as initialised.
    ///
    /// # Safety
    ///
    /// Every element of a held block must have been initialised.
    pub unsafe fn assume_init(self) -> UniqueArray<T> {
        let (ptr, deleter) = self.into_raw_parts();
        UniqueArray {
            ptr: ptr.map(|ptr| {
                let (data, len) = raw::slice_parts(ptr);
                NonNull::slice_from_raw_parts(data.cast::<T>(), len)
            }),
            deleter,
        }
    }
}

impl<T, D: Deleter<[T]>> Drop for UniqueArray<T, D> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` was in our custody and has just been detached.
            unsafe { self.dispose(ptr) };
        }
    }
}

impl<T, D: Deleter<[T]> + Default> Default for UniqueArray<T, D> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T, D: Deleter<[T]> + Default> From<Null> for UniqueArray<T, D> {
    fn from(_: Null) -> Self {
        Self::null()
    }
}

impl<T> From<Box<[T]>> for UniqueArray<T> {
    fn from(boxed: Box<[T]>) -> Self {
        Self::from_box(boxed)
    }
}

impl<T> From<Vec<T>> for UniqueArray<T> {
    fn from(vec: Vec<T>) -> Self {
        Self::from_box(vec.into_boxed_slice())
    }
}

impl<T, D: Deleter<[T]>> Deref for UniqueArray<T, D> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, D: Deleter<[T]>> DerefMut for UniqueArray<T, D> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, D: Deleter<[T]>, I: SliceIndex<[T]>> Index<I> for UniqueArray<T, D> {
    type Output = I::Output;

    fn index(&self, index: I) -> &I::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, D: Deleter<[T]>, I: SliceIndex<[T]>> IndexMut<I> for UniqueArray<T, D> {
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T: fmt::Debug, D: Deleter<[T]>> fmt::Debug for UniqueArray<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("UniqueArray(null)");
        }
        f.debug_tuple("UniqueArray").field(&self.as_slice()).finish()
    }
}

impl<T, D: Deleter<[T]>> fmt::Pointer for UniqueArray<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.address(), f)
    }
}

impl<T, D: Deleter<[T]>> Addressed for UniqueArray<T, D> {
    #[inline]
    fn address(&self) -> *const () {
        raw::thin(self.ptr)
    }
}

address_relations!([T, D: Deleter<[T]>] UniqueArray<T, D>);

impl<T, D: Deleter<[T]>> Custody for UniqueArray<T, D> {
    type Target = [T];
    type Deleter = D;

    fn get(&self) -> Option<NonNull<[T]>> {
        UniqueArray::get(self)
    }

    fn release(&mut self) -> Option<NonNull<[T]>> {
        UniqueArray::release(self)
    }

    unsafe fn reset(&mut self, ptr: Option<NonNull<[T]>>) {
        // SAFETY: forwarded from the caller.
        unsafe { UniqueArray::reset(self, ptr) }
    }

    fn deleter(&self) -> &D {
        UniqueArray::deleter(self)
    }

    fn deleter_mut(&mut self) -> &mut D {
        UniqueArray::deleter_mut(self)
    }

    fn is_null(&self) -> bool {
        UniqueArray::is_null(self)
    }
}
