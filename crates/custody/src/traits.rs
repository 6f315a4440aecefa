//! The capability set shared by both owner shapes.

use std::ptr::NonNull;

use crate::addr::Addressed;
use crate::deleter::Deleter;

/// Exclusive custody of one resource, released through a [`Deleter`].
///
/// Implemented by [`UniqueOwner`](crate::UniqueOwner) (a single value) and
/// [`UniqueArray`](crate::UniqueArray) (a runtime-sized block). Code that
/// only moves custody around (release, hand over, reset) can be written
/// once against this trait.
pub trait Custody: Addressed {
    /// The type of the held resource (`T` or `[T]`).
    type Target: ?Sized;

    /// The release policy.
    type Deleter: Deleter<Self::Target>;

    /// The held address, without giving up custody.
    fn get(&self) -> Option<NonNull<Self::Target>>;

    /// Give up custody and return the held address.
    ///
    /// The owner is empty afterwards; the caller is responsible for
    /// releasing the address through an equivalent policy.
    fn release(&mut self) -> Option<NonNull<Self::Target>>;

    /// Release the held address (if any) and take custody of `ptr`.
    ///
    /// Resetting to the address already held is a no-op, unless the held
    /// resource is zero-sized.
    ///
    /// # Safety
    ///
    /// `ptr`, if non-null, must be releasable by this owner's deleter and
    /// must not be in the custody of anything else.
    unsafe fn reset(&mut self, ptr: Option<NonNull<Self::Target>>);

    /// The release policy.
    fn deleter(&self) -> &Self::Deleter;

    /// Mutable access to the release policy.
    fn deleter_mut(&mut self) -> &mut Self::Deleter;

    /// Whether nothing is held.
    fn is_null(&self) -> bool {
        self.get().is_none()
    }
}

/// Move custody from `from` into `to`, releasing whatever `to` held.
///
/// The previous resource of `to` is always released by `to`'s own deleter,
/// even when it shares an address with the incoming one; the
/// deleters are then exchanged, so the adopted resource is eventually
/// released by the policy it arrived with and `from` is left empty.
pub fn hand_over<C>(from: &mut C, to: &mut C)
where
    C: Custody,
{
    let incoming = from.release();
    if let Some(old) = to.release() {
        // SAFETY: `old` left `to`'s custody just above and is released
        // through the deleter that held it.
        unsafe { to.deleter_mut().delete(old) };
    }
    // SAFETY: `to` is empty, and `incoming` left `from`'s custody above. It
    // is only released after the swap below, through `from`'s original
    // deleter.
    unsafe { to.reset(incoming) };
    std::mem::swap(from.deleter_mut(), to.deleter_mut());
}
