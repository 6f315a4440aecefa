//! Construct-and-own in one call.
//!
//! The free functions allocate with the global allocator and panic on
//! allocation failure, like `Box` and `Vec`. [`Factory`] applies a
//! [`FactoryConfig`] and reports oversized requests as [`OwnerError`]
//! instead.
//!
//! The storage shape is chosen by the function, never inferred from `T`:
//! [`make_owner`] always produces a single-value owner (a `[T; N]` value
//! included, which is then released as the one value it is), and only the
//! `*_array` functions produce a [`UniqueArray`].

use std::alloc::Layout;
use std::iter;
use std::mem::{self, MaybeUninit};

use log::{debug, trace};

use crate::array::UniqueArray;
use crate::config::FactoryConfig;
use crate::error::OwnerError;
use crate::scalar::UniqueOwner;

/// Allocate `value` and return its owner.
pub fn make_owner<T>(value: T) -> UniqueOwner<T> {
    trace!("make_owner: {} bytes", mem::size_of::<T>());
    UniqueOwner::from_box(Box::new(value))
}

/// Allocate `len` default-valued elements and return their owner.
pub fn make_array<T: Default>(len: usize) -> UniqueArray<T> {
    trace!("make_array: {len} x {} bytes", mem::size_of::<T>());
    UniqueArray::from_box(iter::repeat_with(T::default).take(len).collect())
}

/// Allocate uninitialised storage for one `T`.
///
/// Write it with [`UniqueOwner::write`], or initialise it in place and call
/// [`UniqueOwner::assume_init`].
pub fn make_owner_for_overwrite<T>() -> UniqueOwner<MaybeUninit<T>> {
    trace!("make_owner_for_overwrite: {} bytes", mem::size_of::<T>());
    UniqueOwner::from_box(Box::new_uninit())
}

/// Allocate uninitialised storage for `len` elements.
///
/// Initialise every element, then call [`UniqueArray::assume_init`].
pub fn make_array_for_overwrite<T>(len: usize) -> UniqueArray<MaybeUninit<T>> {
    trace!("make_array_for_overwrite: {len} x {} bytes", mem::size_of::<T>());
    UniqueArray::from_box(Box::new_uninit_slice(len))
}

/// A configured allocator front-end for owners.
///
/// Requests are checked against [`FactoryConfig::max_alloc_bytes`] before
/// anything is allocated.
#[derive(Clone, Debug, Default)]
pub struct Factory {
    config: FactoryConfig,
}

impl Factory {
    /// Create a factory with the given configuration.
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// The configuration this factory was built with.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Allocate `value` if it fits within the limit.
    pub fn try_make_owner<T>(&self, value: T) -> Result<UniqueOwner<T>, OwnerError> {
        self.admit(mem::size_of::<T>())?;
        Ok(make_owner(value))
    }

    /// Allocate `len` default-valued elements if they fit within the limit.
    pub fn try_make_array<T: Default>(&self, len: usize) -> Result<UniqueArray<T>, OwnerError> {
        self.admit(array_bytes::<T>(len)?)?;
        Ok(make_array(len))
    }

    /// Allocate storage for one `T` if it fits within the limit.
    ///
    /// The storage is zeroed when [`FactoryConfig::zero_overwrite`] is set.
    pub fn try_make_owner_for_overwrite<T>(
        &self,
    ) -> Result<UniqueOwner<MaybeUninit<T>>, OwnerError> {
        self.admit(mem::size_of::<T>())?;
        let mut owner = make_owner_for_overwrite::<T>();
        if self.config.zero_overwrite {
            if let Some(slot) = owner.as_mut() {
                *slot = MaybeUninit::zeroed();
            }
        }
        Ok(owner)
    }

    /// Allocate storage for `len` elements if it fits within the limit.
    ///
    /// The storage is zeroed when [`FactoryConfig::zero_overwrite`] is set.
    pub fn try_make_array_for_overwrite<T>(
        &self,
        len: usize,
    ) -> Result<UniqueArray<MaybeUninit<T>>, OwnerError> {
        self.admit(array_bytes::<T>(len)?)?;
        let mut array = make_array_for_overwrite::<T>(len);
        if self.config.zero_overwrite {
            array.fill_with(MaybeUninit::zeroed);
        }
        Ok(array)
    }

    fn admit(&self, bytes: usize) -> Result<(), OwnerError> {
        if self.config.admits(bytes) {
            return Ok(());
        }
        debug!(
            "factory rejected {bytes} byte request (limit {})",
            self.config.max_alloc_bytes
        );
        Err(OwnerError::LimitExceeded {
            requested: bytes,
            limit: self.config.max_alloc_bytes,
        })
    }
}

/// Byte size of `len` elements of `T`, or `CapacityOverflow`.
fn array_bytes<T>(len: usize) -> Result<usize, OwnerError> {
    Layout::array::<T>(len)
        .map(|layout| layout.size())
        .map_err(|_| OwnerError::CapacityOverflow {
            len,
            elem_size: mem::size_of::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_owner_holds_value() {
        let owner = make_owner(String::from("held"));
        assert_eq!(owner.as_str(), "held");
    }

    #[test]
    fn make_array_value_initialises() {
        let array = make_array::<u32>(4);
        assert_eq!(array.len(), 4);
        assert!(array.iter().all(|&v| v == 0));
    }

    #[test]
    fn make_array_zero_len_is_not_null() {
        let array = make_array::<u8>(0);
        assert!(array.is_some());
        assert!(array.is_empty());
    }

    #[test]
    fn fixed_size_array_is_one_value() {
        let owner = make_owner([1u8, 2, 3]);
        assert_eq!(owner.len(), 3);
        assert_eq!(owner[2], 3);
    }

    #[test]
    fn overwrite_array_then_assume_init() {
        let mut array = make_array_for_overwrite::<u16>(3);
        for (i, slot) in array.iter_mut().enumerate() {
            slot.write(i as u16 * 10);
        }
        let array = unsafe { array.assume_init() };
        assert_eq!(array.as_slice(), &[0, 10, 20]);
    }

    #[test]
    fn factory_rejects_over_limit() {
        let factory = Factory::new(FactoryConfig::new(16));
        let err = factory.try_make_array::<u64>(3).unwrap_err();
        assert_eq!(
            err,
            OwnerError::LimitExceeded {
                requested: 24,
                limit: 16
            }
        );
        assert!(factory.try_make_array::<u64>(2).is_ok());
    }

    #[test]
    fn factory_rejects_oversized_scalar() {
        let factory = Factory::new(FactoryConfig::new(4));
        assert!(factory.try_make_owner(0u64).is_err());
        assert!(factory.try_make_owner(0u32).is_ok());
    }

    #[test]
    fn factory_reports_capacity_overflow() {
        let factory = Factory::default();
        let err = factory.try_make_array::<u64>(usize::MAX).unwrap_err();
        assert!(matches!(err, OwnerError::CapacityOverflow { elem_size: 8, .. }));
    }

    #[test]
    fn zero_overwrite_zeroes_storage() {
        let config = FactoryConfig {
            zero_overwrite: true,
            ..FactoryConfig::default()
        };
        let factory = Factory::new(config);
        let array = factory.try_make_array_for_overwrite::<u32>(8).unwrap();
        let array = unsafe { array.assume_init() };
        assert!(array.iter().all(|&v| v == 0));

        let owner = factory.try_make_owner_for_overwrite::<u64>().unwrap();
        let owner = unsafe { owner.assume_init() };
        assert_eq!(*owner, 0);
    }
}
