//! Exclusive single-owner handles with pluggable release policies.
//!
//! An owner is the sole custodian of one heap resource and releases it
//! through its [`Deleter`] exactly once, when it is reset or dropped.
//! There is no reference counting: custody moves between owners, and the
//! source of a transfer never releases what it gave away.
//!
//! # Architecture
//!
//! ```text
//! Factory (make_owner / make_array / *_for_overwrite, Factory + FactoryConfig)
//! ├── UniqueOwner<T, D = DefaultDelete>        one value, T may be unsized
//! └── UniqueArray<T, D = DefaultDeleteArray>   one runtime-sized [T] block
//!         ├── Custody    get / release / reset / deleter (shared capability set)
//!         └── Addressed  address-based ==, <, cmp, Hash; NULL sentinel
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use custody::prelude::*;
//!
//! struct Widget {
//!     value: i32,
//! }
//!
//! let mut first = make_owner(Widget { value: 42 });
//! assert_eq!(first.value, 42);
//!
//! let mut second = first.take();
//! assert!(first == NULL);
//! assert_eq!(second.value, 42);
//!
//! second.clear();
//! assert!(second.is_null());
//! ```
//!
//! # Safety
//!
//! Everything that adopts a raw address is `unsafe` and states what the
//! address must satisfy. The safe surface (factories, `Box` conversions,
//! moves, `release`, `clear`) cannot double-release or leak.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod addr;
pub mod array;
pub mod config;
pub mod deleter;
pub mod error;
pub mod factory;
mod raw;
pub mod scalar;
pub mod traits;

// Public re-exports for the primary API surface.
pub use addr::{compare_addresses, Addressed, Null, NULL};
pub use array::UniqueArray;
pub use config::FactoryConfig;
pub use deleter::{DefaultDelete, DefaultDeleteArray, Deleter};
pub use error::OwnerError;
pub use factory::{
    make_array, make_array_for_overwrite, make_owner, make_owner_for_overwrite, Factory,
};
pub use scalar::UniqueOwner;
pub use traits::{hand_over, Custody};

/// Common imports for owner users.
///
/// ```rust
/// use custody::prelude::*;
/// ```
pub mod prelude {
    pub use crate::addr::{Addressed, NULL};
    pub use crate::array::UniqueArray;
    pub use crate::coerce_owner;
    pub use crate::deleter::{DefaultDelete, DefaultDeleteArray, Deleter};
    pub use crate::factory::{
        make_array, make_array_for_overwrite, make_owner, make_owner_for_overwrite,
    };
    pub use crate::scalar::UniqueOwner;
    pub use crate::traits::Custody;
}
