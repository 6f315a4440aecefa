//! Benchmark payloads and workloads for the custody owner handles.
//!
//! - [`Payload`]: a cache-line sized value with a non-trivial drop
//! - [`move_chain`]: pass one owner through a chain of slots
//! - [`churn_resets`]: repeatedly replace the resource held by one owner

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use custody::{make_owner, UniqueOwner};

/// A 64-byte value whose drop touches memory, so release is observable.
#[derive(Clone, Debug, Default)]
pub struct Payload {
    /// Payload words.
    pub words: [u64; 8],
}

impl Payload {
    /// A payload filled with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { words: [seed; 8] }
    }

    /// Sum of all words.
    pub fn checksum(&self) -> u64 {
        self.words.iter().copied().fold(0, u64::wrapping_add)
    }
}

/// Move one owner through `hops` slots and return the final holder.
///
/// Every intermediate slot ends up empty.
pub fn move_chain(seed: u64, hops: usize) -> UniqueOwner<Payload> {
    let mut slots: Vec<UniqueOwner<Payload>> =
        (0..hops.max(1)).map(|_| UniqueOwner::null()).collect();
    slots[0] = make_owner(Payload::new(seed));
    for i in 1..slots.len() {
        let moved = slots[i - 1].take();
        slots[i] = moved;
    }
    slots.pop().unwrap_or_default()
}

/// Replace the resource held by one owner `rounds` times.
///
/// Returns the checksum of the last payload.
pub fn churn_resets(rounds: u64) -> u64 {
    let mut owner = make_owner(Payload::new(0));
    for seed in 1..=rounds {
        owner = make_owner(Payload::new(seed));
    }
    owner.as_ref().map_or(0, Payload::checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody::NULL;

    #[test]
    fn move_chain_ends_with_single_holder() {
        let owner = move_chain(3, 16);
        assert!(owner != NULL);
        assert_eq!(owner.checksum(), 24);
    }

    #[test]
    fn move_chain_with_zero_hops_still_holds() {
        assert!(move_chain(1, 0).is_some());
    }

    #[test]
    fn churn_keeps_last_payload() {
        assert_eq!(churn_resets(5), 40);
        assert_eq!(churn_resets(0), 0);
    }
}
