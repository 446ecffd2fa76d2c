//! The `Slot` and `Epoch` types are defined as new types over u64 to enforce type-safety between
//! the two types.
//!
//! `Slot` and `Epoch` have implementations which permit conversion, comparison and math operations
//! between each and `u64`, however specifically not between each other.
//!
//! All math operations on `Slot` and `Epoch` are saturating, they never wrap. Use the `safe_*`
//! methods where an overflow must be reported instead.
use safe_arith::{ArithError, SafeArith};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Rem, Sub, SubAssign};

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(#[serde(with = "serde_utils::quoted_u64")] u64);

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(#[serde(with = "serde_utils::quoted_u64")] u64);

macro_rules! impl_common {
    ($main: ident) => {
        impl $main {
            pub const fn new(n: u64) -> $main {
                $main(n)
            }

            pub fn max_value() -> $main {
                $main(u64::MAX)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }

            pub fn as_usize(&self) -> usize {
                self.0 as usize
            }

            pub fn safe_add(&self, other: u64) -> Result<$main, ArithError> {
                self.0.safe_add(other).map($main)
            }

            pub fn safe_sub(&self, other: u64) -> Result<$main, ArithError> {
                self.0.safe_sub(other).map($main)
            }

            pub fn safe_mul(&self, other: u64) -> Result<$main, ArithError> {
                self.0.safe_mul(other).map($main)
            }
        }

        impl From<u64> for $main {
            fn from(n: u64) -> $main {
                $main(n)
            }
        }

        impl From<$main> for u64 {
            fn from(value: $main) -> u64 {
                value.0
            }
        }

        impl PartialOrd<u64> for $main {
            fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
                Some(self.0.cmp(other))
            }
        }

        impl PartialEq<u64> for $main {
            fn eq(&self, other: &u64) -> bool {
                self.0 == *other
            }
        }

        impl Add<u64> for $main {
            type Output = $main;

            fn add(self, other: u64) -> $main {
                $main(self.0.saturating_add(other))
            }
        }

        impl Add<$main> for $main {
            type Output = $main;

            fn add(self, other: $main) -> $main {
                $main(self.0.saturating_add(other.0))
            }
        }

        impl AddAssign<u64> for $main {
            fn add_assign(&mut self, other: u64) {
                self.0 = self.0.saturating_add(other);
            }
        }

        impl Sub<u64> for $main {
            type Output = $main;

            fn sub(self, other: u64) -> $main {
                $main(self.0.saturating_sub(other))
            }
        }

        impl Sub<$main> for $main {
            type Output = $main;

            fn sub(self, other: $main) -> $main {
                $main(self.0.saturating_sub(other.0))
            }
        }

        impl SubAssign<u64> for $main {
            fn sub_assign(&mut self, other: u64) {
                self.0 = self.0.saturating_sub(other);
            }
        }

        impl Rem<u64> for $main {
            type Output = $main;

            fn rem(self, modulus: u64) -> $main {
                $main(self.0.checked_rem(modulus).unwrap_or(0))
            }
        }

        impl fmt::Display for $main {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $main {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($main), self.0)
            }
        }
    };
}

impl_common!(Slot);
impl_common!(Epoch);

impl Slot {
    pub fn epoch(self, slots_per_epoch: u64) -> Epoch {
        Epoch(self.0.checked_div(slots_per_epoch).unwrap_or(0))
    }
}

impl Epoch {
    pub fn start_slot(self, slots_per_epoch: u64) -> Slot {
        Slot(self.0.saturating_mul(slots_per_epoch))
    }

    pub fn end_slot(self, slots_per_epoch: u64) -> Slot {
        Slot(
            self.0
                .saturating_add(1)
                .saturating_mul(slots_per_epoch)
                .saturating_sub(1),
        )
    }

    /// Position of some slot inside an epoch, if any.
    ///
    /// E.g., the first `slot` in `epoch` is at position `0`.
    pub fn position(self, slot: Slot, slots_per_epoch: u64) -> Option<usize> {
        let start = self.start_slot(slots_per_epoch);
        let end = self.end_slot(slots_per_epoch);

        if slot >= start && slot <= end {
            Some(slot.as_usize().saturating_sub(start.as_usize()))
        } else {
            None
        }
    }

    /// Iterates over every slot in this epoch, in ascending order.
    pub fn slot_iter(&self, slots_per_epoch: u64) -> SlotIter {
        SlotIter {
            current_iteration: 0,
            epoch: *self,
            slots_per_epoch,
        }
    }
}

pub struct SlotIter {
    current_iteration: u64,
    epoch: Epoch,
    slots_per_epoch: u64,
}

impl Iterator for SlotIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.current_iteration >= self.slots_per_epoch {
            None
        } else {
            let start_slot = self.epoch.start_slot(self.slots_per_epoch);
            let previous = self.current_iteration;
            self.current_iteration = self.current_iteration.checked_add(1)?;
            start_slot.safe_add(previous).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_to_epoch() {
        assert_eq!(Slot::new(0).epoch(32), Epoch::new(0));
        assert_eq!(Slot::new(31).epoch(32), Epoch::new(0));
        assert_eq!(Slot::new(32).epoch(32), Epoch::new(1));
        assert_eq!(Slot::new(5).epoch(8), Epoch::new(0));
    }

    #[test]
    fn start_and_end_slots() {
        assert_eq!(Epoch::new(0).start_slot(32), Slot::new(0));
        assert_eq!(Epoch::new(0).end_slot(32), Slot::new(31));
        assert_eq!(Epoch::new(3).start_slot(8), Slot::new(24));
        assert_eq!(Epoch::new(3).end_slot(8), Slot::new(31));
    }

    #[test]
    fn position() {
        let epoch = Epoch::new(2);
        assert_eq!(epoch.position(Slot::new(15), 8), None);
        assert_eq!(epoch.position(Slot::new(16), 8), Some(0));
        assert_eq!(epoch.position(Slot::new(23), 8), Some(7));
        assert_eq!(epoch.position(Slot::new(24), 8), None);
    }

    #[test]
    fn slot_iter() {
        let slots = Epoch::new(1).slot_iter(4).collect::<Vec<_>>();
        assert_eq!(
            slots,
            vec![Slot::new(4), Slot::new(5), Slot::new(6), Slot::new(7)]
        );
    }

    #[test]
    fn math_saturates() {
        assert_eq!(Epoch::new(0) - 1, Epoch::new(0));
        assert_eq!(Slot::max_value() + 1, Slot::max_value());
        assert_eq!(Slot::new(7) % 0, Slot::new(0));
        assert!(Epoch::max_value().safe_add(1).is_err());
    }

    #[test]
    fn serde_quotes_values() {
        let json = serde_json::to_string(&Slot::new(42)).unwrap();
        assert_eq!(json, "\"42\"");
        assert_eq!(serde_json::from_str::<Epoch>("\"7\"").unwrap(), Epoch::new(7));
    }
}
