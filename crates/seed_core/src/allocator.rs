use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{SeedError, SeedResult};

/// Placeholder owners for comments and playlists when nothing is configured.
pub const DEFAULT_OWNER_USER_IDS: KeyRange = KeyRange::new(164, 179);
pub const DEFAULT_OWNER_VIDEO_IDS: KeyRange = KeyRange::new(1, 32);

/// Half-open key range `[start, end)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: i64,
    pub end: i64,
}

impl KeyRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }
}

impl From<Range<i64>> for KeyRange {
    fn from(range: Range<i64>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Round-robin placeholder keys for owners the snapshot does not record.
///
/// The values do not reflect real ownership. The cursor is plain `&mut` state:
/// callers draw from it sequentially.
#[derive(Clone, Debug)]
pub struct CyclicAllocator {
    start: i64,
    end: i64,
    current: i64,
}

impl CyclicAllocator {
    pub fn new(range: impl Into<KeyRange>) -> SeedResult<Self> {
        let range = range.into();
        let KeyRange { start, end } = range;
        if range.is_empty() {
            return Err(SeedError::invalid(format!(
                "allocator range is empty: [{start}, {end})"
            )));
        }
        Ok(Self {
            start,
            end,
            current: start,
        })
    }

    pub fn next_value(&mut self) -> i64 {
        let value = self.current;
        self.current += 1;
        if self.current >= self.end {
            self.current = self.start;
        }
        value
    }

    /// Next value rendered as a string key.
    pub fn next_key(&mut self) -> String {
        self.next_value().to_string()
    }

    /// Draws the update key, then the insert key.
    pub fn next_drawn_key(&mut self) -> DrawnKey {
        let on_update = self.next_key();
        let on_create = self.next_key();
        DrawnKey {
            on_update,
            on_create,
        }
    }
}

/// Placeholder owner drawn for an upsert: `on_create` is stored when the row is
/// inserted, `on_update` when it already exists.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrawnKey {
    pub on_update: String,
    pub on_create: String,
}

#[cfg(test)]
mod tests {
    use super::{CyclicAllocator, DrawnKey, KeyRange};
    use crate::SeedError;

    #[test]
    fn wraps_back_to_start() {
        let mut allocator = CyclicAllocator::new(5..8).expect("allocator");
        let drawn: Vec<i64> = (0..5).map(|_| allocator.next_value()).collect();
        assert_eq!(drawn, vec![5, 6, 7, 5, 6]);
    }

    #[test]
    fn single_value_range_repeats() {
        let mut allocator = CyclicAllocator::new(KeyRange::new(3, 4)).expect("allocator");
        assert_eq!(allocator.next_key(), "3");
        assert_eq!(allocator.next_key(), "3");
    }

    #[test]
    fn rejects_empty_range() {
        let err = CyclicAllocator::new(KeyRange::new(8, 8)).unwrap_err();
        assert!(matches!(err, SeedError::Validation { .. }));
        assert!(CyclicAllocator::new(KeyRange::new(9, 2)).is_err());
    }

    #[test]
    fn drawn_key_takes_two_consecutive_values() {
        let mut allocator = CyclicAllocator::new(164..167).expect("allocator");
        assert_eq!(
            allocator.next_drawn_key(),
            DrawnKey {
                on_update: "164".into(),
                on_create: "165".into(),
            }
        );
        // The second pair wraps between its two draws.
        let wrapped = allocator.next_drawn_key();
        assert_eq!(wrapped.on_update, "166");
        assert_eq!(wrapped.on_create, "164");
    }

    #[test]
    fn fresh_allocators_replay_the_same_sequence() {
        let mut first = CyclicAllocator::new(164..179).expect("first");
        let mut second = CyclicAllocator::new(164..179).expect("second");
        for _ in 0..40 {
            assert_eq!(first.next_key(), second.next_key());
        }
    }
}
