//! Incremental terminator matching for AT command replies.

use crate::error::Error;

/// Maximum number of patterns a single wait can match against.
pub const MAX_PATTERNS: usize = 5;

/// Ordered set of up to [`MAX_PATTERNS`] terminator patterns.
///
/// Slot numbers are 1-based and follow argument order. When several patterns
/// complete on the same byte, the lowest slot wins. Empty slots are allowed as
/// long as at least one slot holds a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patterns<'a> {
    slots: [Option<&'a [u8]>; MAX_PATTERNS],
}

impl<'a> Patterns<'a> {
    /// A set with a single pattern in slot 1.
    ///
    /// Unlike [`from_slots`](Self::from_slots), an empty pattern is not
    /// rejected here; it simply never matches.
    pub const fn new(first: &'a [u8]) -> Self {
        let mut slots = [None; MAX_PATTERNS];
        slots[0] = Some(first);
        Self { slots }
    }

    /// A set with patterns in slots 1 and 2, conventionally the success and
    /// error result codes.
    pub const fn pair(first: &'a [u8], second: &'a [u8]) -> Self {
        let mut slots = [None; MAX_PATTERNS];
        slots[0] = Some(first);
        slots[1] = Some(second);
        Self { slots }
    }

    /// Build a set from explicit, possibly empty, slots.
    pub fn from_slots(slots: &[Option<&'a [u8]>]) -> Result<Self, Error> {
        if slots.len() > MAX_PATTERNS {
            return Err(Error::InvalidPattern);
        }
        if slots.iter().any(|s| matches!(s, Some(p) if p.is_empty())) {
            return Err(Error::InvalidPattern);
        }
        if slots.iter().all(Option::is_none) {
            return Err(Error::InvalidPattern);
        }

        let mut set = Self {
            slots: [None; MAX_PATTERNS],
        };
        set.slots[..slots.len()].copy_from_slice(slots);
        Ok(set)
    }

    /// Build a set from a list of patterns, filling slots from 1 upwards.
    pub fn from_list(patterns: &[&'a [u8]]) -> Result<Self, Error> {
        if patterns.len() > MAX_PATTERNS {
            return Err(Error::InvalidPattern);
        }
        let mut slots = [None; MAX_PATTERNS];
        for (slot, p) in slots.iter_mut().zip(patterns) {
            *slot = Some(*p);
        }
        Self::from_slots(&slots)
    }

    /// Pattern in the 1-based `slot`.
    pub fn get(&self, slot: u8) -> Option<&'a [u8]> {
        let idx = usize::from(slot).checked_sub(1)?;
        self.slots.get(idx).copied().flatten()
    }

    pub(crate) fn slots(&self) -> &[Option<&'a [u8]>; MAX_PATTERNS] {
        &self.slots
    }
}

/// Outcome of waiting for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Match {
    /// No pattern completed before the deadline
    Timeout,
    /// 1-based slot of the pattern that completed
    Pattern(u8),
}

impl Match {
    /// Numeric form: `0` for a timeout, otherwise the matched slot.
    pub const fn index(self) -> u8 {
        match self {
            Self::Timeout => 0,
            Self::Pattern(slot) => slot,
        }
    }

    pub const fn is(self, slot: u8) -> bool {
        matches!(self, Self::Pattern(s) if s == slot)
    }
}

/// A completed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Completed {
    pub slot: u8,
    pub len: usize,
}

/// Per-pattern progress over a byte stream.
///
/// Each pattern keeps its own cursor of contiguously matched leading bytes.
/// On a mismatch the cursor restarts, and the offending byte is only tested
/// again against the first byte of that same pattern. There is no failure
/// function, so overlapping prefixes such as `"aab"` in `"aaab"` are not
/// recovered.
pub(crate) struct PatternMatcher<'p, 'a> {
    patterns: &'p Patterns<'a>,
    cursors: [usize; MAX_PATTERNS],
}

impl<'p, 'a> PatternMatcher<'p, 'a> {
    pub fn new(patterns: &'p Patterns<'a>) -> Self {
        Self {
            patterns,
            cursors: [0; MAX_PATTERNS],
        }
    }

    /// Advance every cursor by one byte, returning the first pattern that
    /// completes.
    pub fn feed(&mut self, byte: u8) -> Option<Completed> {
        let mut completed = None;

        for (i, (slot, cursor)) in self
            .patterns
            .slots()
            .iter()
            .zip(self.cursors.iter_mut())
            .enumerate()
        {
            // Empty patterns never match
            let Some(pattern) = slot.filter(|p| !p.is_empty()) else {
                continue;
            };

            if pattern[*cursor] == byte {
                *cursor += 1;
            } else if pattern[0] == byte {
                *cursor = 1;
            } else {
                *cursor = 0;
            }

            if *cursor == pattern.len() {
                *cursor = 0;
                completed = Some(Completed {
                    slot: i as u8 + 1,
                    len: pattern.len(),
                });
                break;
            }
        }

        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(patterns: &Patterns<'_>, input: &[u8]) -> Option<(usize, Completed)> {
        let mut m = PatternMatcher::new(patterns);
        input
            .iter()
            .enumerate()
            .find_map(|(pos, b)| m.feed(*b).map(|c| (pos, c)))
    }

    #[test]
    fn exact_pattern_per_slot() {
        let p = Patterns::from_list(&[
            b"OK\r\n".as_slice(),
            b"ERROR\r\n",
            b"> ",
            b"+CME",
            b"RING",
        ])
        .unwrap();
        for slot in 1..=5u8 {
            let input = p.get(slot).unwrap();
            let (_, c) = run(&p, input).unwrap();
            assert_eq!(c.slot, slot);
            assert_eq!(c.len, input.len());
        }
    }

    #[test]
    fn shorter_prefix_in_earlier_slot_wins() {
        let p = Patterns::from_list(&[b"OK\r\n".as_slice(), b"OK\r\nMORE"]).unwrap();
        let (pos, c) = run(&p, b"OK\r\nMORE").unwrap();
        assert_eq!(c.slot, 1);
        assert_eq!(pos, 3);
    }

    #[test]
    fn shorter_prefix_in_later_slot_still_completes_first() {
        let p = Patterns::from_list(&[b"OK\r\nMORE".as_slice(), b"OK\r\n"]).unwrap();
        let (_, c) = run(&p, b"OK\r\nMORE").unwrap();
        assert_eq!(c.slot, 2);
    }

    #[test]
    fn same_byte_completion_prefers_lower_slot() {
        let p = Patterns::from_list(&[b"K".as_slice(), b"OK"]).unwrap();
        let (_, c) = run(&p, b"OK").unwrap();
        assert_eq!(c.slot, 1);
    }

    #[test]
    fn restart_on_mismatch() {
        let p = Patterns::new(b"\r\nOK\r\n");
        assert!(run(&p, b"\r\n\r\nOK\r\n").is_some());
        assert!(run(&p, b"OOK\r\n").is_none());

        let p = Patterns::new(b"OK");
        assert!(run(&p, b"OOK").is_some());
    }

    #[test]
    fn no_overlap_recovery() {
        let p = Patterns::new(b"aab");
        assert!(run(&p, b"aaab").is_none());
        assert!(run(&p, b"xaab").is_some());
    }

    #[test]
    fn empty_slots_are_skipped() {
        let p = Patterns::from_slots(&[None, Some(b"ERROR".as_slice())]).unwrap();
        let (_, c) = run(&p, b"xxERROR").unwrap();
        assert_eq!(c.slot, 2);
    }

    #[test]
    fn empty_pattern_from_const_constructors_never_matches() {
        let p = Patterns::new(b"");
        assert!(run(&p, b"OK\r\n").is_none());

        let p = Patterns::pair(b"OK\r\n", b"");
        let (pos, c) = run(&p, b"OK\r\n").unwrap();
        assert_eq!((pos, c.slot), (3, 1));

        let p = Patterns::pair(b"", b"ERROR");
        let (_, c) = run(&p, b"xERROR").unwrap();
        assert_eq!(c.slot, 2);
    }

    #[test]
    fn invalid_sets() {
        assert_eq!(Patterns::from_slots(&[]), Err(Error::InvalidPattern));
        assert_eq!(Patterns::from_slots(&[None, None]), Err(Error::InvalidPattern));
        assert_eq!(
            Patterns::from_list(&[b"OK".as_slice(), b""]),
            Err(Error::InvalidPattern)
        );
        assert_eq!(
            Patterns::from_list(&[b"1".as_slice(), b"2", b"3", b"4", b"5", b"6"]),
            Err(Error::InvalidPattern)
        );
    }

    #[test]
    fn match_index() {
        assert_eq!(Match::Timeout.index(), 0);
        assert_eq!(Match::Pattern(3).index(), 3);
        assert!(Match::Pattern(1).is(1));
        assert!(!Match::Timeout.is(1));
    }
}
