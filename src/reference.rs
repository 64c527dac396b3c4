use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a node of the decision diagram.
///
/// The sign carries the complement bit: `-r` denotes the negation of `r`.
/// Index `1` is the single terminal, so `Ref::ONE` is `+1` and `Ref::ZERO` is `-1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Ref(i32);

impl Ref {
    pub const ONE: Ref = Ref(1);
    pub const ZERO: Ref = Ref(-1);

    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Return the regular (non-negated) version of the reference.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the index of the referenced node in the storage.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Unsigned encoding (`2 * index + sign`), used for hashing.
    pub(crate) fn as_lit(self) -> u64 {
        ((self.0.unsigned_abs() as u64) << 1) + (self.0 < 0) as u64
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!((-r).regular(), r);
    }

    #[test]
    fn test_terminals() {
        assert_eq!(-Ref::ONE, Ref::ZERO);
        assert_eq!(Ref::ZERO.index(), 1);
        assert_eq!(Ref::ONE.to_string(), "@1");
        assert_eq!(Ref::ZERO.to_string(), "~@1");
    }

    #[test]
    fn test_as_lit_distinguishes_polarity() {
        let r = Ref::positive(3);
        assert_eq!(r.as_lit(), 6);
        assert_eq!((-r).as_lit(), 7);
    }
}
