//! Type-safe wrappers for oracle variables and literals.
//!
//! Variables are 1-indexed (0 is reserved for the terminal node), and the
//! variable index doubles as the position in the diagram ordering: atoms
//! created earlier sit closer to the root.
use std::fmt;

/// A variable identifier (1-indexed).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, true)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A variable together with a polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub fn new(var: Var, positive: bool) -> Self {
        Lit { var, positive }
    }

    /// Builds a literal from a signed DIMACS-style integer.
    pub fn from_dimacs(value: i32) -> Self {
        Lit::new(Var::new(value.unsigned_abs()), value > 0)
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }

    pub fn to_dimacs(self) -> i32 {
        let id = self.var.id() as i32;
        if self.positive {
            id
        } else {
            -id
        }
    }
}

impl std::ops::Not for Lit {
    type Output = Lit;

    fn not(self) -> Self::Output {
        Lit::new(self.var, !self.positive)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.var)
        } else {
            write!(f, "~{}", self.var)
        }
    }
}
