//! Set of literals for performing unit propagation
//!
//! The set is an array indexed by variable holding a generation stamp:
//! `+generation` means the positive literal is in the set, `-generation` the
//! negative one, anything below the current generation means neither.
//! Clearing the set is a generation bump, O(1).

use crate::{
    literal::{Literal, Variable},
    memory::{HeapSpace, Offset, Vector},
};
use std::{fmt, fmt::Display};

#[derive(Debug, PartialEq, Eq)]
pub struct LiteralSet {
    /// The current generation, always positive.
    generation: i32,
    /// Stamps, indexed by variable (slot 0 unused).
    stamps: Vector<i32>,
}

impl Default for LiteralSet {
    fn default() -> LiteralSet {
        LiteralSet {
            generation: 1,
            stamps: Vector::new(),
        }
    }
}

impl LiteralSet {
    /// Create a set that can hold literals of variables up to `maxvar`
    /// without reallocation.
    pub fn with_maxvar(maxvar: Variable) -> LiteralSet {
        LiteralSet {
            generation: 1,
            stamps: Vector::fill(maxvar.array_size(), 0),
        }
    }
    /// Remove all literals from the set.
    ///
    /// When the generation counter would overflow, zero all stamps and
    /// restart at generation 1.
    pub fn clear(&mut self) {
        if self.generation == i32::max_value() {
            for stamp in self.stamps.iter_mut() {
                *stamp = 0;
            }
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }
    /// Grow the stamp array to cover `var`.
    fn reserve(&mut self, var: Variable) {
        if var.as_offset() >= self.stamps.len() {
            self.stamps.resize(var.array_size());
        }
    }
    /// The literal of `var` that is in the set, if any.
    pub fn literal(&self, var: Variable) -> Option<Literal> {
        if var.as_offset() >= self.stamps.len() {
            return None;
        }
        let stamp = self.stamps[var.as_offset()];
        if stamp == self.generation {
            Some(var.literal())
        } else if stamp == -self.generation {
            Some(-var.literal())
        } else {
            None
        }
    }
    /// Add a literal to the set.
    ///
    /// Returns false if the opposite literal is already present (the set
    /// stays unchanged in that case).
    pub fn assign(&mut self, literal: Literal) -> bool {
        let var = literal.var();
        self.reserve(var);
        match self.literal(var) {
            Some(present) if present != literal => return false,
            _ => (),
        }
        self.stamps[var.as_offset()] = if literal.is_negative() {
            -self.generation
        } else {
            self.generation
        };
        true
    }
    #[cfg(test)]
    fn generation_for_testing(&mut self, generation: i32) {
        self.generation = generation;
    }
}

impl Display for LiteralSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for offset in 1..self.stamps.len() {
            if let Some(literal) = self.literal(Variable::new(offset as u32)) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}", literal)?;
                first = false;
            }
        }
        write!(f, "]")
    }
}

impl HeapSpace for LiteralSet {
    fn heap_space(&self) -> usize {
        self.stamps.heap_space()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: i32) -> Literal {
        Literal::new(value)
    }

    #[test]
    fn assign_and_query() {
        let mut set = LiteralSet::with_maxvar(Variable::new(3));
        assert!(set.assign(lit(1)));
        assert!(set.assign(lit(-2)));
        assert_eq!(set.literal(Variable::new(1)), Some(lit(1)));
        assert_eq!(set.literal(Variable::new(2)), Some(lit(-2)));
        assert_eq!(set.literal(Variable::new(3)), None);
        // Re-adding the same literal is fine, the opposite one is not.
        assert!(set.assign(lit(1)));
        assert!(!set.assign(lit(-1)));
        assert_eq!(set.literal(Variable::new(1)), Some(lit(1)));
    }

    #[test]
    fn clear_is_a_generation_bump() {
        let mut set = LiteralSet::with_maxvar(Variable::new(2));
        assert!(set.assign(lit(1)));
        set.clear();
        assert_eq!(set.literal(Variable::new(1)), None);
        assert!(set.assign(lit(-1)));
        assert_eq!(set.literal(Variable::new(1)), Some(lit(-1)));
    }

    #[test]
    fn generation_overflow_resets_stamps() {
        let mut set = LiteralSet::with_maxvar(Variable::new(2));
        set.generation_for_testing(i32::max_value());
        assert!(set.assign(lit(2)));
        set.clear();
        assert_eq!(set.literal(Variable::new(2)), None);
        assert!(set.assign(lit(-2)));
        assert_eq!(set.literal(Variable::new(2)), Some(lit(-2)));
    }

    #[test]
    fn grows_on_demand() {
        let mut set = LiteralSet::default();
        assert!(set.assign(lit(100)));
        assert_eq!(set.literal(Variable::new(100)), Some(lit(100)));
        assert_eq!(set.literal(Variable::new(99)), None);
    }
}
