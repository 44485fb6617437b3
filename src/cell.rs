//////////////////////////////////////////////////////////////
/// Cell values
///
/// Cell is the single-slot tagged value that lives on the data stack, the
/// return stack, and in a CodeThread's `lits` array. Every primitive that
/// touches a Cell matches on its kind; mixing kinds in arithmetic is a
/// KindMismatch, not a silent coercion.
///
use std::rc::Rc;

use crate::internals::dictionary::WordId;
use crate::messages::ForthError;

/// TRUE and FALSE follow Forth convention: -1 and 0.
pub const TRUE: i64 = -1;
pub const FALSE: i64 = 0;

#[derive(Debug, Clone)]
pub enum Cell {
    Int(i64),
    Float(f64),
    /// Offset into the character-buffer region. Kept distinct from Int so
    /// an address into that region can't be added to an ordinary number by
    /// accident.
    Ptr(usize),
    /// An immutable string, as produced by `."` and `#>`.
    Str(Rc<str>),
    /// Execution token: a handle to a dictionary word, suitable for EXECUTE.
    Xt(WordId),
}

impl Cell {
    pub fn is_truthy(&self) -> Result<bool, ForthError> {
        match self {
            Cell::Int(n) => Ok(*n != FALSE),
            _ => Err(ForthError::KindMismatch),
        }
    }

    pub fn as_int(&self) -> Result<i64, ForthError> {
        match self {
            Cell::Int(n) => Ok(*n),
            _ => Err(ForthError::KindMismatch),
        }
    }

    pub fn as_index(&self) -> Result<usize, ForthError> {
        let n = self.as_int()?;
        if n < 0 {
            Err(ForthError::BoundsViolation)
        } else {
            Ok(n as usize)
        }
    }

    pub fn as_float(&self) -> Result<f64, ForthError> {
        match self {
            Cell::Float(f) => Ok(*f),
            _ => Err(ForthError::KindMismatch),
        }
    }

    pub fn as_ptr(&self) -> Result<usize, ForthError> {
        match self {
            Cell::Ptr(p) => Ok(*p),
            _ => Err(ForthError::KindMismatch),
        }
    }

    pub fn as_xt(&self) -> Result<WordId, ForthError> {
        match self {
            Cell::Xt(id) => Ok(*id),
            _ => Err(ForthError::KindMismatch),
        }
    }

    pub fn flag(b: bool) -> Cell {
        Cell::Int(if b { TRUE } else { FALSE })
    }
}

/// j k -- j+k, etc. Both operands must agree on Int vs Float.
pub fn int_binop(a: &Cell, b: &Cell, f: impl Fn(i64, i64) -> i64) -> Result<Cell, ForthError> {
    Ok(Cell::Int(f(a.as_int()?, b.as_int()?)))
}

pub fn float_binop(a: &Cell, b: &Cell, f: impl Fn(f64, f64) -> f64) -> Result<Cell, ForthError> {
    Ok(Cell::Float(f(a.as_float()?, b.as_float()?)))
}

/// + - * dispatch on the matching numeric kind of both operands; mixed
/// kinds (or non-numeric kinds) are a KindMismatch.
pub fn numeric_binop(
    a: &Cell,
    b: &Cell,
    int_f: impl Fn(i64, i64) -> i64,
    float_f: impl Fn(f64, f64) -> f64,
) -> Result<Cell, ForthError> {
    match (a, b) {
        (Cell::Int(_), Cell::Int(_)) => int_binop(a, b, int_f),
        (Cell::Float(_), Cell::Float(_)) => float_binop(a, b, float_f),
        _ => Err(ForthError::KindMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_roundtrip() {
        assert!(Cell::flag(true).is_truthy().unwrap());
        assert!(!Cell::flag(false).is_truthy().unwrap());
    }

    #[test]
    fn kind_mismatch_on_bad_as() {
        assert!(Cell::Float(1.0).as_int().is_err());
        assert!(Cell::Int(1).as_float().is_err());
        assert!(Cell::Int(1).as_ptr().is_err());
    }

    #[test]
    fn numeric_binop_rejects_mixed_kinds() {
        let a = Cell::Int(3);
        let b = Cell::Float(2.0);
        assert!(numeric_binop(&a, &b, |x, y| x + y, |x, y| x + y).is_err());
    }

    #[test]
    fn numeric_binop_adds_ints() {
        let a = Cell::Int(3);
        let b = Cell::Int(4);
        let r = numeric_binop(&a, &b, |x, y| x + y, |x, y| x + y).unwrap();
        assert_eq!(r.as_int().unwrap(), 7);
    }
}
