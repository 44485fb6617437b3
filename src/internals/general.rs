//////////////////////////////////////////////////////////////
/// General-purpose primitives
///
/// Stack shuffling, return-stack access, arithmetic, compare, bitwise,
/// memory, data-space, and misc base/float words - the bulk of the
/// primitive set. Each is registered once in runtime::cold_start; the
/// function bodies here are what BuiltInFn's code pointer refers to.
///
use crate::cell::{numeric_binop, Cell, FALSE, TRUE};
use crate::internals::space::CELL_WIDTH;
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink};

type R = Result<(), ForthError>;

impl<O: OutputSink> ForthRuntime<O> {
    // ---- stack ----

    pub fn f_dup(&mut self) -> R {
        let top = self.data_stack.top()?;
        self.data_stack.push(top)
    }

    /// ?DUP ( n -- 0 | n n ) duplicates only a nonzero top.
    pub fn f_q_dup(&mut self) -> R {
        let top = self.data_stack.top()?;
        if !matches!(top, Cell::Int(0)) {
            self.data_stack.push(top)?;
        }
        Ok(())
    }

    pub fn f_drop(&mut self) -> R {
        self.data_stack.pop()?;
        Ok(())
    }

    pub fn f_swap(&mut self) -> R {
        let a = self.data_stack.pop()?;
        let b = self.data_stack.pop()?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    pub fn f_over(&mut self) -> R {
        let b = self.data_stack.peek(1)?;
        self.data_stack.push(b)
    }

    pub fn f_rot(&mut self) -> R {
        let c = self.data_stack.pop()?;
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.data_stack.push(b)?;
        self.data_stack.push(c)?;
        self.data_stack.push(a)
    }

    pub fn f_2dup(&mut self) -> R {
        let b = self.data_stack.peek(0)?;
        let a = self.data_stack.peek(1)?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    pub fn f_2drop(&mut self) -> R {
        self.data_stack.pop()?;
        self.data_stack.pop()?;
        Ok(())
    }

    pub fn f_2swap(&mut self) -> R {
        let d = self.data_stack.pop()?;
        let c = self.data_stack.pop()?;
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.data_stack.push(c)?;
        self.data_stack.push(d)?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    pub fn f_2over(&mut self) -> R {
        let b = self.data_stack.peek(2)?;
        let a = self.data_stack.peek(3)?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    pub fn f_pick(&mut self) -> R {
        let n = self.data_stack.pop()?.as_index()?;
        let v = self.data_stack.peek(n)?;
        self.data_stack.push(v)
    }

    pub fn f_depth(&mut self) -> R {
        let d = self.data_stack.depth() as i64;
        self.data_stack.push(Cell::Int(d))
    }

    // ---- return stack ----

    pub fn f_to_r(&mut self) -> R {
        let v = self.data_stack.pop()?;
        self.return_stack.push(v)
    }

    pub fn f_r_from(&mut self) -> R {
        let v = self.return_stack.pop()?;
        self.data_stack.push(v)
    }

    pub fn f_r_get(&mut self) -> R {
        let v = self.return_stack.top()?;
        self.data_stack.push(v)
    }

    pub fn f_2_to_r(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.return_stack.push(a)?;
        self.return_stack.push(b)
    }

    pub fn f_2r_from(&mut self) -> R {
        let b = self.return_stack.pop()?;
        let a = self.return_stack.pop()?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    pub fn f_2r_get(&mut self) -> R {
        let b = self.return_stack.peek(0)?;
        let a = self.return_stack.peek(1)?;
        self.data_stack.push(a)?;
        self.data_stack.push(b)
    }

    // ---- arithmetic ----

    pub fn f_plus(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        let r = numeric_binop(&a, &b, |x, y| x + y, |x, y| x + y)?;
        self.data_stack.push(r)
    }

    pub fn f_minus(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        let r = numeric_binop(&a, &b, |x, y| x - y, |x, y| x - y)?;
        self.data_stack.push(r)
    }

    pub fn f_times(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        let r = numeric_binop(&a, &b, |x, y| x * y, |x, y| x * y)?;
        self.data_stack.push(r)
    }

    pub fn f_abs(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(n.abs()))
    }

    pub fn f_negate(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(-n))
    }

    pub fn f_mod(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        if b == 0 {
            return Err(ForthError::DivideByZero);
        }
        self.data_stack.push(Cell::Int(a % b))
    }

    pub fn f_divide(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        if b == 0 {
            return Err(ForthError::DivideByZero);
        }
        self.data_stack.push(Cell::Int(a / b))
    }

    pub fn f_1plus(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(n + 1))
    }

    pub fn f_1minus(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(n - 1))
    }

    /// M* ( n1 n2 -- d-lo d-hi ) signed 128-bit product, low cell first.
    pub fn f_m_star(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        let product = a as i128 * b as i128;
        let lo = product as i64;
        let hi = (product >> 64) as i64;
        self.data_stack.push(Cell::Int(lo))?;
        self.data_stack.push(Cell::Int(hi))
    }

    /// S>D ( n -- n sign ) extends a single cell to a double by pushing
    /// its sign cell (0 or -1).
    pub fn f_s_to_d(&mut self) -> R {
        let n = self.data_stack.top()?.as_int()?;
        self.data_stack.push(Cell::Int(if n < 0 { TRUE } else { FALSE }))
    }

    // ---- compare ----

    pub fn f_equal(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(a == b))
    }

    pub fn f_less(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(a < b))
    }

    pub fn f_greater(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(a > b))
    }

    pub fn f_f_greater(&mut self) -> R {
        let b = self.data_stack.pop()?.as_float()?;
        let a = self.data_stack.pop()?.as_float()?;
        self.data_stack.push(Cell::flag(a > b))
    }

    pub fn f_0equal(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(n == 0))
    }

    pub fn f_0less(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(n < 0))
    }

    pub fn f_0greater(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(n > 0))
    }

    pub fn f_0not_equal(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::flag(n != 0))
    }

    // ---- bitwise ----

    pub fn f_lshift(&mut self) -> R {
        let u = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(((a as u64) << u) as i64))
    }

    pub fn f_rshift(&mut self) -> R {
        let u = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(((a as u64) >> u) as i64))
    }

    // ---- memory ----

    pub fn f_store(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let value = self.data_stack.pop()?.as_int()?;
        self.space.cell_store(addr, value)
    }

    pub fn f_fetch(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let v = self.space.cell_fetch(addr)?;
        self.data_stack.push(Cell::Int(v))
    }

    pub fn f_plus_store(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let delta = self.data_stack.pop()?.as_int()?;
        let cur = self.space.cell_fetch(addr)?;
        self.space.cell_store(addr, cur + delta)
    }

    pub fn f_2_store(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let x2 = self.data_stack.pop()?.as_int()?;
        let x1 = self.data_stack.pop()?.as_int()?;
        self.space.cell_store(addr, x1)?;
        self.space.cell_store(addr + CELL_WIDTH, x2)
    }

    pub fn f_2_fetch(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let x1 = self.space.cell_fetch(addr)?;
        let x2 = self.space.cell_fetch(addr + CELL_WIDTH)?;
        self.data_stack.push(Cell::Int(x1))?;
        self.data_stack.push(Cell::Int(x2))
    }

    /// C! ( c s -- ) stores a single byte into the character-buffer region.
    pub fn f_c_store(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_ptr()?;
        let c = self.data_stack.pop()?.as_int()?;
        self.chars.set(addr, c as u8)
    }

    pub fn f_c_fetch(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_ptr()?;
        let c = self.chars.get(addr)?;
        self.data_stack.push(Cell::Int(c as i64))
    }

    pub fn f_cell(&mut self) -> R {
        self.data_stack.push(Cell::Int(CELL_WIDTH as i64))
    }

    pub fn f_cell_plus(&mut self) -> R {
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(a + CELL_WIDTH as i64))
    }

    pub fn f_cells(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(n * CELL_WIDTH as i64))
    }

    pub fn f_char_plus(&mut self) -> R {
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(a + 1))
    }

    pub fn f_chars(&mut self) -> R {
        // CHARS is a no-op multiplier since char size is one byte.
        Ok(())
    }

    pub fn f_align(&mut self) -> R {
        self.space.align();
        Ok(())
    }

    pub fn f_aligned(&mut self) -> R {
        let a = self.data_stack.pop()?.as_index()?;
        self.data_stack.push(Cell::Int(crate::internals::space::DataSpace::aligned(a) as i64))
    }

    // ---- data space ----

    pub fn f_here(&mut self) -> R {
        self.data_stack.push(Cell::Int(self.space.here() as i64))
    }

    pub fn f_comma(&mut self) -> R {
        let v = self.data_stack.pop()?.as_int()?;
        self.space.comma(v)
    }

    pub fn f_c_comma(&mut self) -> R {
        let v = self.data_stack.pop()?.as_int()?;
        self.space.c_comma(v as u8)
    }

    pub fn f_allot(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.space.allot(n)
    }

    // ---- dictionary ----

    pub fn f_execute(&mut self) -> R {
        let xt = self.data_stack.pop()?.as_xt()?;
        self.call_word(xt)
    }

    /// >BODY ( xt -- a-addr ) the body of a CREATE/VARIABLE/CONSTANT-made
    /// word is the single literal embedded in its thread: an address for
    /// VARIABLE, the value itself for CONSTANT.
    pub fn f_to_body(&mut self) -> R {
        let xt = self.data_stack.pop()?.as_xt()?;
        match self.dict.get(xt).kind.clone() {
            crate::internals::dictionary::WordKind::Variable(a) => {
                self.data_stack.push(Cell::Int(a as i64))
            }
            crate::internals::dictionary::WordKind::Constant(v) => self.data_stack.push(v),
            _ => Err(ForthError::KindMismatch),
        }
    }

    // ---- misc ----

    pub fn f_max(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(a.max(b)))
    }

    pub fn f_min(&mut self) -> R {
        let b = self.data_stack.pop()?.as_int()?;
        let a = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Int(a.min(b)))
    }

    pub fn f_base_get(&mut self) -> R {
        self.data_stack.push(Cell::Int(self.base))
    }

    pub fn f_base_store(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        if n < 2 || n > 36 {
            return Err(ForthError::Overflow);
        }
        self.base = n;
        Ok(())
    }

    pub fn f_decimal(&mut self) -> R {
        self.base = 10;
        Ok(())
    }

    pub fn f_hex(&mut self) -> R {
        self.base = 16;
        Ok(())
    }

    pub fn f_octal(&mut self) -> R {
        self.base = 8;
        Ok(())
    }

    pub fn f_binary(&mut self) -> R {
        self.base = 2;
        Ok(())
    }

    // ---- floats ----

    pub fn f_f_plus(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.data_stack.push(crate::cell::float_binop(&a, &b, |x, y| x + y)?)
    }

    pub fn f_f_minus(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.data_stack.push(crate::cell::float_binop(&a, &b, |x, y| x - y)?)
    }

    pub fn f_f_times(&mut self) -> R {
        let b = self.data_stack.pop()?;
        let a = self.data_stack.pop()?;
        self.data_stack.push(crate::cell::float_binop(&a, &b, |x, y| x * y)?)
    }

    pub fn f_f_divide(&mut self) -> R {
        let b = self.data_stack.pop()?.as_float()?;
        let a = self.data_stack.pop()?.as_float()?;
        if b == 0.0 {
            return Err(ForthError::DivideByZero);
        }
        self.data_stack.push(Cell::Float(a / b))
    }

    pub fn f_fswap(&mut self) -> R {
        self.f_swap()
    }

    pub fn f_fdup(&mut self) -> R {
        self.f_dup()
    }

    pub fn f_f_fetch(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let v = self.space.float_fetch(addr)?;
        self.data_stack.push(Cell::Float(v))
    }

    pub fn f_f_store(&mut self) -> R {
        let addr = self.data_stack.pop()?.as_index()?;
        let v = self.data_stack.pop()?.as_float()?;
        self.space.float_store(addr, v)
    }

    pub fn f_s_to_f(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.data_stack.push(Cell::Float(n as f64))
    }

    /// BYE ( -- ) signals the driver to stop feeding lines. The core never
    /// reads this flag itself - it is ambient tooling for a CLI driver.
    pub fn f_bye(&mut self) -> R {
        self.exit_flag = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests_support::test_runtime;

    #[test]
    fn dup_drop_is_identity() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(7)).unwrap();
        rt.f_dup().unwrap();
        rt.f_drop().unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 7);
    }

    #[test]
    fn q_dup_duplicates_only_nonzero() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        rt.f_q_dup().unwrap();
        assert_eq!(rt.data_stack.depth(), 1);

        rt.data_stack.clear();
        rt.data_stack.push(Cell::Int(5)).unwrap();
        rt.f_q_dup().unwrap();
        assert_eq!(rt.data_stack.depth(), 2);
    }

    #[test]
    fn swap_swap_is_identity() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(1)).unwrap();
        rt.data_stack.push(Cell::Int(2)).unwrap();
        rt.f_swap().unwrap();
        rt.f_swap().unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 2);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn plus_then_minus_recovers_x() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(10)).unwrap();
        rt.data_stack.push(Cell::Int(7)).unwrap();
        rt.f_plus().unwrap();
        rt.data_stack.push(Cell::Int(7)).unwrap();
        rt.f_minus().unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 10);
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(1)).unwrap();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        assert_eq!(rt.f_divide().unwrap_err(), ForthError::DivideByZero);
    }

    #[test]
    fn cells_cell_plus_agree() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(1)).unwrap();
        rt.f_cells().unwrap();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        rt.f_plus().unwrap();
        let via_cells = rt.data_stack.pop().unwrap().as_int().unwrap();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        rt.f_cell_plus().unwrap();
        let via_cell_plus = rt.data_stack.pop().unwrap().as_int().unwrap();
        assert_eq!(via_cells, via_cell_plus);
    }

    #[test]
    fn two_store_two_fetch_roundtrip() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(11)).unwrap();
        rt.data_stack.push(Cell::Int(22)).unwrap();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        rt.f_2_store().unwrap();
        rt.data_stack.push(Cell::Int(0)).unwrap();
        rt.f_2_fetch().unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 22);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 11);
    }

    #[test]
    fn r_to_r_is_a_no_op() {
        let mut rt = test_runtime();
        rt.data_stack.push(Cell::Int(3)).unwrap();
        rt.f_to_r().unwrap();
        rt.f_r_from().unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 3);
    }
}
