//////////////////////////////////////////////////////////////
/// Console I/O and pictured numeric output primitives
///
/// Everything here writes through ForthRuntime::output rather than
/// directly to stdout, so a test harness can swap in a sink that
/// captures text instead of printing it.
///
use std::rc::Rc;

use crate::cell::Cell;
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink};

type R = Result<(), ForthError>;

/// Renders n in the given base, least-significant digit last, with a
/// leading '-' for negative values. Used by `.` - independent of the
/// PNO engine's <# # #S HOLD #> state machine, which is reserved for
/// programs that drive it explicitly.
fn render_int(n: i64, base: i64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let negative = n < 0;
    let mut magnitude = n.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let d = (magnitude % base as u64) as u32;
        digits.push(if d < 10 { b'0' + d as u8 } else { b'A' + (d - 10) as u8 });
        magnitude /= base as u64;
    }
    if negative {
        digits.push(b'-');
    }
    digits.reverse();
    String::from_utf8(digits).expect("ASCII digits are valid UTF-8")
}

impl<O: OutputSink> ForthRuntime<O> {
    pub fn f_bl(&mut self) -> R {
        self.data_stack.push(Cell::Int(b' ' as i64))
    }

    pub fn f_emit(&mut self) -> R {
        let c = self.data_stack.pop()?.as_int()?;
        let ch = char::from_u32(c as u32).unwrap_or('?');
        self.output.write_char(ch);
        Ok(())
    }

    pub fn f_cr(&mut self) -> R {
        self.output.write_char('\n');
        Ok(())
    }

    pub fn f_space(&mut self) -> R {
        self.output.write_char(' ');
        Ok(())
    }

    pub fn f_dot(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        self.output.write_str(&render_int(n, self.base));
        self.output.write_char(' ');
        Ok(())
    }

    /// TYPE accepts either an (addr len) pair from the character buffer or
    /// a Cell::Str, matching whichever convention produced the value.
    pub fn f_type(&mut self) -> R {
        let top = self.data_stack.pop()?;
        match top {
            Cell::Str(s) => {
                self.output.write_str(&s);
                Ok(())
            }
            Cell::Int(len) => {
                let addr = self.data_stack.pop()?.as_ptr()?;
                if len < 0 {
                    return Err(ForthError::BoundsViolation);
                }
                let bytes = self.chars.slice(addr, len as usize)?;
                self.output.write_str(&String::from_utf8_lossy(bytes));
                Ok(())
            }
            _ => Err(ForthError::KindMismatch),
        }
    }

    // ---- pictured numeric output ----

    pub fn f_pno_begin(&mut self) -> R {
        self.pno.begin();
        Ok(())
    }

    pub fn f_pno_digit(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        let rest = self.pno.digit(n, self.base)?;
        self.data_stack.push(Cell::Int(rest))
    }

    pub fn f_pno_digits(&mut self) -> R {
        let n = self.data_stack.pop()?.as_int()?;
        let rest = self.pno.digits(n, self.base)?;
        self.data_stack.push(Cell::Int(rest))
    }

    pub fn f_pno_hold(&mut self) -> R {
        let c = self.data_stack.pop()?.as_int()?;
        self.pno.hold(c as u8)
    }

    pub fn f_pno_finish(&mut self) -> R {
        let s: Rc<str> = self.pno.finish()?;
        self.data_stack.push(Cell::Str(s))
    }
}
