//////////////////////////////////////////////////////////////
/// Pictured numeric output
///
/// <# resets a small digit buffer and marks it active; # peels one digit
/// off the value (in the current BASE) and inserts it at the *front* of
/// the buffer, since digits are produced least-significant first but read
/// left-to-right; #S repeats # until the value reaches zero (always at
/// least once); HOLD inserts an arbitrary character at the front; #>
/// drops the (by then exhausted) value and hands back everything
/// collected.
///
/// #> returns a single Cell::Str rather than an (addr, length) pair - the
/// same convention `."` uses when compiled, so TYPE only has to understand
/// one extra shape beyond S"'s pair.
///
use std::rc::Rc;

use crate::messages::ForthError;

pub struct Pno {
    active: bool,
    buf: Vec<u8>,
}

impl Pno {
    pub fn new() -> Pno {
        Pno {
            active: false,
            buf: Vec::new(),
        }
    }

    pub fn begin(&mut self) {
        self.buf.clear();
        self.active = true;
    }

    fn require_active(&self) -> Result<(), ForthError> {
        if self.active {
            Ok(())
        } else {
            Err(ForthError::PnoMisuse)
        }
    }

    /// # ( n -- n' ) peel one digit of n (in base) onto the front of the
    /// buffer, returning the quotient.
    pub fn digit(&mut self, n: i64, base: i64) -> Result<i64, ForthError> {
        self.require_active()?;
        if base < 2 {
            return Err(ForthError::PnoMisuse);
        }
        let magnitude = n.unsigned_abs();
        let digit = (magnitude % base as u64) as u32;
        let quotient = (magnitude / base as u64) as i64;
        self.buf.insert(0, render_digit(digit));
        Ok(quotient)
    }

    /// #S ( n -- 0 ) repeats `#` until the value is zero, at least once.
    pub fn digits(&mut self, mut n: i64, base: i64) -> Result<i64, ForthError> {
        loop {
            n = self.digit(n, base)?;
            if n == 0 {
                break;
            }
        }
        Ok(n)
    }

    pub fn hold(&mut self, c: u8) -> Result<(), ForthError> {
        self.require_active()?;
        self.buf.insert(0, c);
        Ok(())
    }

    /// #> finishes the conversion, handing back the accumulated string.
    pub fn finish(&mut self) -> Result<Rc<str>, ForthError> {
        self.require_active()?;
        self.active = false;
        let s = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Rc::from(s))
    }
}

impl Default for Pno {
    fn default() -> Self {
        Pno::new()
    }
}

fn render_digit(d: u32) -> u8 {
    if d < 10 {
        b'0' + d as u8
    } else {
        b'A' + (d - 10) as u8
    }
}
