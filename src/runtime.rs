//////////////////////////////////////////////////////////////
/// Runtime
///
/// ForthRuntime owns every piece of mutable state a running interpreter
/// needs: the two stacks, the data space and its character buffer, the
/// dictionary, the builtin table, the compiler scratch space, BASE, the
/// PNO engine, the diagnostic channel, and wherever output goes. It is
/// generic over OutputSink rather than boxing a `dyn` writer, since the
/// set of sinks is small and known at compile time (a real process writes
/// to stdout; a test harness captures into a string).
///
use crate::cell::Cell;
use crate::internals::builtin::BuiltInFn;
use crate::internals::compiler::Compiler;
use crate::internals::dictionary::Dictionary;
use crate::internals::pno::Pno;
use crate::internals::space::{CharBuffer, DataSpace, DEFAULT_CELLS, DEFAULT_CHAR_BYTES};
use crate::internals::stacks::{Stack, DEFAULT_CAPACITY};
use crate::messages::Msg;

pub trait OutputSink {
    fn write_char(&mut self, c: char);
    fn write_str(&mut self, s: &str);
    fn flush(&mut self);
}

pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_char(&mut self, c: char) {
        print!("{}", c);
    }

    fn write_str(&mut self, s: &str) {
        print!("{}", s);
    }

    fn flush(&mut self) {
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }
}

/// Captures everything written to it, for tests that need to assert on
/// what a program printed rather than just its stack effect.
#[derive(Default)]
pub struct StringSink {
    buf: String,
}

impl StringSink {
    pub fn new() -> StringSink {
        StringSink::default()
    }

    /// Drains and returns everything written since the last call.
    pub fn taken(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

impl OutputSink for StringSink {
    fn write_char(&mut self, c: char) {
        self.buf.push(c);
    }

    fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn flush(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Interpret,
    Compile,
}

pub struct ForthRuntime<O: OutputSink> {
    pub space: DataSpace,
    pub chars: CharBuffer,
    pub data_stack: Stack,
    pub return_stack: Stack,
    pub dict: Dictionary,
    pub builtins: Vec<BuiltInFn<O>>,
    pub compiler: Compiler,
    pub state: State,
    pub base: i64,
    pub pno: Pno,
    pub msg: Msg,
    pub output: O,
    pub exit_flag: bool,
}

impl<O: OutputSink> ForthRuntime<O> {
    pub fn new(output: O) -> ForthRuntime<O> {
        let mut rt = ForthRuntime {
            space: DataSpace::new(DEFAULT_CELLS),
            chars: CharBuffer::new(DEFAULT_CHAR_BYTES),
            data_stack: Stack::new(DEFAULT_CAPACITY),
            return_stack: Stack::new(DEFAULT_CAPACITY),
            dict: Dictionary::new(),
            builtins: Vec::new(),
            compiler: Compiler::new(),
            state: State::Interpret,
            base: 10,
            pno: Pno::new(),
            msg: Msg::new(),
            output,
            exit_flag: false,
        };
        rt.cold_start();
        rt
    }

    fn builtin(&mut self, name: &str, code: fn(&mut ForthRuntime<O>) -> Result<(), crate::messages::ForthError>, doc: &str) {
        let bid = self.builtins.len();
        self.builtins.push(BuiltInFn::new(name, code, doc));
        self.dict.define_primitive(name, bid, false);
    }

    /// Registers every primitive word. Order doesn't matter for correctness
    /// - lookup goes through the name table, never a bare index - but
    /// grouping mirrors the table in internals::general / internals::console.
    fn cold_start(&mut self) {
        // stack
        self.builtin("DUP", Self::f_dup, "( n -- n n )");
        self.builtin("?DUP", Self::f_q_dup, "( n -- 0 | n n )");
        self.builtin("DROP", Self::f_drop, "( n -- )");
        self.builtin("SWAP", Self::f_swap, "( a b -- b a )");
        self.builtin("OVER", Self::f_over, "( a b -- a b a )");
        self.builtin("ROT", Self::f_rot, "( a b c -- b c a )");
        self.builtin("2DUP", Self::f_2dup, "( a b -- a b a b )");
        self.builtin("2DROP", Self::f_2drop, "( a b -- )");
        self.builtin("2SWAP", Self::f_2swap, "( a b c d -- c d a b )");
        self.builtin("2OVER", Self::f_2over, "( a b c d -- a b c d a b )");
        self.builtin("PICK", Self::f_pick, "( ... n -- ... x )");
        self.builtin("DEPTH", Self::f_depth, "( -- n )");

        // return stack
        self.builtin(">R", Self::f_to_r, "( n -- ) ( R: -- n )");
        self.builtin("R>", Self::f_r_from, "( -- n ) ( R: n -- )");
        self.builtin("R@", Self::f_r_get, "( -- n ) ( R: n -- n )");
        self.builtin("2>R", Self::f_2_to_r, "( a b -- ) ( R: -- a b )");
        self.builtin("2R>", Self::f_2r_from, "( -- a b ) ( R: a b -- )");
        self.builtin("2R@", Self::f_2r_get, "( -- a b ) ( R: a b -- a b )");

        // arithmetic
        self.builtin("+", Self::f_plus, "( a b -- a+b )");
        self.builtin("-", Self::f_minus, "( a b -- a-b )");
        self.builtin("*", Self::f_times, "( a b -- a*b )");
        self.builtin("/", Self::f_divide, "( a b -- a/b )");
        self.builtin("MOD", Self::f_mod, "( a b -- a%b )");
        self.builtin("ABS", Self::f_abs, "( n -- |n| )");
        self.builtin("NEGATE", Self::f_negate, "( n -- -n )");
        self.builtin("1+", Self::f_1plus, "( n -- n+1 )");
        self.builtin("1-", Self::f_1minus, "( n -- n-1 )");
        self.builtin("M*", Self::f_m_star, "( n1 n2 -- d-lo d-hi )");
        self.builtin("S>D", Self::f_s_to_d, "( n -- n sign )");
        self.builtin("MAX", Self::f_max, "( a b -- max )");
        self.builtin("MIN", Self::f_min, "( a b -- min )");

        // compare
        self.builtin("=", Self::f_equal, "( a b -- flag )");
        self.builtin("<", Self::f_less, "( a b -- flag )");
        self.builtin(">", Self::f_greater, "( a b -- flag )");
        self.builtin("F>", Self::f_f_greater, "( r1 r2 -- flag )");
        self.builtin("0=", Self::f_0equal, "( n -- flag )");
        self.builtin("0<", Self::f_0less, "( n -- flag )");
        self.builtin("0>", Self::f_0greater, "( n -- flag )");
        self.builtin("0<>", Self::f_0not_equal, "( n -- flag )");

        // bitwise
        self.builtin("LSHIFT", Self::f_lshift, "( n u -- n<<u )");
        self.builtin("RSHIFT", Self::f_rshift, "( n u -- n>>u )");

        // memory
        self.builtin("!", Self::f_store, "( n addr -- )");
        self.builtin("@", Self::f_fetch, "( addr -- n )");
        self.builtin("+!", Self::f_plus_store, "( n addr -- )");
        self.builtin("2!", Self::f_2_store, "( x1 x2 addr -- )");
        self.builtin("2@", Self::f_2_fetch, "( addr -- x1 x2 )");
        self.builtin("C!", Self::f_c_store, "( c addr -- )");
        self.builtin("C@", Self::f_c_fetch, "( addr -- c )");
        self.builtin("CELL", Self::f_cell, "( -- n )");
        self.builtin("CELL+", Self::f_cell_plus, "( a -- a+cell )");
        self.builtin("CELLS", Self::f_cells, "( n -- n*cell )");
        self.builtin("CHAR+", Self::f_char_plus, "( a -- a+1 )");
        self.builtin("CHARS", Self::f_chars, "( n -- n )");
        self.builtin("ALIGN", Self::f_align, "( -- )");
        self.builtin("ALIGNED", Self::f_aligned, "( addr -- a-addr )");

        // data space
        self.builtin("HERE", Self::f_here, "( -- addr )");
        self.builtin(",", Self::f_comma, "( n -- )");
        self.builtin("C,", Self::f_c_comma, "( c -- )");
        self.builtin("ALLOT", Self::f_allot, "( n -- )");

        // dictionary
        self.builtin("EXECUTE", Self::f_execute, "( xt -- )");
        self.builtin(">BODY", Self::f_to_body, "( xt -- a-addr )");

        // base
        self.builtin("BASE@", Self::f_base_get, "( -- n )");
        self.builtin("BASE!", Self::f_base_store, "( n -- )");
        self.builtin("DECIMAL", Self::f_decimal, "( -- )");
        self.builtin("HEX", Self::f_hex, "( -- )");
        self.builtin("OCTAL", Self::f_octal, "( -- )");
        self.builtin("BINARY", Self::f_binary, "( -- )");

        // floats
        self.builtin("F+", Self::f_f_plus, "( r1 r2 -- r3 )");
        self.builtin("F-", Self::f_f_minus, "( r1 r2 -- r3 )");
        self.builtin("F*", Self::f_f_times, "( r1 r2 -- r3 )");
        self.builtin("F/", Self::f_f_divide, "( r1 r2 -- r3 )");
        self.builtin("FSWAP", Self::f_fswap, "( r1 r2 -- r2 r1 )");
        self.builtin("FDUP", Self::f_fdup, "( r -- r r )");
        self.builtin("F@", Self::f_f_fetch, "( addr -- r )");
        self.builtin("F!", Self::f_f_store, "( r addr -- )");
        self.builtin("S>F", Self::f_s_to_f, "( n -- r )");

        // I/O
        self.builtin("BL", Self::f_bl, "( -- 32 )");
        self.builtin("EMIT", Self::f_emit, "( c -- )");
        self.builtin("CR", Self::f_cr, "( -- )");
        self.builtin("SPACE", Self::f_space, "( -- )");
        self.builtin(".", Self::f_dot, "( n -- )");
        self.builtin("TYPE", Self::f_type, "( addr u | str -- )");

        // pictured numeric output
        self.builtin("<#", Self::f_pno_begin, "( -- )");
        self.builtin("#", Self::f_pno_digit, "( n -- n' )");
        self.builtin("#S", Self::f_pno_digits, "( n -- 0 )");
        self.builtin("HOLD", Self::f_pno_hold, "( c -- )");
        self.builtin("#>", Self::f_pno_finish, "( n -- str )");

        // misc
        self.builtin("BYE", Self::f_bye, "( -- )");
    }
}

impl ForthRuntime<StdoutSink> {
    pub fn with_stdout() -> ForthRuntime<StdoutSink> {
        ForthRuntime::new(StdoutSink)
    }
}

#[cfg(test)]
pub mod tests_support {
    use super::*;

    pub fn test_runtime() -> ForthRuntime<StringSink> {
        ForthRuntime::new(StringSink::new())
    }
}
