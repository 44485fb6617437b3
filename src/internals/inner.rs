//////////////////////////////////////////////////////////////
/// Inner interpreter
///
/// execute_thread walks a CodeThread's (code, lits) pair with a single
/// instruction pointer: fetch code[ip], advance ip, dispatch. A Colon
/// word recurses into execute_thread again - the current ip and thread
/// live in this Rust stack frame's locals, so the host call stack stands
/// in for an explicit return stack of (thread, ip) frames; the
/// Forth-level return stack is then free to hold only what
/// DO/LOOP/I/J/>R/R>/R@ actually put there.
///
use std::rc::Rc;

use crate::cell::Cell;
use crate::internals::dictionary::WordKind;
use crate::internals::thread::{CodeThread, Op};
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink};

impl<O: OutputSink> ForthRuntime<O> {
    /// EXECUTE ( xt -- ) dispatches on a Word's kind.
    pub fn call_word(&mut self, wid: crate::internals::dictionary::WordId) -> Result<(), ForthError> {
        let kind = self.dict.get(wid).kind.clone();
        match kind {
            WordKind::Primitive(bid) => {
                let f = self.builtins[bid].code;
                f(self)
            }
            WordKind::Colon(thread) => self.execute_thread(&thread),
            WordKind::Variable(addr) => self.data_stack.push(Cell::Int(addr as i64)),
            WordKind::Constant(value) => self.data_stack.push(value),
        }
    }

    pub fn execute_thread(&mut self, thread: &Rc<CodeThread>) -> Result<(), ForthError> {
        let mut ip: usize = 0;
        while ip < thread.code.len() {
            let op = thread.code[ip].clone();
            ip += 1;
            match op {
                Op::Call(wid) => self.call_word(wid)?,
                Op::Lit => {
                    let v = thread.lits[ip - 1].clone();
                    self.data_stack.push(v)?;
                }
                Op::Branch => {
                    ip = thread.lits[ip - 1].as_index()?;
                }
                Op::Branch0 => {
                    let flag = self.data_stack.pop()?;
                    if !flag.is_truthy()? {
                        ip = thread.lits[ip - 1].as_index()?;
                    }
                }
                Op::Do => {
                    let start = self.data_stack.pop()?.as_int()?;
                    let limit = self.data_stack.pop()?.as_int()?;
                    self.return_stack.push(Cell::Int(limit))?;
                    self.return_stack.push(Cell::Int(start))?;
                }
                Op::Loop => {
                    let counter = self.return_stack.pop()?.as_int()?;
                    let limit = self.return_stack.pop()?.as_int()?;
                    if counter + 1 < limit {
                        self.return_stack.push(Cell::Int(limit))?;
                        self.return_stack.push(Cell::Int(counter + 1))?;
                        ip = thread.lits[ip - 1].as_index()?;
                    }
                }
                Op::Leave => {
                    self.return_stack.pop()?; // counter
                    self.return_stack.pop()?; // limit
                    ip = thread.lits[ip - 1].as_index()?;
                }
                Op::I => {
                    let v = self.return_stack.peek(0)?;
                    self.data_stack.push(v)?;
                }
                Op::J => {
                    let v = self.return_stack.peek(2)?;
                    self.data_stack.push(v)?;
                }
                Op::Exit => return Ok(()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::thread::{CodeThread, Op};
    use crate::runtime::tests_support::test_runtime;

    #[test]
    fn lit_dup_times_squares_the_top() {
        let mut rt = test_runtime();
        let mut t = CodeThread::new();
        let dup = rt.dict.find("DUP").unwrap();
        let times = rt.dict.find("*").unwrap();
        t.push(Op::Call(dup));
        t.push(Op::Call(times));
        t.push(Op::Exit);
        rt.data_stack.push(Cell::Int(3)).unwrap();
        rt.execute_thread(&Rc::new(t)).unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 9);
    }

    #[test]
    fn branch0_skips_over_a_literal_when_flag_false() {
        let mut rt = test_runtime();
        let mut t = CodeThread::new();
        let b0 = t.push_with(Op::Branch0, Cell::Int(-1));
        t.push_with(Op::Lit, Cell::Int(999)); // skipped
        let target = t.len() as i64;
        t.patch(b0, target);
        t.push(Op::Exit);
        rt.data_stack.push(Cell::Int(0)).unwrap(); // false
        rt.execute_thread(&Rc::new(t)).unwrap();
        assert_eq!(rt.data_stack.depth(), 0);
    }

    #[test]
    fn do_loop_accumulates_indices() {
        let mut rt = test_runtime();
        let mut t = CodeThread::new();
        let do_idx = t.len();
        t.push(Op::Do);
        let i_pos = t.len();
        t.push(Op::I);
        let plus = rt.dict.find("+").unwrap();
        t.push(Op::Call(plus));
        let loop_idx = t.push_with(Op::Loop, Cell::Int(do_idx as i64 + 1));
        let _ = i_pos;
        let _ = loop_idx;
        t.push(Op::Exit);
        rt.data_stack.push(Cell::Int(0)).unwrap(); // accumulator
        rt.data_stack.push(Cell::Int(5)).unwrap(); // limit
        rt.data_stack.push(Cell::Int(0)).unwrap(); // start
        rt.execute_thread(&Rc::new(t)).unwrap();
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 10); // 0+1+2+3+4
    }
}
