//////////////////////////////////////////////////////////////
/// Compiler & control-flow algorithm
///
/// While compiling, the outer interpreter appends into a scratch
/// CodeThread and maintains a control-compile stack of pending
/// forward-branch sites, covering IF/ELSE/THEN, BEGIN/WHILE/REPEAT/
/// UNTIL/AGAIN, and DO/LOOP/LEAVE. These are handled as dedicated tokens
/// by the outer interpreter rather than through ordinary dictionary
/// dispatch - they are compile-time actions, not runtime words, and there
/// is no DOES>-style machinery here that would let a truly generic
/// "immediate word" rebind the compiler's buffers from Forth itself.
///
use std::rc::Rc;

use crate::cell::Cell;
use crate::internals::dictionary::WordId;
use crate::internals::thread::{CodeThread, Op};
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink, State};

#[derive(Debug)]
pub enum ControlEntry {
    If(usize),
    Else(usize),
    Begin(usize),
    While(usize),
    Do(usize),
}

/// Scratch state for the definition currently under compilation.
#[derive(Default)]
pub struct Compiler {
    pub name: Option<String>,
    pub wid: Option<WordId>,
    pub thread: CodeThread,
    pub control: Vec<ControlEntry>,
    pub leave_patches: Vec<Vec<usize>>,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    pub fn is_compiling(&self) -> bool {
        self.wid.is_some()
    }

    pub fn here(&self) -> usize {
        self.thread.len()
    }

    pub fn emit_word(&mut self, wid: WordId) {
        self.thread.push(Op::Call(wid));
    }

    pub fn emit_lit(&mut self, value: Cell) {
        self.thread.push_with(Op::Lit, value);
    }

    pub fn emit_branch(&mut self, op: Op, target: i64) -> usize {
        self.thread.push_with(op, Cell::Int(target))
    }

    pub fn patch(&mut self, index: usize, target: i64) {
        self.thread.patch(index, target);
    }
}

impl<O: OutputSink> ForthRuntime<O> {
    /// : <name> starts a colon definition. The new word is installed right
    /// away, hidden, so RECURSE can refer to it by WordId while an
    /// ordinary lookup of its own name still fails (self-reference via
    /// FIND is only supposed to work once ; has run).
    pub fn begin_colon(&mut self, name: &str) {
        let wid = self.dict.define_colon(name, CodeThread::new(), false);
        self.dict.get_mut(wid).hidden = true;
        self.compiler = Compiler::new();
        self.compiler.name = Some(name.to_string());
        self.compiler.wid = Some(wid);
        self.state = State::Compile;
    }

    /// ; ends a colon definition.
    pub fn end_colon(&mut self) -> Result<(), ForthError> {
        if !self.compiler.control.is_empty() {
            return Err(ForthError::MalformedDefinition);
        }
        self.compiler.emit_word_exit();
        let wid = self.compiler.wid.ok_or(ForthError::MalformedDefinition)?;
        let thread = std::mem::take(&mut self.compiler.thread);
        self.dict.get_mut(wid).kind = crate::internals::dictionary::WordKind::Colon(Rc::new(thread));
        self.dict.get_mut(wid).hidden = false;
        self.compiler = Compiler::new();
        self.state = State::Interpret;
        Ok(())
    }

    pub fn cw_recurse(&mut self) -> Result<(), ForthError> {
        let wid = self.compiler.wid.ok_or(ForthError::MalformedDefinition)?;
        self.compiler.emit_word(wid);
        Ok(())
    }

    pub fn cw_if(&mut self) {
        let idx = self.compiler.emit_branch(Op::Branch0, -1);
        self.compiler.control.push(ControlEntry::If(idx));
    }

    pub fn cw_else(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::If(idx)) => {
                let new_idx = self.compiler.emit_branch(Op::Branch, -1);
                let here = self.compiler.here() as i64;
                self.compiler.patch(idx, here);
                self.compiler.control.push(ControlEntry::Else(new_idx));
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_then(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::If(idx)) | Some(ControlEntry::Else(idx)) => {
                let here = self.compiler.here() as i64;
                self.compiler.patch(idx, here);
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_begin(&mut self) {
        let here = self.compiler.here();
        self.compiler.control.push(ControlEntry::Begin(here));
    }

    pub fn cw_until(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::Begin(target)) => {
                self.compiler.emit_branch(Op::Branch0, target as i64);
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_again(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::Begin(target)) => {
                self.compiler.emit_branch(Op::Branch, target as i64);
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_while(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::Begin(target)) => {
                let idx = self.compiler.emit_branch(Op::Branch0, -1);
                self.compiler.control.push(ControlEntry::Begin(target));
                self.compiler.control.push(ControlEntry::While(idx));
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_repeat(&mut self) -> Result<(), ForthError> {
        let while_idx = match self.compiler.control.pop() {
            Some(ControlEntry::While(idx)) => idx,
            _ => return Err(ForthError::MalformedDefinition),
        };
        let begin_target = match self.compiler.control.pop() {
            Some(ControlEntry::Begin(target)) => target,
            _ => return Err(ForthError::MalformedDefinition),
        };
        self.compiler.emit_branch(Op::Branch, begin_target as i64);
        let here = self.compiler.here() as i64;
        self.compiler.patch(while_idx, here);
        Ok(())
    }

    pub fn cw_do(&mut self) {
        self.compiler.thread.push(Op::Do);
        let target = self.compiler.here();
        self.compiler.control.push(ControlEntry::Do(target));
        self.compiler.leave_patches.push(Vec::new());
    }

    pub fn cw_loop(&mut self) -> Result<(), ForthError> {
        match self.compiler.control.pop() {
            Some(ControlEntry::Do(target)) => {
                self.compiler.emit_branch(Op::Loop, target as i64);
                let here = self.compiler.here() as i64;
                if let Some(patches) = self.compiler.leave_patches.pop() {
                    for idx in patches {
                        self.compiler.patch(idx, here);
                    }
                }
                Ok(())
            }
            _ => Err(ForthError::MalformedDefinition),
        }
    }

    pub fn cw_leave(&mut self) -> Result<(), ForthError> {
        let idx = self.compiler.emit_branch(Op::Leave, -1);
        match self.compiler.leave_patches.last_mut() {
            Some(patches) => {
                patches.push(idx);
                Ok(())
            }
            None => Err(ForthError::MalformedDefinition),
        }
    }
}

impl Compiler {
    fn emit_word_exit(&mut self) {
        self.thread.push(Op::Exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests_support::test_runtime;

    #[test]
    fn if_then_patches_branch0_to_here() {
        let mut rt = test_runtime();
        rt.begin_colon("t");
        rt.cw_if();
        rt.cw_then().unwrap();
        assert!(rt.compiler.control.is_empty());
    }

    #[test]
    fn else_without_if_is_malformed() {
        let mut rt = test_runtime();
        rt.begin_colon("t");
        assert_eq!(rt.cw_else().unwrap_err(), ForthError::MalformedDefinition);
    }

    #[test]
    fn semicolon_with_open_control_stack_errors() {
        let mut rt = test_runtime();
        rt.begin_colon("t");
        rt.cw_if();
        assert_eq!(rt.end_colon().unwrap_err(), ForthError::MalformedDefinition);
    }

    #[test]
    fn do_loop_records_and_clears_leave_patches() {
        let mut rt = test_runtime();
        rt.begin_colon("t");
        rt.cw_do();
        rt.cw_leave().unwrap();
        rt.cw_loop().unwrap();
        assert!(rt.compiler.leave_patches.is_empty());
    }
}
