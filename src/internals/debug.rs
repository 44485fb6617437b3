//////////////////////////////////////////////////////////////
/// SEE decompiler
///
/// Walks a colon word's CodeThread and renders it back out roughly as it
/// was written: word names for Op::Call, the literal value for Op::Lit,
/// and a branch target index for the control-flow ops, since those no
/// longer carry the IF/THEN/DO/LOOP names that produced them.
///
use crate::cell::Cell;
use crate::internals::dictionary::WordKind;
use crate::internals::thread::Op;
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink};

fn describe_lit(cell: &Cell) -> String {
    match cell {
        Cell::Int(n) => n.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Ptr(p) => format!("ptr:{}", p),
        Cell::Str(s) => format!("\" {}\"", s),
        Cell::Xt(id) => format!("xt:{}", id),
    }
}

impl<O: OutputSink> ForthRuntime<O> {
    /// SEE <name> ( -- ) prints the definition of name.
    pub fn do_see(&mut self, name: &str) -> Result<(), ForthError> {
        let wid = self.dict.find(name).ok_or(ForthError::UnknownWord)?;
        let kind = self.dict.get(wid).kind.clone();
        let word_name = self.dict.get(wid).name.clone();
        match kind {
            WordKind::Primitive(bid) => {
                let doc = self.builtins[bid].doc.clone();
                self.output.write_str(&format!("builtin: {} {}\n", word_name, doc));
            }
            WordKind::Variable(addr) => {
                self.output.write_str(&format!("variable: {} @ {}\n", word_name, addr));
            }
            WordKind::Constant(value) => {
                self.output
                    .write_str(&format!("constant: {} = {}\n", word_name, describe_lit(&value)));
            }
            WordKind::Colon(thread) => {
                let mut out = format!(": {} ", word_name);
                for (i, op) in thread.code.iter().enumerate() {
                    match op {
                        Op::Call(cw) => {
                            out.push_str(&self.dict.get(*cw).name);
                            out.push(' ');
                        }
                        Op::Lit => {
                            out.push_str(&describe_lit(&thread.lits[i]));
                            out.push(' ');
                        }
                        Op::Branch => out.push_str(&format!("branch:{} ", describe_lit(&thread.lits[i]))),
                        Op::Branch0 => out.push_str(&format!("branch0:{} ", describe_lit(&thread.lits[i]))),
                        Op::Do => out.push_str("(do) "),
                        Op::Loop => out.push_str(&format!("(loop):{} ", describe_lit(&thread.lits[i]))),
                        Op::Leave => out.push_str(&format!("(leave):{} ", describe_lit(&thread.lits[i]))),
                        Op::I => out.push_str("i "),
                        Op::J => out.push_str("j "),
                        Op::Exit => out.push_str("; "),
                    }
                }
                out.push('\n');
                self.output.write_str(&out);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::thread::CodeThread;
    use crate::runtime::tests_support::test_runtime;

    #[test]
    fn see_reports_unknown_word() {
        let mut rt = test_runtime();
        assert_eq!(rt.do_see("NOSUCHWORD").unwrap_err(), ForthError::UnknownWord);
    }

    #[test]
    fn see_decompiles_a_colon_word() {
        let mut rt = test_runtime();
        let mut t = CodeThread::new();
        let dup = rt.dict.find("DUP").unwrap();
        t.push(Op::Call(dup));
        t.push(Op::Exit);
        rt.dict.define_colon("DOUBLE-DUP", t, false);
        rt.do_see("DOUBLE-DUP").unwrap();
        let printed = rt.output.taken();
        assert!(printed.contains("DOUBLE-DUP"));
        assert!(printed.contains("DUP"));
    }

    #[test]
    fn see_reports_a_builtin() {
        let mut rt = test_runtime();
        rt.do_see("DUP").unwrap();
        assert!(rt.output.taken().contains("builtin"));
    }
}
