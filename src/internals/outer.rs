//////////////////////////////////////////////////////////////
/// Outer interpreter
///
/// interpret_line is the one entry point the core exposes to a source
/// driver: strip comments, split into tokens, then for
/// each token either dispatch immediately (Interpret state) or append to
/// the definition under construction (Compile state). Lexical specials -
/// `:` `;` `VARIABLE` `CONSTANT` `CREATE` `CHAR` `[CHAR]` `S"` `."` and the
/// control-flow words - are recognized here, ahead of an ordinary
/// dictionary lookup, since none of them are dictionary words themselves.
///
/// A fatal error aborts the rest of the line: both stacks are cleared, any
/// definition in progress is discarded, and compile state resets to
/// Interpret. UnknownWord is the one non-fatal kind - it is reported and
/// the line continues with the next token.
///
use std::rc::Rc;

use crate::cell::Cell;
use crate::internals::compiler::Compiler;
use crate::internals::dictionary::{fold_case, WordId};
use crate::internals::space::CELL_WIDTH;
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink, State};

const CONTROL_WORDS: &[&str] = &[
    "IF", "ELSE", "THEN", "BEGIN", "WHILE", "REPEAT", "UNTIL", "AGAIN", "DO", "LOOP", "LEAVE",
    "RECURSE",
];

/// Strips `\` line comments and `( ... )` block comments, but only when the
/// delimiter is preceded by whitespace or starts the line - a bare `(` or
/// `\` glued to a word is just part of that word.
fn strip_comments(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut prev_space = true;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && prev_space {
            break;
        }
        if c == '(' && prev_space {
            let mut depth = 1;
            i += 1;
            while i < chars.len() && depth > 0 {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            out.push(' ');
            prev_space = true;
            continue;
        }
        out.push(c);
        prev_space = c.is_whitespace();
        i += 1;
    }
    out
}

/// `:` and `;` are split off as their own tokens even when glued to a
/// neighbor - `:FOO` becomes [":", "FOO"], `FOO;` becomes ["FOO", ";"].
fn split_colon_semicolon(raw: &str, out: &mut Vec<String>) {
    if raw.is_empty() {
        return;
    }
    if raw == ":" || raw == ";" {
        out.push(raw.to_string());
        return;
    }
    let mut rest = raw;
    if let Some(tail) = rest.strip_prefix(':') {
        out.push(":".to_string());
        rest = tail;
    }
    if rest.is_empty() {
        return;
    }
    if let Some(head) = rest.strip_suffix(';') {
        if !head.is_empty() {
            out.push(head.to_string());
        }
        out.push(";".to_string());
        return;
    }
    out.push(rest.to_string());
}

pub fn tokenize(line: &str) -> Vec<String> {
    let stripped = strip_comments(line);
    let mut out = Vec::new();
    for raw in stripped.split_whitespace() {
        split_colon_semicolon(raw, &mut out);
    }
    out
}

/// A token is an integer literal candidate if it is all decimal digits,
/// optionally signed - used to tell a too-big number (Overflow) apart from
/// a word that simply isn't a number (UnknownWord).
fn looks_like_integer(tok: &str) -> bool {
    let digits = tok.strip_prefix('-').unwrap_or(tok);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Integer literals are parsed in base 10 regardless of the current BASE.
fn try_parse_float(tok: &str) -> Option<f64> {
    if !(tok.contains('.') || tok.contains('e') || tok.contains('E')) {
        return None;
    }
    tok.parse::<f64>().ok()
}

impl<O: OutputSink> ForthRuntime<O> {
    /// Runs one line of source text, reporting errors to the output sink
    /// and never panicking on malformed input.
    pub fn interpret_line(&mut self, line: &str) {
        let tokens = tokenize(line);
        let mut idx = 0;
        while idx < tokens.len() {
            let tok = tokens[idx].clone();
            idx += 1;
            match self.process_token(&tok, &tokens, &mut idx) {
                Ok(()) => {}
                Err(ForthError::UnknownWord) => {
                    self.output.write_str(&format!("UNKNOWN: {}\n", tok));
                }
                Err(e) => {
                    self.output.write_str(&format!("ERROR: {} at {}\n", e, tok));
                    self.data_stack.clear();
                    self.return_stack.clear();
                    self.state = State::Interpret;
                    self.compiler = Compiler::new();
                    break;
                }
            }
        }
    }

    fn next_token(&self, tokens: &[String], idx: &mut usize) -> Result<String, ForthError> {
        let tok = tokens.get(*idx).cloned().ok_or(ForthError::MalformedDefinition)?;
        *idx += 1;
        Ok(tok)
    }

    /// Reports an UnknownWord through the output sink by the token that
    /// actually failed to resolve, rather than letting it propagate up to
    /// interpret_line, which would blame the dispatching token instead (the
    /// lexical special that consumed it, e.g. `'` or `SEE`).
    fn report_unknown(&mut self, name: &str) -> Result<(), ForthError> {
        self.output.write_str(&format!("UNKNOWN: {}\n", name));
        Ok(())
    }

    /// Consumes tokens until one ends in `"`, joining the content with
    /// single spaces - the scan `S"` and `."` share.
    fn collect_quoted(&self, tokens: &[String], idx: &mut usize) -> Result<String, ForthError> {
        let mut parts = Vec::new();
        loop {
            let tok = tokens.get(*idx).ok_or(ForthError::MalformedDefinition)?;
            *idx += 1;
            if let Some(head) = tok.strip_suffix('"') {
                if !head.is_empty() {
                    parts.push(head.to_string());
                }
                break;
            }
            parts.push(tok.clone());
        }
        Ok(parts.join(" "))
    }

    fn dispatch_word(&mut self, wid: WordId) -> Result<(), ForthError> {
        if self.state == State::Interpret || self.dict.get(wid).immediate {
            self.call_word(wid)
        } else {
            self.compiler.emit_word(wid);
            Ok(())
        }
    }

    fn dispatch_literal(&mut self, cell: Cell) -> Result<(), ForthError> {
        match self.state {
            State::Interpret => self.data_stack.push(cell),
            State::Compile => {
                self.compiler.emit_lit(cell);
                Ok(())
            }
        }
    }

    fn define_variable_word(&mut self, name: &str) -> Result<(), ForthError> {
        self.space.align();
        let addr = self.space.here();
        self.space.allot(CELL_WIDTH as i64)?;
        self.space.cell_store(addr, 0)?;
        self.dict.define_variable(name, addr);
        Ok(())
    }

    fn define_create_word(&mut self, name: &str) -> Result<(), ForthError> {
        self.space.align();
        let addr = self.space.here();
        self.dict.define_variable(name, addr);
        Ok(())
    }

    fn define_constant_word(&mut self, name: &str) -> Result<(), ForthError> {
        let value = self.data_stack.pop()?;
        self.dict.define_constant(name, value);
        Ok(())
    }

    fn char_literal(&mut self, tokens: &[String], idx: &mut usize) -> Result<(), ForthError> {
        let name = self.next_token(tokens, idx)?;
        let code = name.bytes().next().ok_or(ForthError::MalformedDefinition)? as i64;
        self.dispatch_literal(Cell::Int(code))
    }

    /// ' <name> ( -- xt ) looks up the next token and pushes its execution
    /// token, the only way a program gets hold of one to hand to EXECUTE
    /// or >BODY.
    fn tick(&mut self, tokens: &[String], idx: &mut usize) -> Result<(), ForthError> {
        let name = self.next_token(tokens, idx)?;
        match self.dict.find(&name) {
            Some(wid) => self.dispatch_literal(Cell::Xt(wid)),
            None => self.report_unknown(&name),
        }
    }

    fn s_quote(&mut self, tokens: &[String], idx: &mut usize) -> Result<(), ForthError> {
        let text = self.collect_quoted(tokens, idx)?;
        let addr = self.chars.alloc(text.as_bytes())?;
        let len = text.len() as i64;
        match self.state {
            State::Interpret => {
                self.data_stack.push(Cell::Ptr(addr))?;
                self.data_stack.push(Cell::Int(len))
            }
            State::Compile => {
                self.compiler.emit_lit(Cell::Ptr(addr));
                self.compiler.emit_lit(Cell::Int(len));
                Ok(())
            }
        }
    }

    fn dot_quote(&mut self, tokens: &[String], idx: &mut usize) -> Result<(), ForthError> {
        let text = self.collect_quoted(tokens, idx)?;
        match self.state {
            State::Interpret => {
                self.output.write_str(&text);
                Ok(())
            }
            State::Compile => {
                let type_wid = self.dict.find("TYPE").expect("TYPE is always registered");
                self.compiler.emit_lit(Cell::Str(Rc::from(text)));
                self.compiler.emit_word(type_wid);
                Ok(())
            }
        }
    }

    fn control_word(&mut self, word: &str) -> Result<(), ForthError> {
        if self.state != State::Compile {
            return Err(ForthError::MalformedDefinition);
        }
        match word {
            "IF" => {
                self.cw_if();
                Ok(())
            }
            "ELSE" => self.cw_else(),
            "THEN" => self.cw_then(),
            "BEGIN" => {
                self.cw_begin();
                Ok(())
            }
            "WHILE" => self.cw_while(),
            "REPEAT" => self.cw_repeat(),
            "UNTIL" => self.cw_until(),
            "AGAIN" => self.cw_again(),
            "DO" => {
                self.cw_do();
                Ok(())
            }
            "LOOP" => self.cw_loop(),
            "LEAVE" => self.cw_leave(),
            "RECURSE" => self.cw_recurse(),
            _ => unreachable!("control_word only called with CONTROL_WORDS members"),
        }
    }

    fn process_token(&mut self, tok: &str, tokens: &[String], idx: &mut usize) -> Result<(), ForthError> {
        let upper = fold_case(tok);
        match upper.as_str() {
            ":" => {
                let name = self.next_token(tokens, idx)?;
                self.begin_colon(&name);
                Ok(())
            }
            ";" => self.end_colon(),
            "VARIABLE" | "FVARIABLE" => {
                let name = self.next_token(tokens, idx)?;
                self.define_variable_word(&name)
            }
            "CREATE" => {
                let name = self.next_token(tokens, idx)?;
                self.define_create_word(&name)
            }
            "CONSTANT" | "FCONSTANT" => {
                let name = self.next_token(tokens, idx)?;
                self.define_constant_word(&name)
            }
            "CHAR" | "[CHAR]" => self.char_literal(tokens, idx),
            "'" => self.tick(tokens, idx),
            "SEE" => {
                let name = self.next_token(tokens, idx)?;
                match self.do_see(&name) {
                    Err(ForthError::UnknownWord) => self.report_unknown(&name),
                    other => other,
                }
            }
            "S\"" => self.s_quote(tokens, idx),
            ".\"" => self.dot_quote(tokens, idx),
            _ if CONTROL_WORDS.contains(&upper.as_str()) => self.control_word(&upper),
            _ => {
                if let Some(wid) = self.dict.find(tok) {
                    return self.dispatch_word(wid);
                }
                if let Some(f) = try_parse_float(tok) {
                    return self.dispatch_literal(Cell::Float(f));
                }
                if looks_like_integer(tok) {
                    return match tok.parse::<i64>() {
                        Ok(n) => self.dispatch_literal(Cell::Int(n)),
                        Err(_) => Err(ForthError::Overflow),
                    };
                }
                Err(ForthError::UnknownWord)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests_support::test_runtime;

    #[test]
    fn tokenize_strips_backslash_comment() {
        let toks = tokenize("1 2 + \\ this is ignored");
        assert_eq!(toks, vec!["1", "2", "+"]);
    }

    #[test]
    fn tokenize_strips_paren_comment_with_nesting() {
        let toks = tokenize("DUP ( outer ( inner ) still outer ) DROP");
        assert_eq!(toks, vec!["DUP", "DROP"]);
    }

    #[test]
    fn tokenize_splits_colon_and_semicolon_when_glued() {
        let toks = tokenize(":FOO DUP; ");
        assert_eq!(toks, vec![":", "FOO", "DUP", ";"]);
    }

    #[test]
    fn square_colon_definition() {
        let mut rt = test_runtime();
        rt.interpret_line(": SQUARE DUP * ;");
        rt.interpret_line("3 SQUARE");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 9);
    }

    #[test]
    fn variable_store_fetch() {
        let mut rt = test_runtime();
        rt.interpret_line("VARIABLE X 123 X ! X @");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 123);
    }

    #[test]
    fn pno_scenarios_match_bases() {
        let mut rt = test_runtime();
        rt.interpret_line("DECIMAL 12345 <# #S #> TYPE");
        assert_eq!(rt.output.taken(), "12345");
        rt.interpret_line("HEX 255 <# #S #> TYPE");
        assert_eq!(rt.output.taken(), "FF");
        rt.interpret_line("BINARY 5 <# #S #> TYPE");
        assert_eq!(rt.output.taken(), "101");
    }

    #[test]
    fn if_else_then_branches_on_guard() {
        let mut rt = test_runtime();
        rt.interpret_line(": Z? 0= IF 1 ELSE 2 THEN ;");
        rt.interpret_line("0 Z? 7 Z?");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 2);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn do_loop_sums_indices() {
        let mut rt = test_runtime();
        rt.interpret_line(": SUM 0 5 0 DO I + LOOP ;");
        rt.interpret_line("SUM");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 10);
    }

    #[test]
    fn leave_stops_the_loop_early() {
        let mut rt = test_runtime();
        rt.interpret_line(": EARLY 10 0 DO I DUP 5 = IF LEAVE THEN LOOP ;");
        rt.interpret_line("EARLY");
        let mut seen = Vec::new();
        while rt.data_stack.depth() > 0 {
            seen.push(rt.data_stack.pop().unwrap().as_int().unwrap());
        }
        seen.reverse();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn begin_while_repeat_counts_to_five() {
        let mut rt = test_runtime();
        rt.interpret_line(": TEST 0 BEGIN DUP 5 < WHILE 1+ REPEAT ;");
        rt.interpret_line("TEST");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 5);
    }

    #[test]
    fn pick_reaches_past_the_top_three() {
        let mut rt = test_runtime();
        rt.interpret_line("10 20 30 1 PICK");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 20);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 30);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 20);
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 10);
    }

    #[test]
    fn unknown_word_is_reported_and_line_continues() {
        let mut rt = test_runtime();
        rt.interpret_line("1 BOGUSWORD 2");
        assert!(rt.output.taken().contains("UNKNOWN: BOGUSWORD"));
        assert_eq!(rt.data_stack.depth(), 2);
    }

    #[test]
    fn stack_underflow_aborts_the_line_and_clears_stacks() {
        let mut rt = test_runtime();
        rt.interpret_line("1 DROP DROP DUP");
        assert!(rt.output.taken().contains("ERROR: StackUnderflow at DROP"));
        assert_eq!(rt.data_stack.depth(), 0);
    }

    #[test]
    fn control_word_outside_definition_is_malformed() {
        let mut rt = test_runtime();
        rt.interpret_line("IF");
        assert!(rt.output.taken().contains("ERROR: MalformedDefinition at IF"));
    }

    #[test]
    fn s_quote_pushes_addr_and_length() {
        let mut rt = test_runtime();
        rt.interpret_line("S\" hello world\" TYPE");
        assert_eq!(rt.output.taken(), "hello world");
    }

    #[test]
    fn dot_quote_prints_immediately() {
        let mut rt = test_runtime();
        rt.interpret_line(".\" hi there\"");
        assert_eq!(rt.output.taken(), "hi there");
    }

    #[test]
    fn dot_quote_compiles_into_a_colon_word() {
        let mut rt = test_runtime();
        rt.interpret_line(": GREET .\" hi there\" ;");
        rt.interpret_line("GREET");
        assert_eq!(rt.output.taken(), "hi there");
    }

    #[test]
    fn float_literal_pushes_a_float_cell() {
        let mut rt = test_runtime();
        rt.interpret_line("3.5 2.5 F+");
        assert_eq!(rt.data_stack.pop().unwrap().as_float().unwrap(), 6.0);
    }

    #[test]
    fn constant_embeds_its_value() {
        let mut rt = test_runtime();
        rt.interpret_line("42 CONSTANT ANSWER");
        rt.interpret_line("ANSWER");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 42);
    }

    #[test]
    fn recurse_calls_the_word_being_defined() {
        let mut rt = test_runtime();
        rt.interpret_line(": COUNTDOWN DUP 0> IF DUP . 1- RECURSE ELSE DROP THEN ;");
        rt.interpret_line("3 COUNTDOWN");
        assert_eq!(rt.output.taken(), "3 2 1 ");
    }

    #[test]
    fn overflow_on_integer_literal_out_of_range() {
        let mut rt = test_runtime();
        rt.interpret_line("99999999999999999999999999");
        assert!(rt.output.taken().contains("ERROR: Overflow"));
    }

    #[test]
    fn tick_execute_runs_the_looked_up_word() {
        let mut rt = test_runtime();
        rt.interpret_line("3 4 ' + EXECUTE");
        assert_eq!(rt.data_stack.pop().unwrap().as_int().unwrap(), 7);
    }

    #[test]
    fn tick_unknown_word_is_reported() {
        let mut rt = test_runtime();
        rt.interpret_line("' BOGUS");
        assert!(rt.output.taken().contains("UNKNOWN: BOGUS"));
    }

    #[test]
    fn see_prints_a_colon_definition_from_the_outer_interpreter() {
        let mut rt = test_runtime();
        rt.interpret_line(": SQUARE DUP * ;");
        rt.interpret_line("SEE SQUARE");
        let printed = rt.output.taken();
        assert!(printed.contains("SQUARE"));
        assert!(printed.contains("DUP"));
    }

    #[test]
    fn see_unknown_word_is_reported_by_its_own_name() {
        let mut rt = test_runtime();
        rt.interpret_line("SEE BOGUS");
        assert!(rt.output.taken().contains("UNKNOWN: BOGUS"));
    }
}
