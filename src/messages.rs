// Error kinds and the Rust-internal diagnostic channel.
//
// ForthError is the Forth-language-facing error protocol: a fatal kind
// aborts the current line, clears both stacks, and resets
// compile state. Msg/DebugLevel is a separate, quieter channel the
// implementation uses for its own warnings (redefinitions, CLI trouble) -
// it never speaks for the Forth program itself.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForthError {
    StackUnderflow,
    StackOverflow,
    BoundsViolation,
    KindMismatch,
    DivideByZero,
    UnknownWord,
    MalformedDefinition,
    PnoMisuse,
    Overflow,
}

impl ForthError {
    /// Whether this kind is fatal to the current line (all kinds except
    /// UnknownWord, which is reported and the line continues).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ForthError::UnknownWord)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ForthError::StackUnderflow => "StackUnderflow",
            ForthError::StackOverflow => "StackOverflow",
            ForthError::BoundsViolation => "BoundsViolation",
            ForthError::KindMismatch => "KindMismatch",
            ForthError::DivideByZero => "DivideByZero",
            ForthError::UnknownWord => "UnknownWord",
            ForthError::MalformedDefinition => "MalformedDefinition",
            ForthError::PnoMisuse => "PNOMisuse",
            ForthError::Overflow => "Overflow",
        }
    }
}

impl fmt::Display for ForthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

/// Msg is the implementation's own diagnostic reporter, gated by a level.
/// Warnings below the configured level are dropped.
pub struct Msg {
    level: DebugLevel,
}

impl Msg {
    pub fn new() -> Msg {
        Msg {
            level: DebugLevel::Warning,
        }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    pub fn get_level(&self) -> DebugLevel {
        self.level
    }

    pub fn error<T: fmt::Debug>(&self, caller: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Error, caller, text, detail);
    }

    pub fn warning<T: fmt::Debug>(&self, caller: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Warning, caller, text, detail);
    }

    pub fn info<T: fmt::Debug>(&self, caller: &str, text: &str, detail: Option<T>) {
        self.emit(DebugLevel::Info, caller, text, detail);
    }

    fn emit<T: fmt::Debug>(&self, level: DebugLevel, caller: &str, text: &str, detail: Option<T>) {
        if level_rank(level) > level_rank(self.level) {
            return;
        }
        match detail {
            Some(d) => eprintln!("{caller}: {text}: {d:?}"),
            None => eprintln!("{caller}: {text}"),
        }
    }
}

impl Default for Msg {
    fn default() -> Self {
        Msg::new()
    }
}

fn level_rank(level: DebugLevel) -> u8 {
    match level {
        DebugLevel::Error => 0,
        DebugLevel::Warning => 1,
        DebugLevel::Info => 2,
        DebugLevel::Debug => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_word_is_not_fatal() {
        assert!(!ForthError::UnknownWord.is_fatal());
    }

    #[test]
    fn everything_else_is_fatal() {
        assert!(ForthError::StackUnderflow.is_fatal());
        assert!(ForthError::DivideByZero.is_fatal());
        assert!(ForthError::MalformedDefinition.is_fatal());
    }

    #[test]
    fn kind_names_are_stable_strings() {
        assert_eq!(ForthError::PnoMisuse.kind_name(), "PNOMisuse");
        assert_eq!(ForthError::BoundsViolation.kind_name(), "BoundsViolation");
    }
}
