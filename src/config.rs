// Command-line configuration: a source file path and an optional debug
// level. The CLI is an external collaborator, not part of the core -
// nothing else is required here.

use argh::FromArgs;

use tforth::messages::DebugLevel;

/// a small Forth interpreter
#[derive(FromArgs)]
pub struct Args {
    /// source file to interpret; omit to read from stdin
    #[argh(positional)]
    pub file: Option<String>,

    /// one of error, warning, info, debug (default: error)
    #[argh(option)]
    pub debuglevel: Option<String>,
}

pub struct Config {
    pub file: Option<String>,
    pub debug_level: DebugLevel,
}

impl Config {
    pub fn from_env() -> Config {
        let args: Args = argh::from_env();
        let debug_level = match args.debuglevel.as_deref() {
            Some("debug") => DebugLevel::Debug,
            Some("info") => DebugLevel::Info,
            Some("warning") => DebugLevel::Warning,
            _ => DebugLevel::Error,
        };
        Config {
            file: args.file,
            debug_level,
        }
    }
}
