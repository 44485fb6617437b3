// Line-at-a-time source driver, external to the core. Reads from a file
// if one was named on the command line, otherwise from stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use tforth::messages::Msg;

enum Source {
    Stdin,
    File(BufReader<File>),
}

pub struct LineSource {
    source: Source,
    msg: Msg,
}

impl LineSource {
    pub fn open(path: Option<&str>, msg: Msg) -> LineSource {
        match path {
            Some(path) => match File::open(path) {
                Ok(file) => LineSource {
                    source: Source::File(BufReader::new(file)),
                    msg,
                },
                Err(e) => {
                    msg.error("LineSource::open", "unable to open file", Some(e));
                    LineSource {
                        source: Source::Stdin,
                        msg: Msg::new(),
                    }
                }
            },
            None => LineSource {
                source: Source::Stdin,
                msg,
            },
        }
    }

    /// Returns the next line, or None at end of input.
    pub fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let result = match &mut self.source {
            Source::Stdin => io::stdin().lock().read_line(&mut line),
            Source::File(reader) => reader.read_line(&mut line),
        };
        match result {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                self.msg.error("LineSource::next_line", "read_line error", Some(e));
                None
            }
        }
    }
}
