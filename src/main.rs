// Thin CLI driver. The core lives entirely in the library crate; this
// binary only wires a file-or-stdin source driver to it - deliberately
// kept outside the core.

mod config;
mod files;

use config::Config;
use files::LineSource;
use tforth::runtime::ForthRuntime;

fn main() {
    let config = Config::from_env();
    let mut rt = ForthRuntime::with_stdout();
    rt.msg.set_level(config.debug_level);

    let mut source = LineSource::open(config.file.as_deref(), tforth::messages::Msg::new());
    while let Some(line) = source.next_line() {
        rt.interpret_line(&line);
        if rt.exit_flag {
            break;
        }
    }
    rt.output.flush();
}
