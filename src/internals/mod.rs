// Internal machinery of the Forth core: data-structure modules first,
// then the interpreter layers built on top of them.

pub mod space;
pub mod stacks;
pub mod dictionary;
pub mod thread;
pub mod builtin;
pub mod inner;
pub mod general;
pub mod console;
pub mod pno;
pub mod compiler;
pub mod outer;
pub mod debug;
