//////////////////////////////////////////////////////////////
/// Builtins
///
/// A builtin is a name, a Rust function pointer, and a one-line doc string
/// (consulted by SEE). The dual representation - a BuiltinId stored in the
/// dictionary, the function pointer stored in a side table here - exists
/// because a dictionary Word can't hold a bare function pointer generic
/// over the runtime's output sink without infecting every Word with that
/// type parameter; indexing through a small integer keeps WordKind plain
/// data.
///
use crate::messages::ForthError;
use crate::runtime::{ForthRuntime, OutputSink};

pub type BuiltinId = usize;

pub struct BuiltInFn<O: OutputSink> {
    pub name: String,
    pub code: fn(&mut ForthRuntime<O>) -> Result<(), ForthError>,
    pub doc: String,
}

impl<O: OutputSink> BuiltInFn<O> {
    pub fn new(
        name: &str,
        code: fn(&mut ForthRuntime<O>) -> Result<(), ForthError>,
        doc: &str,
    ) -> BuiltInFn<O> {
        BuiltInFn {
            name: name.to_string(),
            code,
            doc: doc.to_string(),
        }
    }
}
