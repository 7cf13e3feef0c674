//! The C frontend boundary: lexing, preprocessing, type resolution,
//! symbol-table construction, and reporter-callback emission live
//! behind this trait as an external collaborator specified only at its
//! callback interface. `c` implements a bounded concrete frontend
//! directly on `tree-sitter-c` so `add` works end to end; the
//! `Reporter` trait below is the real boundary, so a more complete
//! frontend could be swapped in without touching the sink, store, or
//! query/render layers.

pub mod c;
pub mod intern;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
pub use types::{Position, Symbol};

/// The `{r_symdef, r_symbol, r_memdef, r_member}` capability set,
/// modeled as a trait parameter rather than a function-pointer table.
pub trait Reporter {
    /// A definition of `sym`. Emitted with `mode = DEF` by the sink.
    fn r_symdef(&mut self, context: Option<&str>, sym: &Symbol) -> Result<()>;

    /// A use of `sym` with the given access mode.
    fn r_symbol(&mut self, context: Option<&str>, mode: u32, pos: Position, sym: &Symbol) -> Result<()>;

    /// A definition of a struct/union member, at the member
    /// declaration's position.
    fn r_memdef(&mut self, context: Option<&str>, pos: Position, tag: Option<&str>, member: Option<&str>) -> Result<()>;

    /// A use of a member; `member = None` means the entire aggregate is
    /// accessed (rendered as `*` by the sink).
    fn r_member(
        &mut self,
        context: Option<&str>,
        mode: u32,
        pos: Position,
        tag: Option<&str>,
        member: Option<&str>,
    ) -> Result<()>;
}

/// Tab-stop setting, forced to 1 so column numbers count raw
/// characters.
pub const TAB_STOP: usize = 1;

/// One input stream discovered by the frontend's initializer.
#[derive(Debug, Clone)]
pub struct Stream {
    pub index: usize,
    pub path: PathBuf,
}

/// Parse the `add` command's frontend-options-and-files tail into a
/// list of input streams: an initializer that accepts the CLI tail and
/// returns a list of input streams. This crate's bounded C frontend
/// takes no flags of its own, every tail argument names a source file.
pub fn init_streams(files: &[String]) -> Vec<Stream> {
    files
        .iter()
        .enumerate()
        .map(|(index, path)| Stream {
            index,
            path: PathBuf::from(path),
        })
        .collect()
}
