//! Atom cursor, tree walker and opaque atom passthrough.

mod header;
mod raw;
mod walker;
pub mod qtatom;

pub use header::{Atom, write_atom, write_atom64};
pub use raw::{RawAtom, MaybeKnown};
pub use walker::{walk, ParseFn, CaptureFn};
pub use qtatom::{QtAtom, QtAtomNode};
