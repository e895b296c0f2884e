//! Track level views derived from the atom tree.

mod track;
mod offset;

pub use track::Track;
pub use offset::{SampleOffsets, SampleOffset};
