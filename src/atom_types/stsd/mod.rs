mod stsd;
mod sample;
mod video;
mod audio;
mod extension;
mod esds;

pub use stsd::{Stsd, MediaKind};
pub use sample::{SampleDescription, SampleEntry};
pub use video::VideoDescription;
pub use audio::{AudioDescription, AudioVersion};
pub use extension::{Extension, Pasp, Fiel};
pub use esds::{Esds, read_descriptor_length, write_descriptor_length};
