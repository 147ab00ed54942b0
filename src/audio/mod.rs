//! Audio loading and segmentation.

pub mod decode;
pub mod filter;
pub mod loader;
pub mod segments;

pub use decode::{DecodedAudio, decode_wav_file};
pub use filter::IirFilter;
pub use loader::{Recording, Rejection, load_recording};
pub use segments::{Segment, SegmentPlan, validate_segmentation};
