//! Pure resolution functions.
//!
//! Both resolvers are total and side-effect free: the active-content
//! resolver picks which item should play at a given instant, the source
//! resolver turns that item into a render instruction. All I/O-dependent
//! outcomes (missing blobs, unreachable media) surface at playback time,
//! outside these functions.

pub mod active;
pub mod source;

pub use source::RenderInstruction;
