//! Core value types shared by the streaming engine.
//!
//! - [`Geometry`] is the width/height pair a frame pool is rendered for
//! - [`FrameRate`] is the client's target rate with its derived pacing interval
//! - [`EncodedFrame`] is one opaque, reference-counted frame payload

mod frame;
mod frame_rate;
mod geometry;

pub use frame::EncodedFrame;
pub use frame_rate::FrameRate;
pub use geometry::Geometry;
