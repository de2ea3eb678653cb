//! Image related utilities: GIF frames, steganography, pixel scrambling and
//! terminal previews.

pub mod gif;
pub mod scramble;
pub mod show;
pub mod stego;
