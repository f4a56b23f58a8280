//! This crate provides routines for encoding and decoding layered,
//! multi-frame ASE sprite files.
//!
//! A document is decoded into a `Sprite`, which holds the layer tree,
//! the cels of each frame, the palette history and the selection
//! masks.  Chunks that cannot be decoded are reported as warnings on
//! the `FileOp` and skipped, so a damaged file still loads as much as
//! it can.

extern crate byteorder;
extern crate flate2;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;

pub use ase::*;
pub use errcode::AseError;
pub use errcode::AseResult;
pub use errcode::ErrorKind;
pub use fileop::{FileOp,FileOpOptions,Warning};
pub use raster::{GrayAlpha,Image,PixelFormat,Pixels,Rgba};
pub use sprite::{Cel,ImageId,Layer,LayerId,LayerKind,Mask,Palette,Sprite,Stock};
pub use sprite::{DEFAULT_FRAME_DURATION,LAYER_IS_BACKGROUND,LAYER_IS_LOCKMOVE,
                 LAYER_IS_READABLE,LAYER_IS_WRITABLE};

pub mod codec;
pub mod errcode;
mod ase;
mod fileop;
mod raster;
mod sprite;
