//! A library for generating multi-resolution ICO files.
//!
//! # Overview
//!
//! An ICO file holds one or more images of the same icon at different
//! resolutions.  This crate stores each of them as an uncompressed 32-bpp BMP
//! with a 1-bit AND mask, the layout understood by every version of Windows.
//!
//! An [`IcoDocument`] collects [`IcoEntry`] values in order, and
//! [`IcoEntry::encode`] turns a [`DecodedImage`] into an entry.  Source
//! images in GIF, JPEG, PNG and other formats are decoded and scaled by an
//! [`ImageSource`], normally an [`ImageCrateSource`].
//!
//! # Examples
//!
//! ## Building an ICO file from raw pixels
//!
//! ```
//! // A 16x16 image of solid, half-transparent blue:
//! let rgba = [0, 0, 255, 128].repeat(16 * 16);
//! let image = icogen::DecodedImage::from_rgba_data(16, 16, rgba).unwrap();
//! let mut document = icogen::IcoDocument::new();
//! document.add_entry(icogen::IcoEntry::encode(&image).unwrap());
//! let data = document.serialize().unwrap();
//! assert_eq!(&data[..6], b"\x00\x00\x01\x00\x01\x00");
//! ```
//!
//! ## Converting a source image at several sizes
//!
//! ```no_run
//! use icogen::{IcoDocument, ImageCrateSource, Size};
//! let source = ImageCrateSource::default();
//! let mut document = IcoDocument::new();
//! let sizes = [Size::Square(16), Size::Square(32), Size::Rect(48, 48)];
//! document.add_image(&source, "logo.png", &sizes).unwrap();
//! document.write_to_file("favicon.ico").unwrap();
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod error;
mod icondir;
mod image;
mod size;
mod source;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::icondir::{IcoDocument, IcoEntry};
pub use crate::image::{DecodedImage, Rgba};
pub use crate::size::{normalize_sizes, Size};
pub use crate::source::{
    ImageCrateSource, ImageInput, ImageSource, ResizeFilter, SourceConfig,
};

//===========================================================================//
