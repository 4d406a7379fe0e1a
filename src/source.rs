//! Decoding and resizing of source images.
//!
//! The ICO encoder itself only ever sees [`DecodedImage`] values.  Getting
//! from a GIF, JPEG or PNG file to one of those, and scaling it to each
//! requested size, is the job of an [`ImageSource`].

use crate::error::{Error, Result};
use crate::image::DecodedImage;
use ::image::imageops::{self, FilterType};
use ::image::ImageBuffer;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

//===========================================================================//

/// Where to read a source image from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageInput {
    /// A path to an image file.
    Path(PathBuf),
    /// An encoded image already in memory.
    Bytes(Vec<u8>),
}

impl ImageInput {
    /// Returns an error if this input doesn't refer to anything (an empty
    /// path or an empty byte buffer).
    pub fn check(&self) -> Result<()> {
        match *self {
            ImageInput::Path(ref path) if path.as_os_str().is_empty() => {
                invalid_input!("Image source not specified (empty path)");
            }
            ImageInput::Bytes(ref bytes) if bytes.is_empty() => {
                invalid_input!("Image source not specified (no data)");
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ImageInput {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageInput::Path(ref path) => {
                write!(formatter, "{}", path.display())
            }
            ImageInput::Bytes(ref bytes) => {
                write!(formatter, "<{} bytes of image data>", bytes.len())
            }
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> ImageInput {
        ImageInput::Path(path)
    }
}

impl<'a> From<&'a Path> for ImageInput {
    fn from(path: &'a Path) -> ImageInput {
        ImageInput::Path(path.to_path_buf())
    }
}

impl<'a> From<&'a str> for ImageInput {
    fn from(path: &'a str) -> ImageInput {
        ImageInput::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageInput {
    fn from(path: String) -> ImageInput {
        ImageInput::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> ImageInput {
        ImageInput::Bytes(bytes)
    }
}

impl<'a> From<&'a [u8]> for ImageInput {
    fn from(bytes: &'a [u8]) -> ImageInput {
        ImageInput::Bytes(bytes.to_vec())
    }
}

//===========================================================================//

/// A capability for decoding source images and scaling them.
pub trait ImageSource {
    /// Decodes an image.  Fails with [`Error::Unreadable`] if the input
    /// can't be parsed as an image.
    fn decode(&self, input: &ImageInput) -> Result<DecodedImage>;

    /// Returns a copy of `image` scaled to exactly `width` by `height`
    /// pixels.  The original is left untouched.
    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage>;
}

//===========================================================================//

/// The resampling filter used when scaling source images.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ResizeFilter {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Linear interpolation.
    Triangle,
    /// Cubic interpolation.
    CatmullRom,
    /// Gaussian blur.
    Gaussian,
    /// Lanczos with a window of 3.
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Settings for an [`ImageCrateSource`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct SourceConfig {
    /// The filter used when scaling.
    pub filter: ResizeFilter,
}

//===========================================================================//

/// An [`ImageSource`] backed by the `image` crate.  Supports every format
/// that crate was built with (GIF, JPEG, PNG, BMP and others by default).
#[derive(Clone, Debug, Default)]
pub struct ImageCrateSource {
    config: SourceConfig,
}

impl ImageCrateSource {
    /// Creates a source with the given settings.
    pub fn new(config: SourceConfig) -> ImageCrateSource {
        ImageCrateSource { config }
    }

    /// Returns the settings this source was created with.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl ImageSource for ImageCrateSource {
    fn decode(&self, input: &ImageInput) -> Result<DecodedImage> {
        input.check()?;
        let decoded = match *input {
            ImageInput::Path(ref path) => ::image::open(path),
            ImageInput::Bytes(ref bytes) => ::image::load_from_memory(bytes),
        };
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(error) => {
                return Err(Error::Unreadable(format!("{}: {}", input, error)));
            }
        };
        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();
        debug!("Decoded {}x{} image from {}", width, height, input);
        DecodedImage::from_rgba_data(width, height, rgba.into_raw())
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage> {
        if width == image.width() && height == image.height() {
            return Ok(image.clone());
        }
        let buffer = match ImageBuffer::<::image::Rgba<u8>, &[u8]>::from_raw(
            image.width(),
            image.height(),
            image.rgba_data(),
        ) {
            Some(buffer) => buffer,
            None => invalid_input!("RGBA buffer too small for image size"),
        };
        let resized = imageops::resize(
            &buffer,
            width,
            height,
            self.config.filter.filter_type(),
        );
        DecodedImage::from_rgba_data(width, height, resized.into_raw())
    }
}

//===========================================================================//


//===========================================================================//
