use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

//===========================================================================//

/// A requested icon size.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Size {
    /// A square image with the given side length, in pixels.
    Square(u32),
    /// An image with the given width and height, in pixels.
    Rect(u32, u32),
}

impl Size {
    /// Returns the `(width, height)` pair for this size.
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            Size::Square(side) => (side, side),
            Size::Rect(width, height) => (width, height),
        }
    }
}

impl From<u32> for Size {
    fn from(side: u32) -> Size {
        Size::Square(side)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Size {
        Size::Rect(width, height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Size::Square(side) => write!(formatter, "{}", side),
            Size::Rect(width, height) => {
                write!(formatter, "{}x{}", width, height)
            }
        }
    }
}

impl FromStr for Size {
    type Err = Error;

    /// Parses either a bare side length (`"32"`) or a `WIDTHxHEIGHT` pair
    /// (`"32x24"`).
    fn from_str(string: &str) -> Result<Size> {
        let string = string.trim();
        let parse = |part: &str| -> Result<u32> {
            match part.trim().parse::<u32>() {
                Ok(value) => Ok(value),
                Err(_) => invalid_input!("Invalid size {:?}", string),
            }
        };
        match string.split_once(|c: char| c == 'x' || c == 'X') {
            Some((width, height)) => {
                Ok(Size::Rect(parse(width)?, parse(height)?))
            }
            None => Ok(Size::Square(parse(string)?)),
        }
    }
}

//===========================================================================//

/// Converts sizes to `(width, height)` pairs, dropping duplicates but keeping
/// the order in which each pair first appears.
pub fn normalize_sizes(sizes: &[Size]) -> Vec<(u32, u32)> {
    let mut seen = HashSet::with_capacity(sizes.len());
    sizes
        .iter()
        .map(Size::dimensions)
        .filter(|&dimensions| seen.insert(dimensions))
        .collect()
}

//===========================================================================//


//===========================================================================//
