use crate::error::Result;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

//===========================================================================//

// The size of a BITMAPINFOHEADER struct, in bytes.
pub(crate) const BMP_HEADER_LEN: u32 = 40;

// The only color depth this crate writes.
pub(crate) const BITS_PER_PIXEL: u16 = 32;

// Size limits for images in an ICO file:
const MIN_WIDTH: u32 = 1;
const MIN_HEIGHT: u32 = 1;
const MAX_WIDTH: u32 = 256;
const MAX_HEIGHT: u32 = 256;

// Pixels with an alpha fraction at or below this are marked transparent in
// the AND mask.
const MASK_ALPHA_THRESHOLD: f64 = 0.5;

//===========================================================================//

/// A decoded image: a rectangular grid of RGBA samples.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    rgba_data: Vec<u8>,
}

impl DecodedImage {
    /// Creates a new image with the given dimensions and RGBA data.  The
    /// `width` and `height` must be nonzero, and `rgba_data` must have `4 *
    /// width * height` bytes and be in row-major order from top to bottom.
    ///
    /// Images of any size may be created; the 256-pixel limit only applies
    /// when encoding.
    pub fn from_rgba_data(
        width: u32,
        height: u32,
        rgba_data: Vec<u8>,
    ) -> Result<DecodedImage> {
        if width < MIN_WIDTH {
            invalid_input!(
                "Invalid width (was {}, but must be at least {})",
                width,
                MIN_WIDTH
            );
        }
        if height < MIN_HEIGHT {
            invalid_input!(
                "Invalid height (was {}, but must be at least {})",
                height,
                MIN_HEIGHT
            );
        }
        let expected_data_len = (width as u64) * (height as u64) * 4;
        if (rgba_data.len() as u64) != expected_data_len {
            invalid_input!(
                "Invalid data length (was {}, but must be {} for {}x{} image)",
                rgba_data.len(),
                expected_data_len,
                width,
                height
            );
        }
        Ok(DecodedImage { width, height, rgba_data })
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the RGBA data for this image, in row-major order from top to
    /// bottom.
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Returns the pixel at column `x` and row `y` (counting down from the
    /// top).  Panics if the coordinates are out of bounds; see
    /// [`get_pixel`](DecodedImage::get_pixel) for a checked lookup.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        match self.get_pixel(x, y) {
            Some(pixel) => pixel,
            None => panic!(
                "Pixel ({}, {}) is outside the {}x{} image",
                x, y, self.width, self.height
            ),
        }
    }

    /// Returns the pixel at column `x` and row `y` (counting down from the
    /// top), or `None` if the coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = 4 * (y as usize * self.width as usize + x as usize);
        match self.rgba_data[start..(start + 4)] {
            [red, green, blue, alpha] => Some(Rgba { red, green, blue, alpha }),
            _ => None,
        }
    }

    /// Decodes the color plane of a 32-bpp BMP.  The AND mask is not
    /// consulted, since the alpha channel already carries the transparency.
    pub(crate) fn read_bmp(data: &[u8]) -> Result<DecodedImage> {
        let mut reader = data;
        let header = BmpHeader::read(&mut reader)?;
        if header.bits_per_pixel != BITS_PER_PIXEL {
            invalid_data!(
                "Unsupported BMP bits-per-pixel (was {}, but only {} is \
                 supported)",
                header.bits_per_pixel,
                BITS_PER_PIXEL
            );
        }
        let (width, height) = (header.width, header.height);
        let color_len = (width as u64) * (height as u64) * 4;
        if (reader.len() as u64) < color_len {
            invalid_data!(
                "BMP color data is truncated (was {} bytes, but {}x{} \
                 image needs {})",
                reader.len(),
                width,
                height,
                color_len
            );
        }
        let row_len = 4 * width as usize;
        let mut rgba = vec![0u8; color_len as usize];
        // Stored rows run bottom to top; flip them while swapping B and R.
        let stored_rows = reader[..(color_len as usize)].chunks(row_len);
        for (stored, row) in stored_rows.zip(rgba.chunks_mut(row_len).rev()) {
            for (bgra, out) in stored.chunks(4).zip(row.chunks_mut(4)) {
                out.copy_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
            }
        }
        DecodedImage::from_rgba_data(width, height, rgba)
    }

    /// Encodes the image as a 32-bpp BMP with an AND mask, as stored inside
    /// an ICO file.
    pub(crate) fn write_bmp(&self) -> Result<Vec<u8>> {
        let width = self.width;
        let height = self.height;
        check_dimensions(width, height)?;

        let data_size = bmp_data_size(width, height) as usize;
        let mut data = Vec::<u8>::with_capacity(data_size);

        // Write the BITMAPINFOHEADER struct:
        data.write_u32::<LittleEndian>(BMP_HEADER_LEN)?;
        data.write_i32::<LittleEndian>(width as i32)?;
        data.write_i32::<LittleEndian>(2 * height as i32)?;
        data.write_u16::<LittleEndian>(1)?; // planes
        data.write_u16::<LittleEndian>(BITS_PER_PIXEL)?;
        data.write_u32::<LittleEndian>(0)?; // compression
        data.write_u32::<LittleEndian>(0)?; // image size
        data.write_i32::<LittleEndian>(0)?; // horz ppm
        data.write_i32::<LittleEndian>(0)?; // vert ppm
        data.write_u32::<LittleEndian>(0)?; // colors used
        data.write_u32::<LittleEndian>(0)?; // colors important
        debug_assert_eq!(data.len(), BMP_HEADER_LEN as usize);

        // Write the color data, bottom row first:
        for row in (0..height).rev() {
            for col in 0..width {
                let color = self.pixel(col, row).color_word();
                data.write_u32::<LittleEndian>(color)?;
            }
        }

        // Write the mask data.  Each row is packed into big-endian 32-bit
        // words, most significant bit first, with the last word of the row
        // padded out with zero bits:
        for row in (0..height).rev() {
            let mut word: u32 = 0;
            let mut num_bits = 0;
            for col in 0..width {
                let bit = self.pixel(col, row).mask_bit();
                word = (word << 1) | (bit as u32);
                num_bits += 1;
                if num_bits == 32 {
                    data.write_u32::<BigEndian>(word)?;
                    word = 0;
                    num_bits = 0;
                }
            }
            if num_bits > 0 {
                word <<= 32 - num_bits;
                data.write_u32::<BigEndian>(word)?;
            }
        }

        debug_assert_eq!(data.len(), data_size);
        Ok(data)
    }
}

//===========================================================================//

/// The fields of a BITMAPINFOHEADER that matter for icon entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BmpHeader {
    pub(crate) width: u32,
    /// The height of the color plane; the stored field is twice this.
    pub(crate) height: u32,
    pub(crate) bits_per_pixel: u16,
}

impl BmpHeader {
    /// Reads and validates the 40-byte header, leaving `reader` at the
    /// start of the color data.
    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<BmpHeader> {
        let mut fields = [0u8; BMP_HEADER_LEN as usize];
        reader.read_exact(&mut fields)?;
        let mut fields = &fields[..];
        let header_len = fields.read_u32::<LittleEndian>()?;
        let width = fields.read_i32::<LittleEndian>()?;
        let doubled_height = fields.read_i32::<LittleEndian>()?;
        let _planes = fields.read_u16::<LittleEndian>()?;
        let bits_per_pixel = fields.read_u16::<LittleEndian>()?;
        if header_len != BMP_HEADER_LEN {
            invalid_data!(
                "Invalid BMP header size (was {}, must be {})",
                header_len,
                BMP_HEADER_LEN
            );
        }
        if width < 1 || doubled_height < 2 || doubled_height % 2 != 0 {
            invalid_data!(
                "Invalid BMP dimensions {}x{} (height counts the color and \
                 mask planes, so it must be even)",
                width,
                doubled_height
            );
        }
        Ok(BmpHeader {
            width: width as u32,
            height: (doubled_height / 2) as u32,
            bits_per_pixel,
        })
    }
}

//===========================================================================//

/// A single RGBA sample with 8 bits per channel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Rgba {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel (0 is fully transparent, 255 fully opaque).
    pub alpha: u8,
}

impl Rgba {
    /// Returns the alpha channel normalized to the range [0, 1].
    pub fn alpha_fraction(&self) -> f64 {
        (self.alpha as f64) / 255.0
    }

    /// Packs this pixel into the word stored in a 32-bpp BMP.  Written
    /// little-endian, its bytes are blue, green, red, alpha.
    pub(crate) fn color_word(&self) -> u32 {
        let alpha = alpha_byte(self.alpha_fraction()) as u32;
        (alpha << 24)
            | ((self.red as u32) << 16)
            | ((self.green as u32) << 8)
            | (self.blue as u32)
    }

    /// Returns true if this pixel is transparent in the AND mask.
    pub(crate) fn mask_bit(&self) -> bool {
        is_mask_transparent(self.alpha_fraction())
    }
}

//===========================================================================//

pub(crate) fn alpha_byte(alpha_fraction: f64) -> u8 {
    (alpha_fraction * 255.0).round().clamp(0.0, 255.0) as u8
}

pub(crate) fn is_mask_transparent(alpha_fraction: f64) -> bool {
    alpha_fraction <= MASK_ALPHA_THRESHOLD
}

/// Returns an error unless both dimensions fit in an ICO entry.
pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width < MIN_WIDTH
        || width > MAX_WIDTH
        || height < MIN_HEIGHT
        || height > MAX_HEIGHT
    {
        return Err(crate::Error::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Returns the number of bytes in each row of the AND mask.  Rows are
/// padded to whole 32-bit words.
pub(crate) fn mask_row_size(width: u32) -> u32 {
    ((width + 31) / 32) * 4
}

/// Returns the total size of an encoded BMP: header, color data and mask.
pub(crate) fn bmp_data_size(width: u32, height: u32) -> u32 {
    BMP_HEADER_LEN + width * height * 4 + mask_row_size(width) * height
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{
        alpha_byte, bmp_data_size, check_dimensions, is_mask_transparent,
        mask_row_size, BmpHeader, DecodedImage, Rgba,
    };

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
        let data = rgba.repeat((width * height) as usize);
        DecodedImage::from_rgba_data(width, height, data).unwrap()
    }

    #[test]
    fn rejects_zero_size_and_wrong_length() {
        assert!(DecodedImage::from_rgba_data(0, 1, Vec::new()).is_err());
        assert!(DecodedImage::from_rgba_data(1, 0, Vec::new()).is_err());
        assert!(DecodedImage::from_rgba_data(2, 2, vec![0; 15]).is_err());
        assert!(DecodedImage::from_rgba_data(300, 1, vec![0; 1200]).is_ok());
    }

    #[test]
    fn pixel_lookup() {
        let rgba = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let image = DecodedImage::from_rgba_data(3, 1, rgba).unwrap();
        assert_eq!(
            image.pixel(1, 0),
            Rgba { red: 5, green: 6, blue: 7, alpha: 8 }
        );
        assert_eq!(
            image.get_pixel(2, 0),
            Some(Rgba { red: 9, green: 10, blue: 11, alpha: 12 })
        );
        assert_eq!(image.get_pixel(3, 0), None);
        assert_eq!(image.get_pixel(0, 1), None);
    }

    #[test]
    #[should_panic]
    fn pixel_out_of_bounds_panics() {
        let image = solid(2, 2, [0, 0, 0, 255]);
        image.pixel(2, 0);
    }

    #[test]
    fn debug_output_names_dimensions() {
        let image = solid(3, 2, [0, 0, 0, 255]);
        let debug = format!("{:?}", image);
        assert!(debug.starts_with("DecodedImage { width: 3, height: 2"));
    }

    #[test]
    fn header_height_counts_both_planes() {
        let data = solid(5, 3, [0, 0, 0, 255]).write_bmp().unwrap();
        let header = BmpHeader::read(&mut &data[..]).unwrap();
        assert_eq!(
            header,
            BmpHeader { width: 5, height: 3, bits_per_pixel: 32 }
        );
        let mut odd = data.clone();
        odd[8] = 7;
        assert!(BmpHeader::read(&mut &odd[..]).is_err());
        assert!(BmpHeader::read(&mut &data[..39]).is_err());
    }

    #[test]
    fn mask_threshold_is_inclusive() {
        assert!(is_mask_transparent(0.0));
        assert!(is_mask_transparent(0.5));
        assert!(!is_mask_transparent(0.50001));
        assert!(!is_mask_transparent(1.0));
        // For 8-bit alpha, 127 is the last transparent value.
        assert!(Rgba { red: 0, green: 0, blue: 0, alpha: 127 }.mask_bit());
        assert!(!Rgba { red: 0, green: 0, blue: 0, alpha: 128 }.mask_bit());
    }

    #[test]
    fn alpha_byte_rounds() {
        assert_eq!(alpha_byte(0.0), 0);
        assert_eq!(alpha_byte(1.0), 255);
        assert_eq!(alpha_byte(0.5), 128);
        assert_eq!(alpha_byte(0.499), 127);
        for alpha in 0..=255u8 {
            assert_eq!(alpha_byte(alpha as f64 / 255.0), alpha);
        }
    }

    #[test]
    fn color_word_byte_order() {
        let pixel = Rgba { red: 0x11, green: 0x22, blue: 0x33, alpha: 0x44 };
        assert_eq!(pixel.color_word().to_le_bytes(), [0x33, 0x22, 0x11, 0x44]);
    }

    #[test]
    fn dimension_limits() {
        assert!(check_dimensions(1, 1).is_ok());
        assert!(check_dimensions(256, 256).is_ok());
        assert!(check_dimensions(0, 16).is_err());
        assert!(check_dimensions(16, 257).is_err());
    }

    #[test]
    fn mask_rows_are_word_aligned() {
        assert_eq!(mask_row_size(1), 4);
        assert_eq!(mask_row_size(32), 4);
        assert_eq!(mask_row_size(33), 8);
        assert_eq!(mask_row_size(256), 32);
        assert_eq!(bmp_data_size(16, 16), 40 + 1024 + 64);
    }

    #[test]
    fn write_2x2_bmp() {
        // Top row: opaque red, transparent green.  Bottom row: half-opaque
        // blue, opaque white.
        let rgba: &[u8] = b"\xff\x00\x00\xff\x00\xff\x00\x00\
                            \x00\x00\xff\x80\xff\xff\xff\xff";
        let image = DecodedImage::from_rgba_data(2, 2, rgba.to_vec()).unwrap();
        let expected: &[u8] = b"\
            \x28\x00\x00\x00\x02\x00\x00\x00\x04\x00\x00\x00\
            \x01\x00\x20\x00\x00\x00\x00\x00\x00\x00\x00\x00\
            \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
            \x00\x00\x00\x00\
            \
            \xff\x00\x00\x80\xff\xff\xff\xff\
            \x00\x00\xff\xff\x00\xff\x00\x00\
            \
            \x00\x00\x00\x00\
            \x40\x00\x00\x00";
        assert_eq!(image.write_bmp().unwrap().as_slice(), expected);
    }

    #[test]
    fn mask_padding_for_odd_width() {
        // 33 transparent pixels per row: one full word of ones, then a word
        // holding a single one bit followed by 31 zero bits.
        let image = solid(33, 3, [0, 0, 0, 0]);
        let data = image.write_bmp().unwrap();
        let mask = &data[(40 + 33 * 3 * 4)..];
        assert_eq!(mask.len(), 3 * 8);
        for row in mask.chunks(8) {
            assert_eq!(row, b"\xff\xff\xff\xff\x80\x00\x00\x00");
        }
    }

    #[test]
    fn bmp_round_trip() {
        let mut rgba = Vec::new();
        for index in 0..(7 * 5) {
            rgba.extend_from_slice(&[index as u8, 255, 3, (index * 7) as u8]);
        }
        let image = DecodedImage::from_rgba_data(7, 5, rgba.clone()).unwrap();
        let data = image.write_bmp().unwrap();
        let decoded = DecodedImage::read_bmp(&data).unwrap();
        assert_eq!(decoded.width(), 7);
        assert_eq!(decoded.height(), 5);
        assert_eq!(decoded.rgba_data(), rgba.as_slice());
    }

    #[test]
    fn read_bmp_rejects_other_depths() {
        let mut data = solid(1, 1, [0, 0, 0, 255]).write_bmp().unwrap();
        data[14] = 24;
        assert!(DecodedImage::read_bmp(&data).is_err());
    }

    #[test]
    fn read_bmp_rejects_truncated_data() {
        let data = solid(4, 4, [0, 0, 0, 255]).write_bmp().unwrap();
        assert!(DecodedImage::read_bmp(&data[..50]).is_err());
    }
}

//===========================================================================//
