use crate::error::{Error, Result};
use crate::image::{
    check_dimensions, BmpHeader, DecodedImage, BITS_PER_PIXEL,
};
use crate::size::{normalize_sizes, Size};
use crate::source::{ImageInput, ImageSource};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

//===========================================================================//

// The resource type number for icons (as opposed to cursors, which are 2).
const ICON_RESOURCE_TYPE: u16 = 1;

// The sizes of the ICONDIR and ICONDIRENTRY structs, in bytes.
const ICONDIR_LEN: u32 = 6;
const ICONDIRENTRY_LEN: u32 = 16;

// The signature that all PNG files start with.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

//===========================================================================//

/// A collection of images; the contents of a single ICO file.
///
/// Entries are written in the order they were added.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IcoDocument {
    entries: Vec<IcoEntry>,
}

impl IcoDocument {
    /// Creates a new, empty collection of icons.
    pub fn new() -> IcoDocument {
        IcoDocument { entries: Vec::new() }
    }

    /// Returns the entries in this collection.
    pub fn entries(&self) -> &[IcoEntry] {
        &self.entries
    }

    /// Returns the number of entries in this collection.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been added yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an entry to the end of the collection.
    pub fn add_entry(&mut self, entry: IcoEntry) {
        trace!(
            "Adding {}x{} entry ({} bytes)",
            entry.width,
            entry.height,
            entry.data.len()
        );
        self.entries.push(entry);
    }

    /// Decodes a source image and adds one entry for each requested size.
    ///
    /// If `sizes` is empty, the source is encoded at its native size.
    /// Duplicate sizes are encoded only once.  Every size is resized from
    /// the original decoded image.  If any size fails, no entries are added.
    pub fn add_image<S, I>(
        &mut self,
        source: &S,
        input: I,
        sizes: &[Size],
    ) -> Result<()>
    where
        S: ImageSource + ?Sized,
        I: Into<ImageInput>,
    {
        let input = input.into();
        input.check()?;
        let original = source.decode(&input)?;
        let dimensions = if sizes.is_empty() {
            vec![(original.width(), original.height())]
        } else {
            normalize_sizes(sizes)
        };
        let mut entries = Vec::with_capacity(dimensions.len());
        for (width, height) in dimensions {
            check_dimensions(width, height)?;
            let resized = source.resize(&original, width, height)?;
            entries.push(IcoEntry::encode(&resized)?);
        }
        debug!(
            "Encoded {} entries from {} ({}x{} source)",
            entries.len(),
            input,
            original.width(),
            original.height()
        );
        for entry in entries {
            self.add_entry(entry);
        }
        Ok(())
    }

    /// Reads an ICO file into memory.  Entry payloads are kept as they are;
    /// call [`IcoEntry::decode`] to get at the pixels.
    pub fn read<R: Read + Seek>(mut reader: R) -> Result<IcoDocument> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let mut header = [0u16; 3];
        reader.read_u16_into::<LittleEndian>(&mut header)?;
        match header {
            [0, ICON_RESOURCE_TYPE, _] => {}
            [0, restype, _] => invalid_data!(
                "Not an icon file (resource type {}, expected {})",
                restype,
                ICON_RESOURCE_TYPE
            ),
            [reserved, _, _] => {
                invalid_data!("Nonzero reserved field {} in ICONDIR", reserved)
            }
        }
        let records = (0..header[2])
            .map(|_| DirectoryRecord::read(&mut reader))
            .collect::<Result<Vec<DirectoryRecord>>>()?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let end = record.data_offset as u64 + record.data_size as u64;
            if end > stream_len {
                invalid_data!(
                    "Entry data at {}..{} runs past the end of the file \
                     ({} bytes)",
                    record.data_offset,
                    end,
                    stream_len
                );
            }
            reader.seek(SeekFrom::Start(record.data_offset as u64))?;
            let mut data = vec![0u8; record.data_size as usize];
            reader.read_exact(&mut data)?;
            entries.push(record.into_entry(data));
        }
        Ok(IcoDocument { entries })
    }

    /// Writes an ICO file.  Fails without writing anything if the document
    /// is empty.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let offsets = self.data_offsets()?;
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(ICON_RESOURCE_TYPE)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        for (entry, &data_offset) in self.entries.iter().zip(offsets.iter()) {
            writer.write_u8(entry.width_byte())?;
            writer.write_u8(entry.height_byte())?;
            writer.write_u8(entry.num_colors)?;
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(1)?; // color planes
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel)?;
            writer.write_u32::<LittleEndian>(entry.payload_size())?;
            writer.write_u32::<LittleEndian>(data_offset)?;
        }
        for entry in self.entries.iter() {
            writer.write_all(&entry.data)?;
        }
        Ok(())
    }

    /// Returns the complete ICO file as bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.write(&mut data)?;
        Ok(data)
    }

    /// Writes the ICO file to `path`.  The bytes go to a temporary file next
    /// to `path`, which replaces `path` only once everything was written, so
    /// a failed write never leaves a partial ICO file behind.  An empty
    /// document fails before anything is created.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            invalid_input!("No output path given");
        }
        let data = self.serialize()?;
        replace_file(path, |file| file.write_all(&data))?;
        debug!(
            "Wrote {} entries ({} bytes) to {}",
            self.entries.len(),
            data.len(),
            path.display()
        );
        Ok(())
    }

    /// Returns the file offset of each entry's image data.  Fails if the
    /// document is empty or too large for the ICO format.
    fn data_offsets(&self) -> Result<Vec<u32>> {
        if self.entries.is_empty() {
            return Err(Error::EmptyDocument);
        }
        if self.entries.len() > (u16::MAX as usize) {
            invalid_input!(
                "Too many entries in IcoDocument (was {}, but max is {})",
                self.entries.len(),
                u16::MAX
            );
        }
        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut data_offset =
            ICONDIR_LEN + ICONDIRENTRY_LEN * (self.entries.len() as u32);
        for entry in self.entries.iter() {
            trace!(
                "{}x{} entry at offset {}",
                entry.width,
                entry.height,
                data_offset
            );
            offsets.push(data_offset);
            data_offset = match data_offset.checked_add(entry.payload_size()) {
                Some(offset) => offset,
                None => invalid_input!("ICO file would exceed 4 GiB"),
            };
        }
        Ok(offsets)
    }
}

//===========================================================================//

// One ICONDIRENTRY as found on disk.
struct DirectoryRecord {
    width_byte: u8,
    height_byte: u8,
    num_colors: u8,
    bits_per_pixel: u16,
    data_size: u32,
    data_offset: u32,
}

impl DirectoryRecord {
    fn read<R: Read>(reader: &mut R) -> Result<DirectoryRecord> {
        let width_byte = reader.read_u8()?;
        let height_byte = reader.read_u8()?;
        let num_colors = reader.read_u8()?;
        let reserved = reader.read_u8()?;
        if reserved != 0 {
            invalid_data!("Nonzero reserved field {} in ICONDIRENTRY", reserved);
        }
        let _color_planes = reader.read_u16::<LittleEndian>()?;
        Ok(DirectoryRecord {
            width_byte,
            height_byte,
            num_colors,
            bits_per_pixel: reader.read_u16::<LittleEndian>()?,
            data_size: reader.read_u32::<LittleEndian>()?,
            data_offset: reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Pairs the record with its payload.  A BMP header, when present,
    /// overrides the directory's one-byte dimensions; anything malformed is
    /// left for [`IcoEntry::decode`] to report.
    fn into_entry(self, data: Vec<u8>) -> IcoEntry {
        let from_byte = |byte: u8| if byte == 0 { 256 } else { byte as u32 };
        let header = if data.starts_with(PNG_SIGNATURE) {
            None
        } else {
            BmpHeader::read(&mut data.as_slice()).ok()
        };
        let (width, height) = match header {
            Some(header) => (header.width, header.height),
            None => (from_byte(self.width_byte), from_byte(self.height_byte)),
        };
        IcoEntry {
            width,
            height,
            num_colors: self.num_colors,
            bits_per_pixel: self.bits_per_pixel,
            data,
        }
    }
}

/// Creates `path` through a temporary file in the same directory.  If
/// `write` fails, the temporary file is removed and `path` is untouched.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|error| error.error)?;
    Ok(())
}

//===========================================================================//

/// One entry in an ICO file; a single image at one resolution.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IcoEntry {
    width: u32,
    height: u32,
    num_colors: u8,
    bits_per_pixel: u16,
    data: Vec<u8>,
}

impl IcoEntry {
    /// Encodes an image as an uncompressed 32-bpp BMP with an AND mask.
    /// Fails if either dimension is zero or greater than 256.
    pub fn encode(image: &DecodedImage) -> Result<IcoEntry> {
        let data = image.write_bmp()?;
        Ok(IcoEntry {
            width: image.width(),
            height: image.height(),
            num_colors: 0,
            bits_per_pixel: BITS_PER_PIXEL,
            data,
        })
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the width as stored in the ICO directory, where 256 wraps
    /// around to 0.
    pub fn width_byte(&self) -> u8 {
        if self.width > 255 { 0 } else { self.width as u8 }
    }

    /// Returns the height as stored in the ICO directory, where 256 wraps
    /// around to 0.
    pub fn height_byte(&self) -> u8 {
        if self.height > 255 { 0 } else { self.height as u8 }
    }

    /// Returns the number of colors in the palette; always 0 for true-color
    /// entries.
    pub fn color_palette_colors(&self) -> u8 {
        self.num_colors
    }

    /// Returns the bits-per-pixel (color depth) of the image.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the length of the encoded image data, in bytes.
    pub fn payload_size(&self) -> u32 {
        self.data.len() as u32
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the image is encoded as a PNG rather than a BMP.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Decodes the color plane of this entry.  Returns an error if the data
    /// is malformed or isn't a 32-bpp BMP.
    pub fn decode(&self) -> Result<DecodedImage> {
        if self.is_png() {
            invalid_data!("PNG-compressed entries are not supported");
        }
        let image = DecodedImage::read_bmp(&self.data)?;
        if image.width() != self.width || image.height() != self.height {
            invalid_data!(
                "Encoded image has wrong dimensions \
                 (was {}x{}, but should be {}x{})",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
        }
        Ok(image)
    }
}

//===========================================================================//


//===========================================================================//
