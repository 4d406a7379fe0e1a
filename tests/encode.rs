extern crate icogen;

use icogen::{DecodedImage, ErrorKind, IcoEntry};
use proptest::prelude::*;

//===========================================================================//

fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
    let data = rgba.repeat((width * height) as usize);
    DecodedImage::from_rgba_data(width, height, data).unwrap()
}

fn expected_payload_size(width: u32, height: u32) -> u32 {
    40 + width * height * 4 + ((width + 31) / 32) * 4 * height
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..(offset + 4)]);
    i32::from_le_bytes(bytes)
}

//===========================================================================//

#[test]
fn entry_metadata() {
    let entry = IcoEntry::encode(&solid_image(24, 16, [1, 2, 3, 255])).unwrap();
    assert_eq!(entry.width(), 24);
    assert_eq!(entry.height(), 16);
    assert_eq!(entry.width_byte(), 24);
    assert_eq!(entry.height_byte(), 16);
    assert_eq!(entry.color_palette_colors(), 0);
    assert_eq!(entry.bits_per_pixel(), 32);
    assert!(!entry.is_png());
    assert_eq!(entry.payload_size(), expected_payload_size(24, 16));
}

#[test]
fn bmp_header_doubles_height() {
    let entry = IcoEntry::encode(&solid_image(5, 3, [0, 0, 0, 255])).unwrap();
    let data = entry.data();
    assert_eq!(read_i32(data, 0), 40);
    assert_eq!(read_i32(data, 4), 5);
    assert_eq!(read_i32(data, 8), 6);
    assert_eq!(&data[12..16], b"\x01\x00\x20\x00");
    assert!(data[16..40].iter().all(|&byte| byte == 0));
}

#[test]
fn encode_256x256_wraps_directory_bytes() {
    let image = solid_image(256, 256, [200, 100, 50, 255]);
    let entry = IcoEntry::encode(&image).unwrap();
    assert_eq!(entry.width(), 256);
    assert_eq!(entry.height(), 256);
    assert_eq!(entry.width_byte(), 0);
    assert_eq!(entry.height_byte(), 0);
    assert_eq!(read_i32(entry.data(), 4), 256);
    assert_eq!(read_i32(entry.data(), 8), 512);
}

#[test]
fn encode_rejects_oversized_images() {
    for &(width, height) in &[(257, 16), (16, 257), (300, 300)] {
        let image = solid_image(width, height, [0, 0, 0, 255]);
        let error = IcoEntry::encode(&image).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        match error {
            icogen::Error::InvalidDimensions { width: w, height: h } => {
                assert_eq!((w, h), (width, height));
            }
            other => panic!("Unexpected error: {}", other),
        }
    }
}

#[test]
fn rows_are_stored_bottom_up() {
    // Top row red, bottom row green.
    let rgba: &[u8] = b"\xff\x00\x00\xff\x00\xff\x00\xff";
    let image = DecodedImage::from_rgba_data(1, 2, rgba.to_vec()).unwrap();
    let entry = IcoEntry::encode(&image).unwrap();
    let colors = &entry.data()[40..48];
    assert_eq!(colors, b"\x00\xff\x00\xff\x00\x00\xff\xff");
}

#[test]
fn mask_marks_half_transparent_pixels() {
    // Alpha values 0, 127, 128 and 255 across one row.
    let rgba: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x7f\
                        \x00\x00\x00\x80\x00\x00\x00\xff";
    let image = DecodedImage::from_rgba_data(4, 1, rgba.to_vec()).unwrap();
    let entry = IcoEntry::encode(&image).unwrap();
    let data = entry.data();
    // The alpha channel keeps its full precision...
    let alphas: Vec<u8> = data[40..56].chunks(4).map(|c| c[3]).collect();
    assert_eq!(alphas, vec![0x00, 0x7f, 0x80, 0xff]);
    // ...while the mask only records the two transparent-ish pixels.
    assert_eq!(&data[56..], b"\xc0\x00\x00\x00");
}

#[test]
fn width_33_uses_two_mask_words_per_row() {
    let height = 7;
    let image = solid_image(33, height, [0, 0, 0, 0]);
    let entry = IcoEntry::encode(&image).unwrap();
    let mask = &entry.data()[(40 + 33 * height as usize * 4)..];
    assert_eq!(mask.len(), height as usize * 8);
    for row in mask.chunks(8) {
        assert_eq!(row, b"\xff\xff\xff\xff\x80\x00\x00\x00");
    }
}

#[test]
fn width_64_mask_needs_no_padding() {
    let image = solid_image(64, 2, [0, 0, 0, 0]);
    let entry = IcoEntry::encode(&image).unwrap();
    let mask = &entry.data()[(40 + 64 * 2 * 4)..];
    assert_eq!(mask, [0xffu8; 16].as_slice());
}

//===========================================================================//

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn payload_size_matches_layout(width in 1u32..=256, height in 1u32..=256) {
        let image = solid_image(width, height, [10, 20, 30, 40]);
        let entry = IcoEntry::encode(&image).unwrap();
        let expected = expected_payload_size(width, height);
        prop_assert_eq!(entry.payload_size(), expected);
        prop_assert_eq!(entry.data().len(), expected as usize);
    }

    #[test]
    fn color_plane_round_trips(
        (width, height, rgba) in (1u32..=40, 1u32..=40).prop_flat_map(
            |(width, height)| {
                let len = (width * height * 4) as usize;
                (
                    Just(width),
                    Just(height),
                    prop::collection::vec(any::<u8>(), len),
                )
            },
        )
    ) {
        let image =
            DecodedImage::from_rgba_data(width, height, rgba.clone()).unwrap();
        let decoded = IcoEntry::encode(&image).unwrap().decode().unwrap();
        prop_assert_eq!(decoded.width(), width);
        prop_assert_eq!(decoded.height(), height);
        for (original, decoded) in
            rgba.chunks(4).zip(decoded.rgba_data().chunks(4))
        {
            prop_assert_eq!(&original[..3], &decoded[..3]);
            let delta = (original[3] as i32 - decoded[3] as i32).abs();
            prop_assert!(delta <= 1);
        }
    }
}

//===========================================================================//
