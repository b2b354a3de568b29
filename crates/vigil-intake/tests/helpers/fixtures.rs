//! Test fixtures: encoded images and candidate files.

use image::{ImageFormat, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use vigil_core::IntegrityHash;
use vigil_intake::CandidateFile;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 255) as u8, (y * 13 % 255) as u8, 90])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode fixture image");
    buf.into_inner()
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// JPEG padded with trailing bytes to exactly `total_len`
pub fn create_test_jpeg_of_len(width: u32, height: u32, total_len: usize) -> Vec<u8> {
    let mut data = encode(width, height, ImageFormat::Jpeg);
    assert!(data.len() <= total_len, "fixture JPEG larger than requested size");
    data.resize(total_len, 0);
    data
}

pub fn png_candidate(file_name: &str) -> CandidateFile {
    CandidateFile::from_bytes(file_name, "image/png", create_test_png(8, 6))
}

pub fn sha256_of(data: &[u8]) -> IntegrityHash {
    let digest: [u8; 32] = Sha256::digest(data).into();
    IntegrityHash::from_sha256(&digest)
}
