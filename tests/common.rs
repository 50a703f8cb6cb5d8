#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

/// Uncompressed, single-colour image: re-encoding always shrinks it.
pub fn flat_bmp(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 120, 210])));
    encode(&img, ImageFormat::Bmp)
}

pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Source tree used by the end-to-end tests:
///
/// ```text
/// root/cover.bmp
/// root/albums/2023/beach.png
/// root/albums/2023/readme.txt
/// root/albums/corrupt.jpg
/// ```
pub fn create_source_tree(root: &Path) {
    let album = root.join("albums").join("2023");
    fs::create_dir_all(&album).unwrap();

    fs::write(root.join("cover.bmp"), flat_bmp(96, 64)).unwrap();
    fs::write(album.join("beach.png"), gradient_png(80, 60)).unwrap();
    fs::write(album.join("readme.txt"), b"holiday photos").unwrap();
    fs::write(root.join("albums").join("corrupt.jpg"), b"\xFF\xD8 truncated").unwrap();
}
