#![allow(dead_code)]

use std::path::Path;

use scroll_sequence::config::{Configuration, SequenceConfig};

pub const PREFIX: &str = "frame";

/// Write a solid JPEG frame `<dir>/frame-NNN.jpg` (1-indexed).
pub fn write_frame(dir: &Path, number: usize, width: u32, height: u32) {
    let shade = (number * 40 % 256) as u8;
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
    img.save(dir.join(format!("{PREFIX}-{number:03}.jpg")))
        .expect("write jpeg frame");
}

/// Write a file with the right name but undecodable contents.
pub fn write_corrupt_frame(dir: &Path, number: usize) {
    std::fs::write(dir.join(format!("{PREFIX}-{number:03}.jpg")), b"not a jpeg")
        .expect("write corrupt frame");
}

pub fn sequence_in(dir: &Path, frame_count: usize) -> SequenceConfig {
    SequenceConfig {
        base_path_desktop: dir.to_path_buf(),
        base_path_mobile: dir.join("mobile"),
        filename_prefix: PREFIX.to_string(),
        frame_count,
        ..SequenceConfig::default()
    }
}

pub fn config_in(dir: &Path, frame_count: usize) -> Configuration {
    let mut cfg = Configuration::default();
    cfg.sequence = sequence_in(dir, frame_count);
    cfg.render.frame_interval = std::time::Duration::from_millis(5);
    cfg.render.fallback_width = 64;
    cfg.render.fallback_height = 48;
    cfg
}
