// ============================================================================
// IMAGE IO — codec delegation with extension-based format selection
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

/// Quality used when encoding JPEG output.
const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode any supported file into an RGBA buffer. Failure leaves nothing
/// half-loaded; the caller's document is only replaced on success.
pub fn load_image(path: &Path) -> Result<RgbaImage, CodecError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Encode a flattened buffer, picking the container from the file extension:
/// jpg/jpeg at quality 95, png at maximum compression, bmp as-is; anything
/// else goes through the codec's default for that extension.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), CodecError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => {
            // JPEG doesn't support alpha, convert to RGB
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        "png" => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Best,
                PngFilterType::Adaptive,
            );
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        "bmp" => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        _ => {
            DynamicImage::ImageRgba8(image.clone()).save(path)?;
        }
    }
    Ok(())
}

/// Display name for a freshly loaded layer: the file stem, or a fallback.
pub fn layer_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Background".to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pixelforge-io-{}-{name}", std::process::id()))
    }

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let mut img = RgbaImage::new(5, 4);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 50) as u8, (y * 60) as u8, 9, 255]);
        }
        let path = temp_path("roundtrip.png");
        save_image(&img, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, img);
    }

    #[test]
    fn bmp_save_succeeds() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        let path = temp_path("out.bmp");
        save_image(&img, &path).unwrap();
        assert!(load_image(&path).is_ok());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn jpeg_save_drops_alpha_but_succeeds() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([120, 60, 30, 128]));
        let path = temp_path("out.jpg");
        save_image(&img, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(load_image(Path::new("/nonexistent/definitely-not-here.png")).is_err());
    }

    #[test]
    fn layer_name_comes_from_the_file_stem() {
        assert_eq!(layer_name_for(Path::new("/tmp/photo.PNG")), "photo");
        assert_eq!(layer_name_for(Path::new("..")), "Background");
    }
}
