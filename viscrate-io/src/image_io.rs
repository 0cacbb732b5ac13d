//! Image reading and writing through the `image` crate

use image::{ColorType, DynamicImage};
use std::path::Path;
use viscrate_core::{Error, Image, Result};

fn map_image_error(path: &Path, e: image::ImageError) -> Error {
    match e {
        image::ImageError::IoError(io) => Error::Io(io),
        image::ImageError::Unsupported(u) => {
            Error::UnsupportedFormat(format!("{}: {}", path.display(), u))
        }
        other => Error::InvalidData(format!("{}: {}", path.display(), other)),
    }
}

/// Read an image as 8-bit gray, gray-alpha, RGB or RGBA
pub fn read_image(path: &Path) -> Result<Image> {
    let decoded = image::open(path).map_err(|e| map_image_error(path, e))?;
    Ok(from_dynamic(decoded))
}

fn from_dynamic(decoded: DynamicImage) -> Image {
    let (width, height) = (decoded.width(), decoded.height());
    let color = decoded.color();

    let (num_channels, data) = match (color.channel_count(), color.has_alpha()) {
        (1, _) => (1, decoded.into_luma8().into_raw()),
        (2, _) => (2, decoded.into_luma_alpha8().into_raw()),
        (_, false) => (3, decoded.into_rgb8().into_raw()),
        (_, true) => (4, decoded.into_rgba8().into_raw()),
    };

    Image {
        width,
        height,
        num_channels,
        bytes_per_channel: 1,
        data,
    }
}

/// Write an 8-bit image; the container is chosen by the file extension
pub fn write_image(path: &Path, image: &Image) -> Result<()> {
    if image.bytes_per_channel != 1 {
        return Err(Error::Unsupported(format!(
            "{} bytes per channel",
            image.bytes_per_channel
        )));
    }
    if !image.has_data() || image.data.len() < image.expected_len() {
        return Err(Error::InvalidData(format!(
            "image of {}x{}x{} has {} bytes",
            image.width,
            image.height,
            image.num_channels,
            image.data.len()
        )));
    }

    let color = match image.num_channels {
        1 => ColorType::L8,
        2 => ColorType::La8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        n => return Err(Error::Unsupported(format!("{} channels", n))),
    };

    image::save_buffer(
        path,
        &image.data[..image.expected_len()],
        image.width,
        image.height,
        color,
    )
    .map_err(|e| map_image_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_write_then_read() {
        let path = std::env::temp_dir().join(format!("viscrate_image_{}.png", std::process::id()));
        let pixels: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 7) as u8).collect();
        let image = Image::from_rgb8(4, 3, pixels);

        write_image(&path, &image).unwrap();
        let loaded = read_image(&path).unwrap();

        assert_eq!(loaded, image);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_reject_short_buffer() {
        let image = Image::from_rgb8(4, 4, vec![0; 10]);
        let path = std::env::temp_dir().join("viscrate_short.png");
        assert!(matches!(write_image(&path, &image), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = read_image(Path::new("/nonexistent/viscrate/texture.png"));
        assert!(result.is_err());
    }
}
