use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, RgbaImage};

use crate::data_uri;
use crate::error::ExpandError;

/// The image the user uploaded, kept encoded as received.
#[derive(Debug, Clone)]
pub struct OriginalImage {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub file_name: Option<String>,
}

impl OriginalImage {
    /// Sniffs the format and reads the dimensions from the header only.
    pub fn from_bytes(bytes: Vec<u8>, file_name: Option<String>) -> Result<Self, ExpandError> {
        let reader = image::io::Reader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ExpandError::ImageDecode(e.to_string()))?;

        let format = reader
            .format()
            .ok_or_else(|| ExpandError::ImageDecode("unrecognized image format".to_string()))?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ExpandError::ImageDecode(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ExpandError::ImageDecode(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        Ok(Self {
            bytes: bytes.into(),
            mime_type: mime_type_of(format).to_string(),
            width,
            height,
            file_name,
        })
    }

    /// Pasted `data:image/...` text.
    pub fn from_data_uri(uri: &str) -> Result<Self, ExpandError> {
        let (_, bytes) = data_uri::decode(uri)?;
        Self::from_bytes(bytes, None)
    }

    /// Raw RGBA pixels, as a clipboard hands them out. Stored as PNG.
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        file_name: Option<String>,
    ) -> Result<Self, ExpandError> {
        let pixels = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            ExpandError::ImageDecode(format!("pixel buffer does not match {}x{}", width, height))
        })?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(pixels.as_raw(), width, height, ColorType::Rgba8)
            .map_err(|e| ExpandError::ImageDecode(e.to_string()))?;

        Self::from_bytes(png, file_name)
    }
}

pub async fn load_from_path(path: &Path) -> Result<OriginalImage, ExpandError> {
    if !is_image_file(path) {
        return Err(ExpandError::ImageDecode(format!(
            "not a supported image file: {}",
            path.display()
        )));
    }

    log::info!("📖 Reading image: {}", path.display());
    let bytes = tokio::fs::read(path).await?;
    log::info!("✅ File read successfully, size: {} bytes", bytes.len());

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string());

    let image = OriginalImage::from_bytes(bytes, file_name)?;
    log::info!("🖼 Loaded {}x{} {}", image.width, image.height, image.mime_type);
    Ok(image)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp"
            )
        })
        .unwrap_or(false)
}

fn mime_type_of(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("photo.jpg")));
        assert!(is_image_file(Path::new("photo.jpeg")));
        assert!(is_image_file(Path::new("photo.png")));
        assert!(is_image_file(Path::new("PHOTO.WEBP")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("photo")));
    }

    #[test]
    fn test_from_bytes_reads_header() {
        let image = OriginalImage::from_bytes(encoded(40, 30, ImageOutputFormat::Png), None).unwrap();
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.mime_type, "image/png");

        let image =
            OriginalImage::from_bytes(encoded(8, 16, ImageOutputFormat::Jpeg(90)), None).unwrap();
        assert_eq!((image.width, image.height), (8, 16));
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = OriginalImage::from_bytes(b"hello world".to_vec(), None);
        assert!(matches!(result, Err(ExpandError::ImageDecode(_))));
    }

    #[test]
    fn test_from_data_uri() {
        let bytes = encoded(3, 2, ImageOutputFormat::Png);
        let uri = data_uri::encode("image/png", &bytes);

        let image = OriginalImage::from_data_uri(&uri).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(&image.bytes[..], &bytes[..]);
    }

    #[test]
    fn test_from_rgba_keeps_pixels() {
        let mut rgba = Vec::new();
        for i in 0..6u8 {
            rgba.extend_from_slice(&[i * 40, 255 - i * 40, 7, if i == 0 { 0 } else { 128 }]);
        }

        let image = OriginalImage::from_rgba(3, 2, rgba.clone(), Some("pasted.png".to_string()))
            .unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.file_name.as_deref(), Some("pasted.png"));

        let decoded = image::load_from_memory(&image.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.into_raw(), rgba);
    }

    #[test]
    fn test_from_rgba_rejects_short_buffer() {
        let result = OriginalImage::from_rgba(4, 4, vec![0; 10], None);
        assert!(matches!(result, Err(ExpandError::ImageDecode(_))));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = std::env::temp_dir().join(format!("image-expander-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("upload.png");
        std::fs::write(&path, encoded(12, 9, ImageOutputFormat::Png)).unwrap();

        let image = load_from_path(&path).await.unwrap();
        assert_eq!((image.width, image.height), (12, 9));
        assert_eq!(image.file_name.as_deref(), Some("upload.png"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_load_rejects_other_extensions() {
        let result = load_from_path(Path::new("/tmp/readme.md")).await;
        assert!(matches!(result, Err(ExpandError::ImageDecode(_))));
    }
}
