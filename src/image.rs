//! Source and generated images: loading, validation, data URLs, saving.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::UploadError;

/// Image types the collector accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Webp];

    /// `png, jpg, webp`, for upload errors and help text.
    pub fn accepted_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    /// Declared type from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// The user-provided image to transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl SourceImage {
    /// Load an image file. The declared type comes from the extension.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = ImageFormat::from_extension(ext).ok_or_else(|| UploadError::UnsupportedType {
            found: if ext.is_empty() {
                path.display().to_string()
            } else {
                ext.to_string()
            },
        })?;

        let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(UploadError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self { bytes, format })
    }

    /// Wrap bytes already in memory, validating the declared mime type.
    pub fn from_bytes(bytes: Vec<u8>, mime_type: &str) -> Result<Self, UploadError> {
        let format =
            ImageFormat::from_mime_type(mime_type).ok_or_else(|| UploadError::UnsupportedType {
                found: mime_type.to_string(),
            })?;
        if bytes.is_empty() {
            return Err(UploadError::Empty {
                path: PathBuf::from("<memory>"),
            });
        }
        Ok(Self { bytes, format })
    }

    /// Decode a `data:<mime>;base64,...` string.
    pub fn from_data_url(url: &str) -> Result<Self, UploadError> {
        let parsed = DataUrl::parse(url)?;
        Self::from_bytes(parsed.bytes, &parsed.mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Base64 payload without any data URL prefix.
    pub fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        encode_data_url(self.mime_type(), &self.bytes)
    }

    pub fn file_name(&self, label: &str) -> String {
        download_file_name(label, self.format.extension())
    }

    pub fn save_to(&self, dir: &Path, label: &str) -> std::io::Result<PathBuf> {
        write_image(dir, &self.file_name(label), &self.bytes)
    }
}

/// An image produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Mime type defaults to `image/png` when the service omits it.
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| ImageFormat::Png.mime_type().to_string()),
        }
    }

    pub fn to_data_url(&self) -> String {
        encode_data_url(&self.mime_type, &self.bytes)
    }

    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .unwrap_or(ImageFormat::Png)
            .extension()
    }

    pub fn file_name(&self, label: &str) -> String {
        download_file_name(label, self.extension())
    }

    pub fn save_to(&self, dir: &Path, label: &str) -> std::io::Result<PathBuf> {
        write_image(dir, &self.file_name(label), &self.bytes)
    }
}

/// A parsed `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self, UploadError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::InvalidDataUrl("missing 'data:' scheme".to_string()))?;
        let (header, _) = rest
            .split_once(',')
            .ok_or_else(|| UploadError::InvalidDataUrl("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| UploadError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
        if mime_type.is_empty() {
            return Err(UploadError::InvalidDataUrl("missing mime type".to_string()));
        }
        let bytes = BASE64
            .decode(strip_data_url_prefix(rest).trim())
            .map_err(|e| UploadError::InvalidDataUrl(e.to_string()))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

/// Everything after the first `,`, or the input unchanged if there is none.
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((_, payload)) => payload,
        None => encoded,
    }
}

/// `Generated` → `generated_image.png`.
pub fn download_file_name(label: &str, extension: &str) -> String {
    format!("{}_image.{extension}", label.trim().to_lowercase())
}

fn write_image(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("Jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn mime_lookup_accepts_jpg_alias() {
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn data_url_keeps_mime_type() {
        let image = SourceImage::from_bytes(PNG_HEADER.to_vec(), "image/png").unwrap();
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(parsed.bytes, PNG_HEADER);
    }

    #[test]
    fn stripped_payload_matches_base64() {
        let image = SourceImage::from_bytes(vec![1, 2, 3, 4], "image/webp").unwrap();
        let url = image.to_data_url();
        assert_eq!(strip_data_url_prefix(&url), image.base64());
    }

    #[test]
    fn strip_without_prefix_is_identity() {
        assert_eq!(strip_data_url_prefix("AQIDBA=="), "AQIDBA==");
    }

    #[test]
    fn from_data_url_round_trips() {
        let url = encode_data_url("image/jpeg", b"jpegdata");
        let image = SourceImage::from_data_url(&url).unwrap();
        assert_eq!(image.format(), ImageFormat::Jpeg);
        assert_eq!(image.bytes(), b"jpegdata");
    }

    #[test]
    fn data_url_rejects_non_image() {
        let url = encode_data_url("text/plain", b"hello");
        assert!(matches!(
            SourceImage::from_data_url(&url),
            Err(UploadError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(DataUrl::parse("image/png;base64,AAAA").is_err());
        assert!(DataUrl::parse("data:image/png;base64").is_err());
        assert!(DataUrl::parse("data:image/png,AAAA").is_err());
        assert!(DataUrl::parse("data:;base64,AAAA").is_err());
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn from_bytes_rejects_empty() {
        assert!(matches!(
            SourceImage::from_bytes(Vec::new(), "image/png"),
            Err(UploadError::Empty { .. })
        ));
    }

    #[test]
    fn from_path_loads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.PNG");
        std::fs::write(&path, PNG_HEADER).unwrap();

        let image = SourceImage::from_path(&path).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.bytes(), PNG_HEADER);
    }

    #[test]
    fn from_path_rejects_non_image_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        // Not created: the extension check comes first.
        match SourceImage::from_path(&path) {
            Err(UploadError::UnsupportedType { found }) => assert_eq!(found, "txt"),
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_type_lists_every_accepted_format() {
        assert_eq!(ImageFormat::accepted_list(), "png, jpg, webp");
        let err = SourceImage::from_bytes(vec![1], "image/gif").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'image/gif'"));
        for format in ImageFormat::ALL {
            assert!(message.contains(format.extension()), "missing {format}");
        }
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jpg");
        assert!(matches!(
            SourceImage::from_path(&path),
            Err(UploadError::Read { .. })
        ));
    }

    #[test]
    fn from_path_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.webp");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            SourceImage::from_path(&path),
            Err(UploadError::Empty { .. })
        ));
    }

    #[test]
    fn download_names_follow_label() {
        assert_eq!(download_file_name("Generated", "png"), "generated_image.png");
        assert_eq!(download_file_name("Original", "jpg"), "original_image.jpg");
    }

    #[test]
    fn generated_image_defaults_to_png() {
        let image = GeneratedImage::new(vec![1], None);
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.file_name("Generated"), "generated_image.png");

        let blank = GeneratedImage::new(vec![1], Some(" ".to_string()));
        assert_eq!(blank.mime_type, "image/png");
    }

    #[test]
    fn generated_image_uses_reported_type() {
        let image = GeneratedImage::new(vec![1], Some("image/webp".to_string()));
        assert_eq!(image.file_name("Generated"), "generated_image.webp");
        assert!(image.to_data_url().starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let image = GeneratedImage::new(PNG_HEADER.to_vec(), None);

        let path = image.save_to(&out, "Generated").unwrap();
        assert_eq!(path, out.join("generated_image.png"));
        assert_eq!(std::fs::read(&path).unwrap(), PNG_HEADER);
    }

    #[test]
    fn source_save_uses_source_extension() {
        let dir = tempfile::tempdir().unwrap();
        let image = SourceImage::from_bytes(b"jpeg".to_vec(), "image/jpeg").unwrap();
        let path = image.save_to(dir.path(), "Original").unwrap();
        assert!(path.ends_with("original_image.jpg"));
    }
}
