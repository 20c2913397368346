/// A decoded cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    /// MIME type of the image data (e.g. `image/jpeg`)
    pub mime: String,
    pub data: Vec<u8>,
}

impl Cover {
    pub fn new(mime: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { mime: mime.into(), data: data.into() }
    }

    /// Guess the MIME type from an image file extension.
    pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => return None,
        })
    }
}
