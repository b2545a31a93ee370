use crate::session::ImageAttachment;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

const SUPPORTED: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

pub fn mime_from_extension(extension: &str) -> Option<&'static str> {
    let lowered = extension.to_lowercase();
    SUPPORTED
        .iter()
        .find(|(ext, _)| *ext == lowered)
        .map(|(_, mime)| *mime)
}

pub fn extension_for(mime_type: &str) -> &'static str {
    SUPPORTED
        .iter()
        .find(|(_, mime)| *mime == mime_type)
        .map(|(ext, _)| *ext)
        .unwrap_or("png")
}

/// Encodes raw image bytes into the data-URL attachment the chat composer
/// carries until the next send.
pub fn attachment_from_bytes(bytes: &[u8], mime_type: &str, millis: u128) -> ImageAttachment {
    let encoded = STANDARD.encode(bytes);
    ImageAttachment {
        encoded_data: format!("data:{mime_type};base64,{encoded}"),
        mime_type: mime_type.to_string(),
        file_name: format!("studio-image-{millis}.{}", extension_for(mime_type)),
        size_bytes: bytes.len() as u64,
    }
}

pub fn attachment_from_path(path: &Path) -> Result<ImageAttachment> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("{} has no file extension", path.display()))?;
    let mime_type = mime_from_extension(extension)
        .ok_or_else(|| anyhow!("unsupported image type: .{extension}"))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut attachment = attachment_from_bytes(&bytes, mime_type, crate::session::timestamp_millis());
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        attachment.file_name = name.to_string();
    }
    Ok(attachment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bytes_become_a_data_url_attachment() {
        let attachment = attachment_from_bytes(b"abc", "image/png", 42);
        assert_eq!(attachment.encoded_data, "data:image/png;base64,YWJj");
        assert_eq!(attachment.base64_payload(), "YWJj");
        assert_eq!(attachment.file_name, "studio-image-42.png");
        assert_eq!(attachment.size_bytes, 3);
    }

    #[test]
    fn mime_lookup_is_case_insensitive_and_bounded() {
        assert_eq!(mime_from_extension("PNG"), Some("image/png"));
        assert_eq!(mime_from_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(mime_from_extension("exe"), None);
    }

    #[test]
    fn attachment_from_path_keeps_the_original_file_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shot.png");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(b"pixels").expect("write file");

        let attachment = attachment_from_path(&path).expect("attachment");
        assert_eq!(attachment.file_name, "shot.png");
        assert_eq!(attachment.mime_type, "image/png");
    }

    #[test]
    fn attachment_from_path_rejects_unknown_types() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "text").expect("write file");
        assert!(attachment_from_path(&path).is_err());
    }
}
