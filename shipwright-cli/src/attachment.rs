//! Local files as data-URI attachments

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use shipwright_core::dto::task::AttachmentPayload;
use std::path::Path;

/// Reads `path` and encodes it as a named data-URI attachment
pub fn from_path(path: &Path) -> Result<AttachmentPayload> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' has no usable file name", path.display()))?
        .to_string();

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;

    Ok(AttachmentPayload {
        url: Some(data_uri(guess_mime(&name), &bytes)),
        name,
    })
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// MIME type by file extension
pub fn guess_mime(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("sales.CSV"), "text/csv");
        assert_eq!(guess_mime("logo.png"), "image/png");
        assert_eq!(guess_mime("archive.tar.gz"), "application/octet-stream");
        assert_eq!(guess_mime("Makefile"), "application/octet-stream");
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!("shipwright-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let attachment = from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(attachment.name.ends_with(".csv"));
        assert_eq!(
            attachment.url.as_deref(),
            Some("data:text/csv;base64,YSxiCjEsMgo=")
        );
    }

    #[test]
    fn test_missing_file() {
        let err = from_path(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
