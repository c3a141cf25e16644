//! Reading image files into inline data URIs.

use std::path::Path;

use simplo_core::message::DataUri;
use tracing::debug;

/// Read an image file and encode it as a data URI.
///
/// The MIME type is guessed from the file extension; anything that is not
/// `image/*` is refused.
pub async fn load_image(path: &Path) -> Result<DataUri, Box<dyn std::error::Error>> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(format!(
            "{} is not an image (detected {})",
            path.display(),
            mime.essence_str()
        )
        .into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    if bytes.is_empty() {
        return Err(format!("{} is empty", path.display()).into());
    }

    debug!(
        path = %path.display(),
        mime = mime.essence_str(),
        bytes = bytes.len(),
        "Image loaded"
    );
    Ok(DataUri::from_bytes(mime.essence_str(), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn png_becomes_data_uri() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let uri = load_image(file.path()).await.unwrap();
        assert_eq!(uri.mime_type(), "image/png");
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        assert!(uri.is_image());
    }

    #[tokio::test]
    async fn non_image_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello").unwrap();

        let err = load_image(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("not an image"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = load_image(Path::new("/definitely/not/here.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
