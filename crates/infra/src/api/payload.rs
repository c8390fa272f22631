use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::api::client::ApiError;
use liner_core::types::ImageBlob;

pub fn decode_image_payload(filename: &str, body: &str) -> Result<ImageBlob, ApiError> {
    let trimmed = body.trim().trim_matches('"');
    let (mime, encoded) = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| ApiError::InvalidPayload("data url without comma".to_string()))?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| ApiError::InvalidPayload("data url is not base64".to_string()))?;
            (mime.to_string(), data)
        }
        None => (mime_from_filename(filename).to_string(), trimmed),
    };
    if encoded.is_empty() {
        return Err(ApiError::InvalidPayload(format!("empty image for {filename}")));
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|err| ApiError::InvalidPayload(format!("{filename}: {err}")))?;
    Ok(ImageBlob { mime, bytes })
}

fn mime_from_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_base64_with_extension_mime() {
        let blob = decode_image_payload("me.JPG", "aGVsbG8=").unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(blob.bytes, b"hello");
    }

    #[test]
    fn decodes_data_url() {
        let blob = decode_image_payload("me", "\"data:image/webp;base64,aGk=\"").unwrap();
        assert_eq!(blob.mime, "image/webp");
        assert_eq!(blob.bytes, b"hi");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_image_payload("me.png", "").is_err());
        assert!(decode_image_payload("me.png", "not base64!").is_err());
        assert!(decode_image_payload("me.png", "data:image/png,raw").is_err());
    }
}
