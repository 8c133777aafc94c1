//! Checks an upload has to pass before any network call is made.

use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const MAX_UPLOAD_MB: u64 = 5;
pub const MAX_UPLOAD_BYTES: u64 = MAX_UPLOAD_MB * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejected {
    #[error("Please select an image to upload.")]
    NoFile,
    #[error("Please upload a valid image file (jpg, jpeg, png).")]
    UnsupportedExtension(String),
    #[error("Please upload an image smaller than 5 MB.")]
    TooLarge(u64),
}

/// Extension (case-insensitive) must be one of `ALLOWED_EXTENSIONS` and the
/// size at most `MAX_UPLOAD_BYTES`.
pub fn validate_upload(file_name: &str, size: u64) -> Result<(), UploadRejected> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadRejected::UnsupportedExtension(extension));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejected::TooLarge(size));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_in_any_case() {
        for name in ["a.jpg", "b.JPEG", "c.Png", "holiday.photo.jpeg"] {
            assert_eq!(validate_upload(name, 1024), Ok(()), "{name}");
        }
    }

    #[test]
    fn rejects_other_types() {
        for name in ["a.gif", "b.webp", "png", "noext", "archive.png.zip", ""] {
            assert!(
                matches!(
                    validate_upload(name, 10),
                    Err(UploadRejected::UnsupportedExtension(_))
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert_eq!(validate_upload("a.png", MAX_UPLOAD_BYTES), Ok(()));
        assert_eq!(
            validate_upload("a.png", MAX_UPLOAD_BYTES + 1),
            Err(UploadRejected::TooLarge(MAX_UPLOAD_BYTES + 1))
        );
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            UploadRejected::TooLarge(0).to_string(),
            "Please upload an image smaller than 5 MB."
        );
        assert_eq!(
            UploadRejected::NoFile.to_string(),
            "Please select an image to upload."
        );
    }
}
