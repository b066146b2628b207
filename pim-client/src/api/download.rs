//! Bulk asset download payload

use crate::error::{ClientError, ClientResult};
use percent_encoding::percent_decode_str;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name used when the server sends no usable `Content-Disposition`
pub const FALLBACK_FILE_NAME: &str = "assets.zip";

/// Downloaded archive held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Sanitized file name (no directory components)
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(file_name: impl AsRef<str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: sanitize_file_name(file_name.as_ref()),
            content_type: None,
            bytes,
        }
    }

    /// Build from response headers; the name comes from `Content-Disposition`
    pub fn from_response_parts(
        content_disposition: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        let name = content_disposition
            .and_then(parse_content_disposition)
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        Self {
            file_name: sanitize_file_name(&name),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write into `dir` under `file_name`
    ///
    /// The bytes go to a temp file in the same directory which is then
    /// renamed into place; a failed write leaves nothing behind.
    pub fn save_into(&self, dir: &Path) -> ClientResult<PathBuf> {
        let target = dir.join(&self.file_name);
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&self.bytes)?;
        temp.flush()?;
        temp.persist(&target).map_err(|e| ClientError::Io(e.error))?;
        tracing::info!(path = %target.display(), bytes = self.bytes.len(), "Download saved");
        Ok(target)
    }
}

/// File name from a `Content-Disposition` header value
///
/// `filename*` (RFC 5987, percent-encoded) wins over plain `filename`.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in header.split(';').skip(1) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'encoded-value
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
                let decoded = percent_decode_str(unquote(encoded))
                    .decode_utf8_lossy()
                    .to_string();
                if !decoded.trim().is_empty() {
                    extended = Some(decoded);
                }
            }
            "filename" => {
                let name = unquote(value);
                if !name.trim().is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    extended.or(plain)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Strip directory components and control characters
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_filename() {
        assert_eq!(
            parse_content_disposition("attachment; filename=\"product-17-assets.zip\""),
            Some("product-17-assets.zip".into())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=assets.zip"),
            Some("assets.zip".into())
        );
    }

    #[test]
    fn test_extended_filename_wins() {
        let header = "attachment; filename=\"fallback.zip\"; filename*=UTF-8''caf%C3%A9%20assets.zip";
        assert_eq!(
            parse_content_disposition(header),
            Some("café assets.zip".into())
        );
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition("attachment; filename=\"\""), None);
        let download = Download::from_response_parts(Some("inline"), None, vec![1]);
        assert_eq!(download.file_name, FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\a.zip"), "a.zip");
        assert_eq!(sanitize_file_name(".."), FALLBACK_FILE_NAME);
        assert_eq!(sanitize_file_name("a\u{0}b.zip"), "ab.zip");
    }

    #[test]
    fn test_save_into_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let download = Download::new("assets.zip", b"PK\x03\x04".to_vec());

        let path = download.save_into(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("assets.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_dir_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let download = Download::new("assets.zip", vec![1, 2, 3]);

        assert!(matches!(
            download.save_into(&missing),
            Err(ClientError::Io(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
