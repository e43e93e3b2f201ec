//! # Metadata Module
//!
//! Works out when a media file was captured.
//!
//! ## Sources, in order
//! 1. EXIF `DateTimeOriginal` (images only)
//! 2. EXIF `DateTime` (images only)
//! 3. Filesystem modification time
//!
//! Movies always use the modification time. EXIF stores wall-clock time
//! with no zone, and it is taken as UTC so the same file produces the same
//! timestamp on every machine.

use crate::core::scanner::MediaType;
use crate::error::FingerprintError;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Where a capture time came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    Exif,
    Modified,
}

/// A capture timestamp, normalized to UTC with whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTime {
    pub at: DateTime<Utc>,
    pub source: TimeSource,
}

/// Determine the capture time of a file.
///
/// Fails only if the filesystem modification time is needed and can't be read.
pub fn capture_time(path: &Path, media_type: MediaType) -> Result<CaptureTime, FingerprintError> {
    if media_type.is_image() {
        if let Some(at) = exif_datetime(path) {
            return Ok(CaptureTime {
                at,
                source: TimeSource::Exif,
            });
        }
    }

    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| FingerprintError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    let at: DateTime<Utc> = modified.into();

    Ok(CaptureTime {
        at: at.trunc_subsecs(0),
        source: TimeSource::Modified,
    })
}

/// Read the EXIF capture date, if the file has a usable one
pub fn exif_datetime(path: &Path) -> Option<DateTime<Utc>> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif_reader.get_field(tag, In::PRIMARY))
        .find_map(|field| get_string_value(&field.value).and_then(|s| parse_exif_datetime(&s)))
}

/// Parse the EXIF "YYYY:MM:DD HH:MM:SS" format as UTC
fn parse_exif_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::TempDir;

    /// A JPEG whose APP1 segment carries a single IFD0 `DateTime` entry
    pub(crate) fn jpeg_with_exif_datetime(datetime: &str, payload: &[u8]) -> Vec<u8> {
        let mut ascii = datetime.as_bytes().to_vec();
        ascii.push(0);

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II*\0");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0132u16.to_le_bytes()); // DateTime
        tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        tiff.extend_from_slice(&(ascii.len() as u32).to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff.extend_from_slice(&ascii);

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(payload);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[test]
    fn parses_exif_format() {
        let dt = parse_exif_datetime("2023:05:01 10:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn rejects_zeroed_exif_dates() {
        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("").is_none());
    }

    #[test]
    fn image_uses_exif_date() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "IMG_0001.JPG", &jpeg_with_exif_datetime("2023:05:01 10:00:00", b"x"));

        let capture = capture_time(&path, MediaType::Jpg).unwrap();

        assert_eq!(capture.source, TimeSource::Exif);
        assert_eq!(capture.at, Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn image_without_exif_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "plain.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0xFF, 0xD9]);

        let capture = capture_time(&path, MediaType::Jpg).unwrap();

        assert_eq!(capture.source, TimeSource::Modified);
        assert_eq!(capture.at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn movie_ignores_exif() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "clip.mov", &jpeg_with_exif_datetime("2001:01:01 00:00:00", b""));

        let capture = capture_time(&path, MediaType::Mov).unwrap();

        assert_eq!(capture.source, TimeSource::Modified);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = capture_time(Path::new("/nonexistent/file.mov"), MediaType::Mov);
        assert!(matches!(result, Err(FingerprintError::Read { .. })));
    }
}
