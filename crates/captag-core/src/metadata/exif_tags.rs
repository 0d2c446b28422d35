//! EXIF writer for JPEG output.
//!
//! The caption goes into ImageDescription (270) and the keyword string into
//! XPKeywords (40094) as UTF-16LE bytes. Primary-IFD fields already present
//! in the source are carried over.

use super::EmbeddedMetadata;
use crate::config::MetadataConfig;
use exif::experimental::Writer;
use exif::{Context, Field, In, Reader, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Tags the writer lays out itself and must never be copied from the source.
const STRUCTURAL_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
];

/// Re-encodes an image as JPEG carrying caption and keyword EXIF tags.
#[derive(Debug, Clone)]
pub struct ExifWriter {
    quality: u8,
    description_tag: Tag,
    keywords_tag: Tag,
}

impl ExifWriter {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            quality: config.jpeg_quality,
            description_tag: Tag(Context::Tiff, config.description_tag),
            keywords_tag: Tag(Context::Tiff, config.keywords_tag),
        }
    }

    pub fn encode(&self, source: &[u8], caption: &str, keywords: &str) -> Result<Vec<u8>, String> {
        let image = image::load_from_memory(source).map_err(|e| format!("Decode: {e}"))?;
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, self.quality))
            .map_err(|e| format!("JPEG encode: {e}"))?;

        let tiff = self.build_tiff(source, caption, keywords)?;
        insert_exif_segment(&jpeg, &tiff)
    }

    pub fn read(&self, source: &[u8]) -> Option<EmbeddedMetadata> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(source))
            .ok()?;

        let caption = exif
            .get_field(self.description_tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Ascii(parts) => parts
                    .first()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            });
        let keywords = exif
            .get_field(self.keywords_tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Byte(bytes) | Value::Undefined(bytes, _) => decode_utf16le(bytes),
                _ => None,
            });

        let meta = EmbeddedMetadata { caption, keywords };
        (meta.caption.is_some() || meta.keywords.is_some()).then_some(meta)
    }

    /// Build the TIFF-structured EXIF block, falling back to only the two
    /// new fields if the source's own fields cannot be re-serialized.
    fn build_tiff(&self, source: &[u8], caption: &str, keywords: &str) -> Result<Vec<u8>, String> {
        let description = Field {
            tag: self.description_tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![caption.as_bytes().to_vec()]),
        };
        let keywords = Field {
            tag: self.keywords_tag,
            ifd_num: In::PRIMARY,
            value: Value::Byte(encode_utf16le(keywords)),
        };

        let existing = Reader::new()
            .read_from_container(&mut Cursor::new(source))
            .ok();
        let carried: Vec<&Field> = existing
            .iter()
            .flat_map(|exif| exif.fields())
            .filter(|f| self.is_carried_over(f))
            .collect();

        match write_tiff(&carried, &description, &keywords) {
            Ok(tiff) => Ok(tiff),
            Err(e) if !carried.is_empty() => {
                tracing::warn!("Dropping {} existing EXIF field(s): {e}", carried.len());
                write_tiff(&[], &description, &keywords)
            }
            Err(e) => Err(e),
        }
    }

    fn is_carried_over(&self, field: &Field) -> bool {
        field.ifd_num == In::PRIMARY
            && field.tag != self.description_tag
            && field.tag != self.keywords_tag
            && !STRUCTURAL_TAGS.contains(&field.tag)
            && !matches!(field.value, Value::Unknown(..))
    }
}

fn write_tiff(carried: &[&Field], description: &Field, keywords: &Field) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new();
    for field in carried {
        writer.push_field(field);
    }
    writer.push_field(description);
    writer.push_field(keywords);

    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, true)
        .map_err(|e| format!("EXIF write: {e}"))?;
    Ok(buf.into_inner())
}

/// UTF-16LE with a trailing NUL code unit, as Windows writes XP* tags.
fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn decode_utf16le(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).ok()?;
    Some(text.trim_end_matches('\0').to_string())
}

/// Insert an APP1 EXIF segment after SOI (and after a leading JFIF APP0).
fn insert_exif_segment(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, String> {
    if jpeg.len() < 4 || jpeg[..2] != SOI {
        return Err("Encoded JPEG is missing SOI marker".to_string());
    }

    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();
    let segment_len = u16::try_from(segment_len)
        .map_err(|_| format!("EXIF block too large ({segment_len} bytes)"))?;

    let mut insert_at = SOI.len();
    if jpeg[2] == 0xFF && jpeg[3] == APP0 && jpeg.len() >= 6 {
        let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        insert_at += 2 + app0_len;
        if insert_at > jpeg.len() {
            return Err("Encoded JPEG has a truncated APP0 segment".to_string());
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + segment_len as usize + 2);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, APP1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_images::jpeg_bytes;

    fn writer() -> ExifWriter {
        ExifWriter::new(&MetadataConfig::default())
    }

    #[test]
    fn test_utf16le_round_trip() {
        let encoded = encode_utf16le("red;car;");
        assert_eq!(&encoded[..4], &[b'r', 0, b'e', 0]);
        assert_eq!(&encoded[encoded.len() - 2..], &[0, 0]);
        assert_eq!(decode_utf16le(&encoded).as_deref(), Some("red;car;"));
    }

    #[test]
    fn test_keywords_stored_as_utf16le_bytes() {
        let encoded = writer()
            .encode(&jpeg_bytes(16, 16), "a red car", "red;car;")
            .unwrap();
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(&encoded))
            .unwrap();

        let field = exif
            .get_field(Tag(Context::Tiff, 40094), In::PRIMARY)
            .unwrap();
        match &field.value {
            Value::Byte(bytes) => assert_eq!(bytes, &encode_utf16le("red;car;")),
            other => panic!("Expected BYTE value, got {other:?}"),
        }
        let description = exif
            .get_field(Tag::ImageDescription, In::PRIMARY)
            .unwrap();
        assert!(matches!(&description.value, Value::Ascii(v) if v[0] == b"a red car"));
    }

    #[test]
    fn test_existing_fields_carried_over() {
        let artist = Field {
            tag: Tag::Artist,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"Ada".to_vec()]),
        };
        let tiff = write_tiff(
            &[&artist],
            &Field {
                tag: Tag::ImageDescription,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![b"first caption".to_vec()]),
            },
            &Field {
                tag: Tag(Context::Tiff, 40094),
                ifd_num: In::PRIMARY,
                value: Value::Byte(encode_utf16le("one;")),
            },
        )
        .unwrap();
        let plain = jpeg_bytes(16, 16);
        let with_artist = insert_exif_segment(&plain, &tiff).unwrap();
        assert_eq!(
            writer().read(&with_artist).unwrap().caption.as_deref(),
            Some("first caption")
        );

        let second = writer()
            .encode(&with_artist, "second caption", "two;")
            .unwrap();
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(&second))
            .unwrap();
        assert!(exif.get_field(Tag::Artist, In::PRIMARY).is_some());

        let meta = writer().read(&second).unwrap();
        assert_eq!(meta.caption.as_deref(), Some("second caption"));
        assert_eq!(meta.keywords.as_deref(), Some("two;"));
    }

    #[test]
    fn test_insert_after_app0() {
        let jpeg = jpeg_bytes(8, 8);
        let out = insert_exif_segment(&jpeg, b"II*\0").unwrap();
        assert_eq!(&out[..2], &SOI);
        let app1_pos = out
            .windows(2)
            .position(|w| w == [0xFF, APP1])
            .unwrap();
        if jpeg[3] == APP0 {
            let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
            assert_eq!(app1_pos, 2 + 2 + app0_len);
        } else {
            assert_eq!(app1_pos, 2);
        }
        assert_eq!(&out[app1_pos + 4..app1_pos + 10], EXIF_HEADER);
    }

    #[test]
    fn test_insert_rejects_non_jpeg() {
        assert!(insert_exif_segment(b"\x89PNG\r\n", b"II*\0").is_err());
    }

    #[test]
    fn test_non_jpeg_source_converted() {
        let png = crate::metadata::test_images::png_rgba_bytes(6, 6);
        let encoded = writer().encode(&png, "converted", "a;").unwrap();
        assert_eq!(&encoded[..2], &SOI);
        assert_eq!(
            writer().read(&encoded).unwrap().caption.as_deref(),
            Some("converted")
        );
    }
}
