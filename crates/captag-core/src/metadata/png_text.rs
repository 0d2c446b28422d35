//! PNG text chunk writer.

use super::{EmbeddedMetadata, DESCRIPTION_KEY, KEYWORDS_KEY};
use std::borrow::Cow;
use std::io::Cursor;

/// Stores the caption and keywords in PNG text chunks.
///
/// Pixels are decoded and re-encoded at their source bit depth; palette
/// images are expanded to RGB(A). Other text chunks, the ICC profile and the
/// pHYs, gAMA, cHRM and sRGB chunks are carried over.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngTextWriter;

/// Decoded PNG: raw scanlines, colour and density chunks, and every text
/// chunk in the file (before or after IDAT).
struct DecodedPng {
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    data: Vec<u8>,
    color: ColorChunks,
    texts: Vec<(String, String)>,
}

/// Ancillary chunks that change how the pixels are rendered or sized.
#[derive(Debug, Clone, Default)]
struct ColorChunks {
    icc_profile: Option<Vec<u8>>,
    pixel_dims: Option<png::PixelDimensions>,
    source_gamma: Option<png::ScaledFloat>,
    source_chromaticities: Option<png::SourceChromaticities>,
    srgb: Option<png::SrgbRenderingIntent>,
}

impl ColorChunks {
    fn from_info(info: &png::Info<'_>) -> Self {
        Self {
            icc_profile: info.icc_profile.as_ref().map(|p| p.to_vec()),
            pixel_dims: info.pixel_dims,
            source_gamma: info.source_gamma,
            source_chromaticities: info.source_chromaticities,
            srgb: info.srgb,
        }
    }

    /// Header info for the re-encode carrying these chunks.
    fn header(&self, decoded: &DecodedPng) -> png::Info<'static> {
        let mut info = png::Info::with_size(decoded.width, decoded.height);
        info.color_type = decoded.color_type;
        info.bit_depth = decoded.bit_depth;
        info.pixel_dims = self.pixel_dims;
        info.source_gamma = self.source_gamma;
        info.source_chromaticities = self.source_chromaticities;
        info.srgb = self.srgb;
        info.icc_profile = self.icc_profile.clone().map(Cow::Owned);
        info
    }
}

impl PngTextWriter {
    pub fn encode(&self, source: &[u8], caption: &str, keywords: &str) -> Result<Vec<u8>, String> {
        let decoded = decode(source)?;

        let mut out = Vec::with_capacity(source.len() + caption.len() + keywords.len() + 64);
        {
            let mut encoder =
                png::Encoder::with_info(&mut out, decoded.color.header(&decoded))
                    .map_err(|e| format!("PNG header: {e}"))?;

            for (keyword, text) in decoded
                .texts
                .iter()
                .filter(|(k, _)| k != DESCRIPTION_KEY && k != KEYWORDS_KEY)
            {
                add_text(&mut encoder, keyword, text)?;
            }
            add_text(&mut encoder, DESCRIPTION_KEY, caption)?;
            add_text(&mut encoder, KEYWORDS_KEY, keywords)?;

            let mut writer = encoder
                .write_header()
                .map_err(|e| format!("PNG header: {e}"))?;
            writer
                .write_image_data(&decoded.data)
                .map_err(|e| format!("PNG data: {e}"))?;
            writer.finish().map_err(|e| format!("PNG finish: {e}"))?;
        }
        Ok(out)
    }

    pub fn read(&self, source: &[u8]) -> Option<EmbeddedMetadata> {
        let texts = decode(source).ok()?.texts;
        let lookup = |key: &str| {
            texts
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, text)| text.clone())
        };
        let meta = EmbeddedMetadata {
            caption: lookup(DESCRIPTION_KEY),
            keywords: lookup(KEYWORDS_KEY),
        };
        (meta.caption.is_some() || meta.keywords.is_some()).then_some(meta)
    }
}

/// tEXt when the value is Latin-1, iTXt (UTF-8) otherwise.
fn add_text<W: std::io::Write>(
    encoder: &mut png::Encoder<'_, W>,
    keyword: &str,
    text: &str,
) -> Result<(), String> {
    let result = if text.chars().all(|c| (c as u32) < 0x100) {
        encoder.add_text_chunk(keyword.to_string(), text.to_string())
    } else {
        encoder.add_itxt_chunk(keyword.to_string(), text.to_string())
    };
    result.map_err(|e| format!("PNG text chunk {keyword}: {e}"))
}

fn decode(source: &[u8]) -> Result<DecodedPng, String> {
    let mut decoder = png::Decoder::new(Cursor::new(source));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("PNG decode: {e}"))?;

    let mut data = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut data)
        .map_err(|e| format!("PNG decode: {e}"))?;
    data.truncate(frame.buffer_size());

    // Text chunks after IDAT are only parsed once the rest of the stream is read.
    if let Err(e) = reader.finish() {
        tracing::debug!("Ignoring trailing PNG chunks: {e}");
    }

    let info = reader.info();
    let mut texts: Vec<(String, String)> = info
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect();
    for chunk in &info.compressed_latin1_text {
        if let Ok(text) = chunk.get_text() {
            texts.push((chunk.keyword.clone(), text));
        }
    }
    for chunk in &info.utf8_text {
        if let Ok(text) = chunk.get_text() {
            texts.push((chunk.keyword.clone(), text));
        }
    }

    Ok(DecodedPng {
        width: frame.width,
        height: frame.height,
        color_type: frame.color_type,
        bit_depth: frame.bit_depth,
        data,
        color: ColorChunks::from_info(info),
        texts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_images::png_rgba_bytes;

    fn png_with_text(keyword: &str, text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 2, 2);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Sixteen);
            encoder
                .add_text_chunk(keyword.to_string(), text.to_string())
                .unwrap();
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&[0x12, 0x34, 0xAB, 0xCD, 0x00, 0x01, 0xFF, 0xFF])
                .unwrap();
            writer.finish().unwrap();
        }
        out
    }

    #[test]
    fn test_encode_preserves_pixels() {
        let source = png_rgba_bytes(5, 4);
        let encoded = PngTextWriter.encode(&source, "cap", "a;b;").unwrap();

        let before = image::load_from_memory(&source).unwrap().to_rgba8();
        let after = image::load_from_memory(&encoded).unwrap().to_rgba8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_sixteen_bit_preserved_and_other_text_kept() {
        let source = png_with_text("Author", "Ada");
        let encoded = PngTextWriter.encode(&source, "grey tiles", "grey;tile;").unwrap();

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.bit_depth, png::BitDepth::Sixteen);
        assert_eq!(decoded.color_type, png::ColorType::Grayscale);
        assert_eq!(
            decoded.data,
            vec![0x12, 0x34, 0xAB, 0xCD, 0x00, 0x01, 0xFF, 0xFF]
        );
        assert!(decoded
            .texts
            .contains(&("Author".to_string(), "Ada".to_string())));
    }

    #[test]
    fn test_existing_description_replaced_not_duplicated() {
        let source = png_with_text(DESCRIPTION_KEY, "old caption");
        let encoded = PngTextWriter.encode(&source, "new caption", "x;").unwrap();

        let decoded = decode(&encoded).unwrap();
        let descriptions: Vec<_> = decoded
            .texts
            .iter()
            .filter(|(k, _)| k == DESCRIPTION_KEY)
            .collect();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].1, "new caption");
    }

    #[test]
    fn test_non_latin1_caption_round_trips() {
        let source = png_rgba_bytes(2, 2);
        let encoded = PngTextWriter
            .encode(&source, "富士山 at dawn", "mountain;")
            .unwrap();

        let meta = PngTextWriter.read(&encoded).unwrap();
        assert_eq!(meta.caption.as_deref(), Some("富士山 at dawn"));
        assert_eq!(meta.keywords.as_deref(), Some("mountain;"));
    }

    #[test]
    fn test_icc_profile_and_pixel_density_survive() {
        let icc: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let mut info = png::Info::with_size(2, 1);
        info.color_type = png::ColorType::Rgb;
        info.bit_depth = png::BitDepth::Eight;
        info.icc_profile = Some(icc.clone().into());
        info.source_gamma = Some(png::ScaledFloat::from_scaled(45455));
        info.pixel_dims = Some(png::PixelDimensions {
            xppu: 11811,
            yppu: 11811,
            unit: png::Unit::Meter,
        });

        let mut source = Vec::new();
        {
            let encoder = png::Encoder::with_info(&mut source, info).unwrap();
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[255, 0, 0, 0, 0, 255]).unwrap();
            writer.finish().unwrap();
        }

        let encoded = PngTextWriter.encode(&source, "two pixels", "red;blue;").unwrap();
        let decoded = decode(&encoded).unwrap();

        assert_eq!(decoded.color.icc_profile.as_deref(), Some(icc.as_slice()));
        assert_eq!(
            decoded.color.source_gamma,
            Some(png::ScaledFloat::from_scaled(45455))
        );
        let dims = decoded.color.pixel_dims.unwrap();
        assert_eq!((dims.xppu, dims.yppu), (11811, 11811));
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(decoded.data, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_srgb_intent_survives() {
        let mut source = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut source, 1, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_srgb(png::SrgbRenderingIntent::Perceptual);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0x80]).unwrap();
            writer.finish().unwrap();
        }

        let encoded = PngTextWriter.encode(&source, "grey", "grey;").unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(
            decoded.color.srgb,
            Some(png::SrgbRenderingIntent::Perceptual)
        );
    }

    #[test]
    fn test_description_after_image_data_is_read_and_replaced() {
        let mut source = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut source, 1, 1);
            encoder.set_color(png::ColorType::Grayscale);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0x40]).unwrap();
            writer
                .write_chunk(png::chunk::tEXt, b"Description\0old caption")
                .unwrap();
            writer
                .write_chunk(png::chunk::tEXt, b"Keywords\0old;tags;")
                .unwrap();
            writer.finish().unwrap();
        }

        let meta = PngTextWriter.read(&source).unwrap();
        assert_eq!(meta.caption.as_deref(), Some("old caption"));
        assert_eq!(meta.keywords.as_deref(), Some("old;tags;"));

        let encoded = PngTextWriter.encode(&source, "new caption", "new;").unwrap();
        let decoded = decode(&encoded).unwrap();
        let descriptions: Vec<_> = decoded
            .texts
            .iter()
            .filter(|(k, _)| k == DESCRIPTION_KEY)
            .collect();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].1, "new caption");
    }

    #[test]
    fn test_read_without_fields_is_none() {
        assert!(PngTextWriter.read(&png_rgba_bytes(2, 2)).is_none());
    }
}
