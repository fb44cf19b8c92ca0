use png::{BitDepth, ColorType, Transformations};

use super::{PixelBuffer, PixelFormat};

// Keeps alpha convention across a round trip; PNG itself only knows straight alpha.
const FORMAT_KEYWORD: &str = "viewsnap-format";

pub fn encode(buffer: &PixelBuffer) -> Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();

    let mut encoder = png::Encoder::new(&mut out, buffer.width(), buffer.height());
    encoder.set_color(color_type(buffer.format()));
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);
    encoder.add_text_chunk(FORMAT_KEYWORD.to_string(), buffer.format().tag().to_string())?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&buffer.packed_data())?;
    writer.finish()?;

    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, String> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("failed to read png info: {}", e))?;

    let mut data = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut data)
        .map_err(|e| format!("failed to read png frame: {}", e))?;
    data.truncate(info.buffer_size());

    if info.bit_depth != BitDepth::Eight {
        return Err(format!("unsupported bit depth {:?}", info.bit_depth));
    }

    let tagged = reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .find(|chunk| chunk.keyword == FORMAT_KEYWORD)
        .and_then(|chunk| PixelFormat::from_tag(&chunk.text));

    let (format, data) = match info.color_type {
        ColorType::Rgba if tagged == Some(PixelFormat::Rgba8Premultiplied) => {
            (PixelFormat::Rgba8Premultiplied, data)
        }
        ColorType::Rgba => (PixelFormat::Rgba8, data),
        ColorType::Rgb => (PixelFormat::Rgb8, data),
        ColorType::Grayscale => (PixelFormat::Gray8, data),
        ColorType::GrayscaleAlpha => {
            let rgba = data
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect();
            (PixelFormat::Rgba8, rgba)
        }
        color_type => return Err(format!("unsupported color type {:?}", color_type)),
    };

    PixelBuffer::new(info.width, info.height, format, data).map_err(|e| e.to_string())
}

fn color_type(format: PixelFormat) -> ColorType {
    match format {
        PixelFormat::Rgba8 | PixelFormat::Rgba8Premultiplied => ColorType::Rgba,
        PixelFormat::Rgb8 => ColorType::Rgb,
        PixelFormat::Gray8 => ColorType::Grayscale,
    }
}
