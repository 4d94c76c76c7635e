//! Raster image processor backed by the `image` crate.

use std::io::Cursor;

use image::{DynamicImage, ImageReader, imageops::FilterType};
use images3_core::{
    application::{ApplicationError, ports::ImageProcessor},
    domain::{ImageContent, ImageDimension, ImageFormat, ImageMetadata, ResizingConfig},
    error::Images3Result,
};
use tracing::{debug, instrument};

/// Detects the format from the leading signature bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(b"BM") {
        Some(ImageFormat::Bmp)
    } else {
        None
    }
}

fn codec(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
    }
}

fn failed(operation: &'static str, reason: impl ToString) -> ApplicationError {
    ApplicationError::Processing {
        operation,
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RasterProcessor {
    filter: FilterType,
}

impl RasterProcessor {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    fn decode(&self, content: &ImageContent, format: ImageFormat) -> Images3Result<DynamicImage> {
        image::load_from_memory_with_format(content.as_bytes(), codec(format))
            .map_err(|e| failed("decode", e).into())
    }

    fn encode(&self, image: DynamicImage, format: ImageFormat) -> Images3Result<ImageContent> {
        // JPEG has no alpha channel.
        let image = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
            _ => image,
        };
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, codec(format))
            .map_err(|e| failed("encode", e))?;
        Ok(ImageContent::from(out.into_inner()))
    }
}

impl Default for RasterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor for RasterProcessor {
    fn is_supported_format(&self, content: &ImageContent) -> bool {
        sniff_format(content.as_bytes()).is_some()
    }

    fn read_metadata(&self, content: &ImageContent) -> Images3Result<ImageMetadata> {
        let format = sniff_format(content.as_bytes())
            .ok_or_else(|| failed("read_metadata", "unrecognised image signature"))?;
        let (width, height) =
            ImageReader::with_format(Cursor::new(content.as_bytes()), codec(format))
                .into_dimensions()
                .map_err(|e| failed("read_metadata", e))?;
        Ok(ImageMetadata::new(
            ImageDimension::new(width, height),
            format,
            content.len() as u64,
        ))
    }

    #[instrument(skip_all, fields(config = %config))]
    fn resize(
        &self,
        metadata: &ImageMetadata,
        content: &ImageContent,
        config: &ResizingConfig,
    ) -> Images3Result<ImageContent> {
        let target = config.to_pixels(metadata.dimension());
        let source = self.decode(content, metadata.format())?;
        let resized = if config.keep_proportions() {
            source.resize(target.width(), target.height(), self.filter)
        } else {
            source.resize_exact(target.width(), target.height(), self.filter)
        };
        debug!(
            width = resized.width(),
            height = resized.height(),
            "Image resized"
        );
        self.encode(resized, metadata.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png(width: u32, height: u32) -> ImageContent {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 10, 10])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        ImageContent::from(out.into_inner())
    }

    #[test]
    fn sniffs_supported_signatures() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xDB]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE1]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(b"\x89PNG\r\n"), Some(ImageFormat::Png));
        assert_eq!(sniff_format(b"BM...."), Some(ImageFormat::Bmp));
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(&[]), None);
    }

    #[test]
    fn reads_dimensions_without_decoding() {
        let metadata = RasterProcessor::new().read_metadata(&png(40, 20)).unwrap();
        assert_eq!(metadata.dimension(), ImageDimension::new(40, 20));
        assert_eq!(metadata.format(), ImageFormat::Png);
    }

    #[test]
    fn exact_resize_ignores_proportions() {
        let processor = RasterProcessor::new();
        let content = png(40, 20);
        let metadata = processor.read_metadata(&content).unwrap();
        let config = ResizingConfig::pixels(10, 10, false).unwrap();

        let resized = processor.resize(&metadata, &content, &config).unwrap();
        let resized_meta = processor.read_metadata(&resized).unwrap();
        assert_eq!(resized_meta.dimension(), ImageDimension::new(10, 10));
    }

    #[test]
    fn proportional_resize_fits_inside_the_box() {
        let processor = RasterProcessor::new();
        let content = png(40, 20);
        let metadata = processor.read_metadata(&content).unwrap();
        let config = ResizingConfig::pixels(10, 10, true).unwrap();

        let resized = processor.resize(&metadata, &content, &config).unwrap();
        let resized_meta = processor.read_metadata(&resized).unwrap();
        assert_eq!(resized_meta.dimension(), ImageDimension::new(10, 5));
    }

    #[test]
    fn truncated_content_is_a_processing_error() {
        let processor = RasterProcessor::new();
        let mut bytes = png(8, 8).as_bytes().to_vec();
        bytes.truncate(12);
        let err = processor
            .read_metadata(&ImageContent::from(bytes))
            .unwrap_err();
        assert!(matches!(
            err,
            images3_core::error::Images3Error::Application(ApplicationError::Processing { .. })
        ));
    }
}
