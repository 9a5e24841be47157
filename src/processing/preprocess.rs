use crate::config::{PreprocessConfig, MAX_SCALE_FACTOR};
use crate::utils::PassportError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use std::io::Cursor;
use std::path::Path;

/// Binarized page ready for the recognition engine, kept as PNG bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl ProcessedImage {
    pub fn from_png(png: Vec<u8>, width: u32, height: u32) -> Self {
        ProcessedImage { png, width, height }
    }

    pub fn as_png(&self) -> &[u8] {
        &self.png
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn process_image(
        image_path: &Path,
        config: &PreprocessConfig,
    ) -> Result<ProcessedImage, PassportError> {
        let img = image::open(image_path).map_err(|e| {
            PassportError::ImageProcessingError(format!(
                "Failed to open image {}: {}",
                image_path.display(),
                e
            ))
        })?;
        Self::process_dynamic(&img, config)
    }

    pub fn process_dynamic(
        img: &DynamicImage,
        config: &PreprocessConfig,
    ) -> Result<ProcessedImage, PassportError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(PassportError::ImageProcessingError(
                "Image has no pixels".to_string(),
            ));
        }

        let scale = config.scale_factor;
        if scale.is_nan() || scale <= 0.0 || scale > MAX_SCALE_FACTOR {
            return Err(PassportError::ImageProcessingError(format!(
                "Unsupported scale factor {}",
                scale
            )));
        }

        let processed = Self::preprocess(img, config);
        let (width, height) = processed.dimensions();
        log::debug!("Preprocessed image to {}x{}", width, height);

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(processed)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| {
                PassportError::ImageProcessingError(format!(
                    "Failed to encode processed image: {}",
                    e
                ))
            })?;

        Ok(ProcessedImage::from_png(png, width, height))
    }

    fn preprocess(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
        // Upscale before anything else, small glyphs suffer most from thresholding
        let gray = Self::upscale(&img.to_luma8(), config.scale_factor);

        let denoised = if config.blur_sigma > 0.0 {
            gaussian_blur_f32(&gray, config.blur_sigma)
        } else {
            gray
        };

        let enhanced = equalize_histogram(&denoised);
        let binary = Self::adaptive_threshold(&enhanced, config.threshold_radius, config.threshold_bias);

        if config.close_radius > 0 {
            close(&binary, Norm::LInf, config.close_radius)
        } else {
            binary
        }
    }

    fn upscale(gray: &GrayImage, factor: f32) -> GrayImage {
        if (factor - 1.0).abs() < f32::EPSILON {
            return gray.clone();
        }
        let (width, height) = gray.dimensions();
        let new_width = ((width as f32 * factor).round() as u32).max(1);
        let new_height = ((height as f32 * factor).round() as u32).max(1);
        imageops::resize(gray, new_width, new_height, FilterType::CatmullRom)
    }

    /// Local-mean thresholding: a pixel turns black when it is darker than the
    /// mean of its window minus `bias`.
    fn adaptive_threshold(gray: &GrayImage, radius: u32, bias: u8) -> GrayImage {
        let (width, height) = gray.dimensions();
        let w = width as usize;

        // Row prefix sums give each window row sum in O(1)
        let mut row_sums = vec![0u64; (w + 1) * height as usize];
        for y in 0..height as usize {
            let base = y * (w + 1);
            for x in 0..w {
                row_sums[base + x + 1] =
                    row_sums[base + x] + gray.get_pixel(x as u32, y as u32).0[0] as u64;
            }
        }

        ImageBuffer::from_fn(width, height, |x, y| {
            let start_x = x.saturating_sub(radius) as usize;
            let end_x = x.saturating_add(radius).min(width - 1) as usize;
            let start_y = y.saturating_sub(radius) as usize;
            let end_y = y.saturating_add(radius).min(height - 1) as usize;

            let mut sum = 0u64;
            for ny in start_y..=end_y {
                let base = ny * (w + 1);
                sum += row_sums[base + end_x + 1] - row_sums[base + start_x];
            }
            let count = ((end_x - start_x + 1) * (end_y - start_y + 1)) as u64;
            let threshold = (sum / count).saturating_sub(bias as u64);

            let value = gray.get_pixel(x, y).0[0] as u64;
            Luma([if value > threshold { 255u8 } else { 0u8 }])
        })
    }
}
