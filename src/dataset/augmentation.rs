//! Augmentation Pipeline
//!
//! Converts a decoded image into a fixed-size CHW float tensor. Two
//! policies exist:
//!
//! - **Train**: horizontal flip -> rotation -> random crop -> tensor
//!   conversion -> random erasing. Geometric stages run on the image,
//!   erasing runs on the converted tensor; the order is fixed.
//! - **Eval**: tensor conversion only, fully deterministic.
//!
//! All stochastic stages draw from an injected RNG so tests can pin the
//! randomness with a seeded generator.

use image::{imageops::FilterType, DynamicImage, ImageBuffer, Rgb, RgbImage};
use rand::Rng;

use crate::{CROP_SIZE, IMAGE_SIZE};

/// Which transform chain the augmenter applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Train,
    Eval,
}

/// Stochastic-content, deterministic-shape image-to-tensor transform.
#[derive(Debug, Clone)]
pub struct Augmenter {
    policy: Policy,
    /// Resize applied to every decoded image before any other stage
    resize: u32,
    /// Side length of the training random crop
    crop: u32,
    /// Probability of a horizontal flip
    flip_prob: f32,
    /// Rotation drawn uniformly from ±this many degrees
    rotation_degrees: f32,
    /// Probability of random erasing on the converted tensor
    erase_prob: f32,
    /// Erased area as a fraction of the image area
    erase_scale: (f32, f32),
    /// Aspect-ratio range of the erased patch
    erase_aspect: (f32, f32),
}

impl Augmenter {
    /// Training policy: flip(0.5), rotation ±15°, crop to 204, erase.
    pub fn train() -> Self {
        Self {
            policy: Policy::Train,
            resize: IMAGE_SIZE as u32,
            crop: CROP_SIZE as u32,
            flip_prob: 0.5,
            rotation_degrees: 15.0,
            erase_prob: 1.0,
            erase_scale: (0.02, 0.33),
            erase_aspect: (0.3, 3.3),
        }
    }

    /// Evaluation policy: tensor conversion only, full 224x224 image.
    pub fn eval() -> Self {
        Self {
            policy: Policy::Eval,
            resize: IMAGE_SIZE as u32,
            crop: CROP_SIZE as u32,
            flip_prob: 0.0,
            rotation_degrees: 0.0,
            erase_prob: 0.0,
            erase_scale: (0.0, 0.0),
            erase_aspect: (1.0, 1.0),
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Spatial side length of the produced tensor
    pub fn output_size(&self) -> usize {
        match self.policy {
            Policy::Train => self.crop as usize,
            Policy::Eval => self.resize as usize,
        }
    }

    /// Apply the full pipeline, producing a CHW float tensor of shape
    /// `[3, output_size, output_size]` with values scaled to [0, 1].
    pub fn apply<R: Rng>(&self, img: &DynamicImage, rng: &mut R) -> Vec<f32> {
        let resized = img.resize_exact(self.resize, self.resize, FilterType::Triangle);

        match self.policy {
            Policy::Eval => to_chw_tensor(&resized.to_rgb8()),
            Policy::Train => {
                let mut working = resized;

                if rng.gen::<f32>() < self.flip_prob {
                    working = working.fliph();
                }

                let angle = rng.gen_range(-self.rotation_degrees..=self.rotation_degrees);
                working = DynamicImage::ImageRgb8(rotate(&working, angle));

                let working = random_crop(&working, self.crop, rng);

                let mut tensor = to_chw_tensor(&working);
                if rng.gen::<f32>() < self.erase_prob {
                    self.random_erase(&mut tensor, self.crop as usize, rng);
                }
                tensor
            }
        }
    }

    /// Zero out a random rectangular patch across all channels.
    fn random_erase<R: Rng>(&self, tensor: &mut [f32], size: usize, rng: &mut R) {
        let area = (size * size) as f32;
        let (log_r0, log_r1) = (self.erase_aspect.0.ln(), self.erase_aspect.1.ln());

        for _ in 0..10 {
            let target_area = area * rng.gen_range(self.erase_scale.0..=self.erase_scale.1);
            let aspect = rng.gen_range(log_r0..=log_r1).exp();

            let h = (target_area * aspect).sqrt().round() as usize;
            let w = (target_area / aspect).sqrt().round() as usize;
            if h == 0 || w == 0 || h >= size || w >= size {
                continue;
            }

            let top = rng.gen_range(0..=size - h);
            let left = rng.gen_range(0..=size - w);

            for c in 0..3 {
                for y in top..top + h {
                    let row = c * size * size + y * size;
                    tensor[row + left..row + left + w].fill(0.0);
                }
            }
            return;
        }
    }
}

/// Convert an RGB image to a flattened CHW float tensor in [0, 1].
///
/// Division by 255 is the whole normalization step: the pipeline's declared
/// normalization is mean 0, scale 1 (a pass-through).
fn to_chw_tensor(rgb: &RgbImage) -> Vec<f32> {
    let (width, height) = rgb.dimensions();
    let (width, height) = (width as usize, height as usize);
    let mut tensor = vec![0.0f32; 3 * height * width];

    for (i, pixel) in rgb.pixels().enumerate() {
        tensor[i] = pixel[0] as f32 / 255.0;
        tensor[height * width + i] = pixel[1] as f32 / 255.0;
        tensor[2 * height * width + i] = pixel[2] as f32 / 255.0;
    }

    tensor
}

/// Rotate around the image center, bilinear sampling, black fill.
fn rotate(img: &DynamicImage, angle_degrees: f32) -> RgbImage {
    let angle_rad = angle_degrees.to_radians();
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();

    let mut output = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;

            let src_x = cx + dx * cos_a + dy * sin_a;
            let src_y = cy - dx * sin_a + dy * cos_a;

            output.put_pixel(x, y, bilinear_sample(&rgb, src_x, src_y));
        }
    }

    output
}

/// Sample a pixel using bilinear interpolation, black for out-of-bounds.
fn bilinear_sample(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();

    if x < 0.0 || y < 0.0 || x >= width as f32 - 1.0 || y >= height as f32 - 1.0 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut result = [0u8; 3];
    for c in 0..3 {
        let v = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f32 * fx * (1.0 - fy)
            + p01[c] as f32 * (1.0 - fx) * fy
            + p11[c] as f32 * fx * fy;
        result[c] = v.round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}

/// Crop a random `size`-by-`size` window out of the image.
fn random_crop<R: Rng>(img: &DynamicImage, size: u32, rng: &mut R) -> RgbImage {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let max_x = width.saturating_sub(size);
    let max_y = height.saturating_sub(size);
    let left = if max_x > 0 { rng.gen_range(0..=max_x) } else { 0 };
    let top = if max_y > 0 { rng.gen_range(0..=max_y) } else { 0 };

    let mut output = ImageBuffer::new(size, size);
    for y in 0..size {
        for x in 0..size {
            output.put_pixel(x, y, *rgb.get_pixel(left + x, top + y));
        }
    }
    output
}
