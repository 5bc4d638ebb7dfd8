//! 推論用の前処理
//!
//! 目標サイズへのリサイズ（バイリニア）→ [0, 1] スケーリング →
//! チャンネルごとの `(x - mean) / std` → NCHW (1, 3, H, W)。

use super::EncoderConfig;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

pub fn preprocess(rgb: &RgbImage, config: &EncoderConfig) -> Array4<f32> {
    let resized;
    let pixels = if rgb.dimensions() == (config.width, config.height) {
        rgb
    } else {
        resized = imageops::resize(rgb, config.width, config.height, FilterType::Triangle);
        &resized
    };

    let mut array = Array4::<f32>::zeros((1, 3, config.height as usize, config.width as usize));
    for (x, y, pixel) in pixels.enumerate_pixels() {
        for c in 0..3 {
            let value = f32::from(pixel[c]) / 255.0;
            array[[0, c, y as usize, x as usize]] = (value - config.mean[c]) / config.std[c];
        }
    }

    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_shape() {
        let rgb = RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]));
        let config = EncoderConfig::default();

        let array = preprocess(&rgb, &config);
        assert_eq!(array.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_non_square_target() {
        let rgb = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        let config = EncoderConfig {
            width: 32,
            height: 16,
            ..EncoderConfig::default()
        };

        let array = preprocess(&rgb, &config);
        assert_eq!(array.shape(), &[1, 3, 16, 32]);
    }

    #[test]
    fn test_normalization_per_channel() {
        let rgb = RgbImage::from_pixel(8, 8, Rgb([255, 0, 128]));
        let config = EncoderConfig {
            width: 4,
            height: 4,
            ..EncoderConfig::default()
        };

        // リサイズ後の丸め誤差は1階調まで許容
        let tolerance = 1.0 / 255.0 / 0.224 + 1e-4;
        let array = preprocess(&rgb, &config);
        let red = (1.0 - 0.485) / 0.229;
        let green = (0.0 - 0.456) / 0.224;
        let blue = (128.0 / 255.0 - 0.406) / 0.225;

        assert!((array[[0, 0, 2, 1]] - red).abs() < tolerance);
        assert!((array[[0, 1, 0, 3]] - green).abs() < tolerance);
        assert!((array[[0, 2, 3, 0]] - blue).abs() < tolerance);
    }

    #[test]
    fn test_identity_normalization() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([51, 102, 204]));
        let config = EncoderConfig {
            width: 2,
            height: 2,
            mean: [0.0; 3],
            std: [1.0; 3],
            ..EncoderConfig::default()
        };

        let array = preprocess(&rgb, &config);
        assert!((array[[0, 0, 0, 0]] - 0.2).abs() < 1e-6);
        assert!((array[[0, 1, 1, 1]] - 0.4).abs() < 1e-6);
        assert!((array[[0, 2, 1, 0]] - 0.8).abs() < 1e-6);
    }
}
