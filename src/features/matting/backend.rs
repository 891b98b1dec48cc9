use std::collections::VecDeque;

use image::{DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

/// 抠图后端错误类型
#[derive(Error, Debug)]
pub enum MattingError {
    /// 输入图像宽或高为 0
    #[error("image has zero width or height")]
    EmptyImage,

    /// 后端内部失败
    #[error("matting backend failure: {0}")]
    Backend(String),
}

/// 分割后端 trait
///
/// 输入一张已解码图像，输出同尺寸、背景像素 alpha 置 0 的 RGBA 图像。
/// 后端被视为不透明的可替换协作方：模型、权重与算法不在本服务关心范围内。
/// 调用是同步且 CPU 密集的，由调用方负责移出 tokio worker。
pub trait MattingBackend: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;

    /// 移除背景，保证输出尺寸与输入一致
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, MattingError>;
}

/// 默认内置后端：经典的边界泛洪抠图
///
/// 从图像四边估计背景颜色，再从边界像素向内泛洪标记颜色相近的区域，
/// 将其 alpha 置 0。确定性、无模型权重依赖，适合作为可替换后端的缺省实现。
pub struct BorderFloodMatting {
    tolerance: f32,
}

impl BorderFloodMatting {
    /// `tolerance` 为逐通道（0-255 量纲）的颜色相似度容差
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }
}

impl Default for BorderFloodMatting {
    fn default() -> Self {
        Self::new(40.0)
    }
}

impl MattingBackend for BorderFloodMatting {
    fn name(&self) -> &'static str {
        "border-flood"
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, MattingError> {
        let mut rgba = image.to_rgba8();
        let (w, h) = rgba.dimensions();
        if w == 0 || h == 0 {
            return Err(MattingError::EmptyImage);
        }

        let background = estimate_background_color(&rgba);
        // 三通道平方距离预算
        let tolerance_sq = self.tolerance * self.tolerance * 3.0;

        let mut is_background = vec![false; (w as usize) * (h as usize)];
        let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

        let seed = |x: u32, y: u32, marks: &mut Vec<bool>, queue: &mut VecDeque<(u32, u32)>| {
            let idx = (y as usize) * (w as usize) + x as usize;
            if !marks[idx] && color_dist_sq(rgba.get_pixel(x, y), background) <= tolerance_sq {
                marks[idx] = true;
                queue.push_back((x, y));
            }
        };

        for x in 0..w {
            seed(x, 0, &mut is_background, &mut queue);
            seed(x, h - 1, &mut is_background, &mut queue);
        }
        for y in 0..h {
            seed(0, y, &mut is_background, &mut queue);
            seed(w - 1, y, &mut is_background, &mut queue);
        }

        while let Some((x, y)) = queue.pop_front() {
            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= w || ny >= h {
                    continue;
                }
                let idx = (ny as usize) * (w as usize) + nx as usize;
                if !is_background[idx]
                    && color_dist_sq(rgba.get_pixel(nx, ny), background) <= tolerance_sq
                {
                    is_background[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        for (idx, pixel) in rgba.pixels_mut().enumerate() {
            if is_background[idx] {
                pixel.0[3] = 0;
            }
        }

        Ok(rgba)
    }
}

/// 从图像四边像素估计背景颜色（RGB 均值）
fn estimate_background_color(img: &RgbaImage) -> [f32; 3] {
    let (w, h) = img.dimensions();
    let mut sum = [0.0f64; 3];
    let mut count = 0u64;

    let mut accumulate = |x: u32, y: u32| {
        let p = img.get_pixel(x, y);
        sum[0] += f64::from(p.0[0]);
        sum[1] += f64::from(p.0[1]);
        sum[2] += f64::from(p.0[2]);
        count += 1;
    };

    for x in 0..w {
        accumulate(x, 0);
        if h > 1 {
            accumulate(x, h - 1);
        }
    }
    for y in 1..h.saturating_sub(1) {
        accumulate(0, y);
        if w > 1 {
            accumulate(w - 1, y);
        }
    }

    let n = count.max(1) as f64;
    [
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ]
}

fn color_dist_sq(pixel: &Rgba<u8>, background: [f32; 3]) -> f32 {
    let dr = f32::from(pixel.0[0]) - background[0];
    let dg = f32::from(pixel.0[1]) - background[1];
    let db = f32::from(pixel.0[2]) - background[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::{BorderFloodMatting, MattingBackend, MattingError};
    use image::{DynamicImage, Rgba, RgbaImage};

    /// 白色背景上放一块红色方块
    fn white_with_red_square(size: u32) -> DynamicImage {
        let mut img = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
        let quarter = size / 4;
        for y in quarter..(size - quarter) {
            for x in quarter..(size - quarter) {
                img.put_pixel(x, y, Rgba([200, 30, 30, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn border_flood_clears_background_and_keeps_subject() {
        let input = white_with_red_square(16);
        let output = BorderFloodMatting::default()
            .remove_background(&input)
            .expect("matting");

        assert_eq!(output.dimensions(), (16, 16));
        // 角落属于背景，应被置为透明
        assert_eq!(output.get_pixel(0, 0).0[3], 0);
        assert_eq!(output.get_pixel(15, 15).0[3], 0);
        // 中心的主体保持不透明
        assert_eq!(output.get_pixel(8, 8).0[3], 255);
        assert_eq!(output.get_pixel(8, 8).0[0], 200);
    }

    #[test]
    fn output_dimensions_always_match_input() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            7,
            13,
            Rgba([10, 200, 10, 255]),
        ));
        let output = BorderFloodMatting::default()
            .remove_background(&input)
            .expect("matting");
        assert_eq!(output.dimensions(), (7, 13));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let input = DynamicImage::new_rgba8(0, 0);
        let err = BorderFloodMatting::default()
            .remove_background(&input)
            .expect_err("zero-sized image");
        assert!(matches!(err, MattingError::EmptyImage));
    }

    #[test]
    fn uniform_image_becomes_fully_transparent() {
        let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            5,
            5,
            Rgba([128, 128, 128, 255]),
        ));
        let output = BorderFloodMatting::default()
            .remove_background(&input)
            .expect("matting");
        assert!(output.pixels().all(|p| p.0[3] == 0));
    }
}
