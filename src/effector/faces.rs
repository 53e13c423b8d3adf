//! 表情图片资源
//!
//! 在固定目录下按 `<imageBase>.<extension>` 查找图片；找不到返回 AssetMissing（可恢复）。
//! 找到后缩放到表情屏原生尺寸（bicubic），再转成屏幕使用的 1-bit 打包格式。

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;

use crate::core::ActionError;

/// 亮度阈值：不低于该值的像素点亮
const LIT_THRESHOLD: u8 = 128;

/// 屏幕格式的表情：逐行、每行按字节对齐、高位在前
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FaceImage {
    /// 缩放并转换为屏幕格式；invert 为 true 时亮暗互换
    pub fn from_image(img: &DynamicImage, width: u32, height: u32, invert: bool) -> Self {
        let gray = img
            .resize_exact(width, height, FilterType::CatmullRom)
            .to_luma8();
        let row_bytes = Self::row_bytes(width);
        let mut data = vec![0u8; row_bytes * height as usize];
        for (x, y, px) in gray.enumerate_pixels() {
            let lit = (px.0[0] >= LIT_THRESHOLD) != invert;
            if lit {
                data[y as usize * row_bytes + x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    fn row_bytes(width: u32) -> usize {
        (width as usize + 7) / 8
    }

    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y as usize * Self::row_bytes(self.width) + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    pub fn lit_pixels(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }
}

/// 表情图片库：目录 + 扩展名 + 是否反色
#[derive(Debug, Clone)]
pub struct FaceLibrary {
    dir: PathBuf,
    extension: String,
    invert: bool,
}

impl FaceLibrary {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            invert: false,
        }
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, image_base: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", image_base, self.extension))
    }

    /// 加载并转换表情；image_base 不允许带路径分隔符
    pub fn load(&self, image_base: &str, dimensions: (u32, u32)) -> Result<FaceImage, ActionError> {
        let has_separator = image_base.contains(|c: char| c == '/' || c == '\\');
        if image_base.is_empty() || has_separator || image_base == ".." {
            return Err(ActionError::malformed(image_base, "invalid face image name"));
        }
        let path = self.path_for(image_base);
        if !path.is_file() {
            return Err(ActionError::AssetMissing(path.display().to_string()));
        }
        let img = image::open(&path)?;
        let (width, height) = dimensions;
        Ok(FaceImage::from_image(&img, width, height, self.invert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_face(dir: &Path, name: &str, color: [u8; 3]) {
        RgbImage::from_pixel(64, 64, Rgb(color))
            .save(dir.join(format!("{}.png", name)))
            .unwrap();
    }

    #[test]
    fn test_missing_face_is_asset_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = FaceLibrary::new(tmp.path(), "png");
        let err = faces.load("Happy", (128, 32)).unwrap_err();
        assert!(matches!(err, ActionError::AssetMissing(p) if p.ends_with("Happy.png")));
    }

    #[test]
    fn test_white_face_is_fully_lit() {
        let tmp = tempfile::tempdir().unwrap();
        write_face(tmp.path(), "Happy", [255, 255, 255]);
        let faces = FaceLibrary::new(tmp.path(), "png");
        let face = faces.load("Happy", (128, 32)).unwrap();
        assert_eq!(face.width, 128);
        assert_eq!(face.height, 32);
        assert_eq!(face.data.len(), 16 * 32);
        assert_eq!(face.lit_pixels(), 128 * 32);
        assert!(face.is_lit(127, 31));
        assert!(!face.is_lit(128, 0));
    }

    #[test]
    fn test_invert_black_face() {
        let tmp = tempfile::tempdir().unwrap();
        write_face(tmp.path(), "Sleepy", [0, 0, 0]);
        let plain = FaceLibrary::new(tmp.path(), "png");
        assert_eq!(plain.load("Sleepy", (16, 8)).unwrap().lit_pixels(), 0);
        let inverted = FaceLibrary::new(tmp.path(), "png").with_invert(true);
        assert_eq!(inverted.load("Sleepy", (16, 8)).unwrap().lit_pixels(), 16 * 8);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let faces = FaceLibrary::new(tmp.path(), "png");
        assert!(matches!(
            faces.load("../secret", (128, 32)),
            Err(ActionError::MalformedToken { .. })
        ));
    }
}
