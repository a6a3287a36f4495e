//! 材质
//!
//! Phong 材质参数，转换为 `MaterialConstants` 上传到 GPU。

use crate::gfx::constants::MaterialConstants;

/// Phong 材质
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        let defaults = MaterialConstants::default();
        Self {
            ambient: defaults.ambient,
            diffuse: defaults.diffuse,
            specular: defaults.specular,
            shininess: defaults.shininess,
        }
    }
}

impl Material {
    /// 单色材质：环境光为漫反射的 30%，白色高光
    pub fn colored(rgb: [f32; 3], shininess: f32) -> Self {
        let [r, g, b] = rgb;
        Self {
            ambient: [r * 0.3, g * 0.3, b * 0.3, 1.0],
            diffuse: [r, g, b, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            shininess,
        }
    }

    /// 管道配色，按管道编号循环取用
    pub fn pipe_palette(index: usize) -> Self {
        const PALETTE: [[f32; 3]; 6] = [
            [0.85, 0.15, 0.15],
            [0.15, 0.65, 0.20],
            [0.20, 0.35, 0.90],
            [0.90, 0.75, 0.10],
            [0.70, 0.20, 0.80],
            [0.10, 0.75, 0.80],
        ];
        Self::colored(PALETTE[index % PALETTE.len()], 32.0)
    }

    pub fn to_constants(&self) -> MaterialConstants {
        MaterialConstants {
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
            padding: [0.0; 3],
        }
    }
}
