//! 点光源

use crate::core::config::LightConfig;
use crate::core::math::Vector3;
use crate::gfx::constants::LightConstants;

/// 点光源
///
/// `orbit_speed` 非零时绕 Y 轴旋转（弧度/秒），高度保持不变。
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vector3,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub orbit_speed: f32,
}

impl PointLight {
    pub fn from_config(config: &LightConfig) -> Self {
        let [x, y, z] = config.position;
        Self {
            position: Vector3::new(x, y, z),
            ambient: config.ambient,
            diffuse: config.diffuse,
            specular: config.specular,
            orbit_speed: config.orbit_speed,
        }
    }

    /// 推进光源动画
    pub fn advance(&mut self, dt: f32) {
        if self.orbit_speed == 0.0 || dt <= 0.0 {
            return;
        }
        let (sin, cos) = (self.orbit_speed * dt).sin_cos();
        let (x, z) = (self.position.x, self.position.z);
        self.position.x = x * cos - z * sin;
        self.position.z = x * sin + z * cos;
    }

    pub fn to_constants(&self) -> LightConstants {
        LightConstants {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::from_config(&LightConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_light_does_not_move() {
        let mut light = PointLight::default();
        let before = light.position;
        light.advance(1.0);
        assert_eq!(light.position, before);
    }

    #[test]
    fn test_orbit_keeps_radius_and_height() {
        let mut light = PointLight {
            orbit_speed: 1.0,
            ..PointLight::default()
        };
        let radius = light.position.xz().norm();
        let height = light.position.y;
        light.advance(0.5);
        assert!((light.position.xz().norm() - radius).abs() < 1e-4);
        assert_eq!(light.position.y, height);
    }

    #[test]
    fn test_constants_position_is_point() {
        let constants = PointLight::default().to_constants();
        assert_eq!(constants.position[3], 1.0);
        assert_eq!(constants.diffuse, LightConfig::default().diffuse);
    }
}
