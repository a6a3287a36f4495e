//! 环绕相机
//!
//! 相机在固定高度上绕目标点做圆周运动，始终注视目标。
//! 投影使用 [0, 1] 深度范围。

use crate::core::config::CameraConfig;
use crate::core::math::{perspective_rh_zo, Matrix4, Point3, Vector3};

/// 环绕相机
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// 注视点
    target: Vector3,

    /// 水平环绕半径
    radius: f32,

    /// 相对目标的高度
    height: f32,

    /// 当前环绕角（弧度）
    angle: f32,

    /// 角速度（弧度/秒）
    speed: f32,

    /// 垂直视场角（弧度）
    fov_y: f32,

    near_z: f32,
    far_z: f32,
    aspect: f32,
}

impl OrbitCamera {
    /// 由配置创建，`fov` 以度为单位
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target: Vector3::zeros(),
            radius: config.orbit_radius,
            height: config.orbit_height,
            angle: 0.0,
            speed: config.orbit_speed,
            fov_y: config.fov.to_radians(),
            near_z: config.near_clip,
            far_z: config.far_clip,
            aspect: 1.0,
        }
    }

    /// 设置宽高比，非正值忽略
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// 推进环绕角
    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + self.speed * dt).rem_euclid(std::f32::consts::TAU);
    }

    /// 相机世界坐标
    pub fn position(&self) -> Vector3 {
        let (sin, cos) = self.angle.sin_cos();
        self.target + Vector3::new(self.radius * cos, self.height, self.radius * sin)
    }

    pub fn view_matrix(&self) -> Matrix4 {
        let eye = Point3::from(self.position());
        let target = Point3::from(self.target);
        Matrix4::look_at_rh(&eye, &target, &Vector3::y())
    }

    pub fn proj_matrix(&self) -> Matrix4 {
        perspective_rh_zo(self.fov_y, self.aspect, self.near_z, self.far_z)
    }

    /// 投影 * 视图
    pub fn view_projection(&self) -> Matrix4 {
        self.proj_matrix() * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vector4;

    #[test]
    fn test_position_on_orbit() {
        let camera = OrbitCamera::default();
        let config = CameraConfig::default();
        let pos = camera.position();
        assert!((pos.xz().norm() - config.orbit_radius).abs() < 1e-4);
        assert_eq!(pos.y, config.orbit_height);
    }

    #[test]
    fn test_target_at_screen_center() {
        let camera = OrbitCamera::default();
        let clip = camera.view_projection() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_advance_wraps_angle() {
        let mut camera = OrbitCamera::default();
        for _ in 0..1000 {
            camera.advance(0.25);
        }
        assert!(camera.angle() >= 0.0 && camera.angle() < std::f32::consts::TAU);
    }

    #[test]
    fn test_set_aspect_rejects_invalid() {
        let mut camera = OrbitCamera::default();
        camera.set_aspect(2.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect(), 2.0);
    }
}
