//! 数学库模块
//!
//! 基于 `nalgebra` 的类型别名和少量图形学辅助函数。
//! 所有矩阵均为列主序，与 WGSL 的 `mat4x4<f32>` 布局一致。

pub use nalgebra::{Point3, Unit, UnitQuaternion};

pub type Vector3 = nalgebra::Vector3<f32>;
pub type Vector4 = nalgebra::Vector4<f32>;
pub type Matrix4 = nalgebra::Matrix4<f32>;
pub type Quaternion = UnitQuaternion<f32>;

/// 右手坐标系透视投影，深度范围 [0, 1]
///
/// `nalgebra::Matrix4::new_perspective` 产生 OpenGL 风格的 [-1, 1] 深度，
/// wgpu 和 D3D 都要求 [0, 1]。
pub fn perspective_rh_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
    let f = 1.0 / (0.5 * fov_y).tan();
    let range = far / (near - far);

    #[rustfmt::skip]
    let proj = Matrix4::new(
        f / aspect, 0.0, 0.0,   0.0,
        0.0,        f,   0.0,   0.0,
        0.0,        0.0, range, near * range,
        0.0,        0.0, -1.0,  0.0,
    );
    proj
}

/// 法线矩阵（模型矩阵的逆转置）
///
/// 模型矩阵不可逆时退化为单位矩阵。
pub fn normal_matrix(model: &Matrix4) -> Matrix4 {
    model
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or_else(Matrix4::identity)
}

/// 转换为 GPU 常量缓冲区使用的列数组
#[inline]
pub fn to_cols(m: &Matrix4) -> [[f32; 4]; 4] {
    *m.as_ref()
}

/// 将 +Y 轴旋转到 `direction` 的旋转
///
/// 圆柱体网格沿 Y 轴建模，用它把管道段对齐到任意方向。
pub fn rotation_from_y(direction: &Vector3) -> Quaternion {
    let up = Vector3::y();
    let dir = direction.normalize();
    UnitQuaternion::rotation_between(&up, &dir).unwrap_or_else(|| {
        // 方向与 +Y 相反时 rotation_between 无解
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
    })
}

/// 由平移、旋转、缩放组合模型矩阵：T * R * S
pub fn compose(translation: &Vector3, rotation: &Quaternion, scale: &Vector3) -> Matrix4 {
    Matrix4::new_translation(translation)
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(scale)
}
