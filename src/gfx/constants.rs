//! 常量缓冲区布局
//!
//! 与 `lit.wgsl` 中的 uniform 结构逐字节对应。所有结构使用 `#[repr(C)]`，
//! 大小都是 16 字节的整数倍，矩阵为列主序。

use bytemuck::{Pod, Zeroable};

use crate::core::math::{normal_matrix, to_cols, Matrix4, Vector3};

/// 每帧常量：视图投影矩阵
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerFrameConstants {
    pub view_projection: [[f32; 4]; 4],
}

impl PerFrameConstants {
    pub fn new(view_projection: &Matrix4) -> Self {
        Self {
            view_projection: to_cols(view_projection),
        }
    }
}

impl Default for PerFrameConstants {
    fn default() -> Self {
        Self::new(&Matrix4::identity())
    }
}

/// 每个物体的常量：模型矩阵与法线矩阵
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl PerObjectConstants {
    /// 由模型矩阵计算，法线矩阵取其逆转置
    pub fn from_model(model: &Matrix4) -> Self {
        Self {
            model: to_cols(model),
            normal: to_cols(&normal_matrix(model)),
        }
    }
}

impl Default for PerObjectConstants {
    fn default() -> Self {
        Self::from_model(&Matrix4::identity())
    }
}

/// 相机常量：世界空间位置 + 对齐填充
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraConstants {
    pub camera_position: [f32; 3],
    pub padding: f32,
}

impl CameraConstants {
    pub fn new(position: &Vector3) -> Self {
        Self {
            camera_position: [position.x, position.y, position.z],
            padding: 0.0,
        }
    }
}

/// 材质常量
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    pub padding: [f32; 3],
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            ambient: [1.0, 1.0, 1.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            shininess: 3.0,
            padding: [0.0; 3],
        }
    }
}

/// 点光源常量
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

/// 常量缓冲区的绑定槽位，与着色器中的 `@binding` 一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantSlot {
    PerFrame = 0,
    Camera = 1,
    Light = 2,
    Material = 3,
    PerObject = 4,
}

impl ConstantSlot {
    /// 对应结构体的字节大小
    pub fn size(self) -> u64 {
        let size = match self {
            ConstantSlot::PerFrame => std::mem::size_of::<PerFrameConstants>(),
            ConstantSlot::Camera => std::mem::size_of::<CameraConstants>(),
            ConstantSlot::Light => std::mem::size_of::<LightConstants>(),
            ConstantSlot::Material => std::mem::size_of::<MaterialConstants>(),
            ConstantSlot::PerObject => std::mem::size_of::<PerObjectConstants>(),
        };
        size as u64
    }

    /// 是否按物体使用动态偏移
    pub fn is_dynamic(self) -> bool {
        matches!(self, ConstantSlot::Material | ConstantSlot::PerObject)
    }

    pub fn binding(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            ConstantSlot::PerFrame => "PerFrame Constants",
            ConstantSlot::Camera => "Camera Constants",
            ConstantSlot::Light => "Light Constants",
            ConstantSlot::Material => "Material Constants",
            ConstantSlot::PerObject => "PerObject Constants",
        }
    }
}
