/// 顶点定义模块
///
/// 图元网格使用的顶点结构，包含位置、法线和 UV 坐标。

use bytemuck::{Pod, Zeroable};

/// 3D 顶点结构
///
/// 内存布局与 GPU 兼容，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - normal: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - **总计**: 32 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)，单位长度
    pub normal: [f32; 3],

    /// 纹理坐标 (u, v)，范围 [0.0, 1.0]
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// 创建一个新的顶点
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// 顶点属性在缓冲区中的字节偏移：(position, normal, texcoord)
    pub const OFFSETS: [u64; 3] = [0, 12, 24];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_vertex_size() {
        // 3*4 + 3*4 + 2*4 = 32 bytes
        assert_eq!(size_of::<Vertex>(), 32);
        assert_eq!(std::mem::align_of::<Vertex>(), 4);
    }

    #[test]
    fn test_vertex_offsets() {
        let v = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.25]);
        let bytes = bytemuck::bytes_of(&v);
        let normal_y = f32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let u = f32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(normal_y, 1.0);
        assert_eq!(u, 0.5);
        assert_eq!(Vertex::OFFSETS[1], 12);
    }
}
