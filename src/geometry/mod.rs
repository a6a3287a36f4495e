/// 几何体模块
///
/// 提供顶点定义、CPU 侧网格数据以及立方体、球体、圆柱体的图元生成器。
///
/// # 架构设计
///
/// ```text
/// primitives (Cube / Sphere / Cylinder)
///     ↓
/// MeshData (CPU侧数据)
///     ↓
/// GraphicsDevice::create_mesh (上传到GPU)
/// ```

pub mod mesh;
pub mod primitives;
pub mod vertex;

// 重新导出常用类型
pub use mesh::MeshData;
pub use primitives::PrimitiveKind;
pub use vertex::Vertex;
