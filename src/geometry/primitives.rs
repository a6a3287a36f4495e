//! 基础图元生成
//!
//! 生成立方体、球体、圆柱体的 CPU 侧网格。所有图元以原点为中心，
//! 三角形逆时针为正面，法线朝外。

use std::f32::consts::{PI, TAU};

use super::mesh::MeshData;
use super::vertex::Vertex;

/// 场景中可以绘制的图元种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Cylinder,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Sphere,
        PrimitiveKind::Cylinder,
    ];

    /// 生成该图元的单位尺寸网格
    ///
    /// 立方体边长 1，球体半径 0.5，圆柱体半径 0.5、高度 1。
    pub fn build(self) -> MeshData {
        match self {
            PrimitiveKind::Cube => cube(1.0),
            PrimitiveKind::Sphere => sphere(0.5, 32, 16),
            PrimitiveKind::Cylinder => cylinder(0.5, 1.0, 24),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "Cube",
            PrimitiveKind::Sphere => "Sphere",
            PrimitiveKind::Cylinder => "Cylinder",
        }
    }
}

/// 立方体，每个面独立 4 个顶点以保证法线不被平滑
pub fn cube(size: f32) -> MeshData {
    let h = 0.5 * size;
    let mut mesh = MeshData::with_capacity("Cube", 24, 36);

    // (法线, u 轴, v 轴)，满足 u × v = n
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    for (n, u, v) in faces {
        let base = mesh.vertices.len() as u32;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        for ((su, sv), uv) in corners.into_iter().zip(uvs) {
            let position = [
                h * (n[0] + su * u[0] + sv * v[0]),
                h * (n[1] + su * u[1] + sv * v[1]),
                h * (n[2] + su * u[2] + sv * v[2]),
            ];
            mesh.vertices.push(Vertex::new(position, n, uv));
        }

        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}

/// UV 球体
///
/// # 参数
/// - `slices`: 经度方向分段数（至少 3）
/// - `stacks`: 纬度方向分段数（至少 2）
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    let ring = slices + 1;

    let mut mesh = MeshData::with_capacity(
        "Sphere",
        (ring * (stacks + 1)) as usize,
        (slices * stacks * 6) as usize,
    );

    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        let phi = v * PI;
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            let theta = u * TAU;
            let normal = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            mesh.vertices.push(Vertex::new(position, normal, [u, v]));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let a = i * ring + j;
            let b = a + ring;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    mesh
}

/// 沿 Y 轴、以原点为中心、两端封口的圆柱体
pub fn cylinder(radius: f32, height: f32, slices: u32) -> MeshData {
    let slices = slices.max(3);
    let ring = slices + 1;
    let half = 0.5 * height;

    let mut mesh = MeshData::with_capacity(
        "Cylinder",
        (ring * 4 + 2) as usize,
        (slices * 12) as usize,
    );

    // 侧面：底环 [0, ring)，顶环 [ring, 2 * ring)
    for (y, v) in [(-half, 1.0), (half, 0.0)] {
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            let theta = u * TAU;
            let (s, c) = theta.sin_cos();
            mesh.vertices
                .push(Vertex::new([radius * c, y, radius * s], [c, 0.0, s], [u, v]));
        }
    }

    for j in 0..slices {
        let bottom = j;
        let top = j + ring;
        mesh.indices
            .extend_from_slice(&[bottom, top, bottom + 1, bottom + 1, top, top + 1]);
    }

    // 端盖
    for (y, ny) in [(half, 1.0f32), (-half, -1.0f32)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices
            .push(Vertex::new([0.0, y, 0.0], [0.0, ny, 0.0], [0.5, 0.5]));

        for j in 0..=slices {
            let theta = j as f32 / slices as f32 * TAU;
            let (s, c) = theta.sin_cos();
            mesh.vertices.push(Vertex::new(
                [radius * c, y, radius * s],
                [0.0, ny, 0.0],
                [0.5 + 0.5 * c, 0.5 + 0.5 * s],
            ));
        }

        for j in 0..slices {
            let current = center + 1 + j;
            let next = current + 1;
            if ny > 0.0 {
                mesh.indices.extend_from_slice(&[center, next, current]);
            } else {
                mesh.indices.extend_from_slice(&[center, current, next]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// 每个三角形的几何法线都应与顶点法线同向（逆时针正面、法线朝外）
    fn assert_outward_ccw(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            let n = [
                a.normal[0] + b.normal[0] + c.normal[0],
                a.normal[1] + b.normal[1] + c.normal[1],
                a.normal[2] + b.normal[2] + c.normal[2],
            ];
            assert!(dot(face, n) >= -1e-5, "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn test_cube() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());
        assert_outward_ccw(&mesh);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|p| (p.abs() - 1.0).abs() < 1e-6)));
    }

    #[test]
    fn test_sphere() {
        let mesh = sphere(2.0, 16, 8);
        assert_eq!(mesh.vertex_count(), 17 * 9);
        assert_eq!(mesh.index_count(), 16 * 8 * 6);
        assert!(mesh.validate().is_ok());
        assert_outward_ccw(&mesh);

        for v in &mesh.vertices {
            let r = dot(v.position, v.position).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_clamps_segments() {
        let mesh = sphere(1.0, 0, 0);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.vertex_count(), 4 * 3);
    }

    #[test]
    fn test_cylinder() {
        let mesh = cylinder(0.5, 1.0, 12);
        assert!(mesh.validate().is_ok());
        assert_outward_ccw(&mesh);
        assert_eq!(mesh.triangle_count(), 12 * 4);

        let (min_y, max_y) = mesh
            .vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| {
                (lo.min(v.position[1]), hi.max(v.position[1]))
            });
        assert_eq!(min_y, -0.5);
        assert_eq!(max_y, 0.5);
    }

    #[test]
    fn test_all_kinds_build() {
        for kind in PrimitiveKind::ALL {
            let mesh = kind.build();
            assert!(mesh.validate().is_ok(), "{} invalid", kind.name());
            assert_eq!(mesh.name.as_deref(), Some(kind.name()));
        }
    }
}
