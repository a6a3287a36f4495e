//! 场景
//!
//! 由静态图元和管道模拟组成。渲染时通过 `drawables()` 得到一个
//! 顺序稳定的绘制列表：先静态物体（按添加顺序），后管道。

use crate::core::config::PipesConfig;
use crate::core::math::{compose, Matrix4, Quaternion, Vector3};
use crate::geometry::PrimitiveKind;
use crate::scene::material::Material;
use crate::scene::pipes::PipesSimulation;

/// 一个绘制项：使用哪个图元网格、模型矩阵和材质
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub mesh: PrimitiveKind,
    pub model: Matrix4,
    pub material: Material,
}

/// 静态场景物体
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: PrimitiveKind,
    pub transform: Matrix4,
    pub material: Material,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: PrimitiveKind, transform: Matrix4, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            material,
        }
    }
}

/// 场景
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    pipes: PipesSimulation,
}

impl Scene {
    /// 只有管道模拟的空场景
    pub fn new(pipes: &PipesConfig) -> Self {
        Self {
            objects: Vec::new(),
            pipes: PipesSimulation::new(pipes),
        }
    }

    /// 默认场景：管道网格下方的地板和三个展示图元
    pub fn with_default_objects(pipes: &PipesConfig) -> Self {
        let mut scene = Self::new(pipes);
        let floor_y = -(scene.pipes.grid_size() as f32) * 0.5 - 1.0;
        let extent = scene.pipes.grid_size() as f32 + 4.0;

        scene.add_object(SceneObject::new(
            "Floor",
            PrimitiveKind::Cube,
            compose(
                &Vector3::new(0.0, floor_y, 0.0),
                &Quaternion::identity(),
                &Vector3::new(extent, 0.2, extent),
            ),
            Material::colored([0.35, 0.35, 0.38], 8.0),
        ));

        let showcase = [
            (PrimitiveKind::Cube, -3.0, [0.8, 0.4, 0.2]),
            (PrimitiveKind::Sphere, 0.0, [0.3, 0.6, 0.9]),
            (PrimitiveKind::Cylinder, 3.0, [0.4, 0.8, 0.4]),
        ];
        for (kind, x, color) in showcase {
            scene.add_object(SceneObject::new(
                kind.name(),
                kind,
                compose(
                    &Vector3::new(x, floor_y + 0.6, extent * 0.5 - 1.5),
                    &Quaternion::identity(),
                    &Vector3::repeat(1.0),
                ),
                Material::colored(color, 64.0),
            ));
        }

        scene
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// 推进模拟
    pub fn advance(&mut self, dt: f32) {
        self.pipes.advance(dt);
    }

    /// 收集绘制项到 `out`（先清空）
    pub fn collect_drawables(&self, out: &mut Vec<Drawable>) {
        out.clear();
        out.extend(self.objects.iter().map(|object| Drawable {
            mesh: object.mesh,
            model: object.transform,
            material: object.material,
        }));
        self.pipes.drawables(out);
    }

    pub fn drawables(&self) -> Vec<Drawable> {
        let mut out = Vec::with_capacity(self.drawable_count());
        self.collect_drawables(&mut out);
        out
    }

    pub fn drawable_count(&self) -> usize {
        self.objects.len() + self.pipes.drawable_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_objects() {
        let scene = Scene::with_default_objects(&PipesConfig::default());
        assert_eq!(scene.objects().len(), 4);
        assert_eq!(scene.drawable_count(), 4);
        let kinds: Vec<_> = scene.drawables().iter().map(|d| d.mesh).collect();
        assert_eq!(
            kinds,
            vec![
                PrimitiveKind::Cube,
                PrimitiveKind::Cube,
                PrimitiveKind::Sphere,
                PrimitiveKind::Cylinder
            ]
        );
    }

    #[test]
    fn test_static_objects_come_first() {
        let mut scene = Scene::with_default_objects(&PipesConfig::default());
        scene.advance(1.0);
        let drawables = scene.drawables();
        assert!(drawables.len() > 4);
        for (drawable, object) in drawables.iter().zip(scene.objects()) {
            assert_eq!(drawable.model, object.transform);
        }
        assert_eq!(drawables.len(), scene.drawable_count());
    }

    #[test]
    fn test_drawables_are_stable() {
        let mut scene = Scene::with_default_objects(&PipesConfig::default());
        scene.advance(0.5);
        assert_eq!(scene.drawables(), scene.drawables());
    }
}
