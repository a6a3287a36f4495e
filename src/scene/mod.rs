//! 场景模块
//!
//! - `camera`：环绕相机
//! - `light`：点光源
//! - `material`：Phong 材质
//! - `pipes`：3D 管道模拟
//! - `world`：场景容器和绘制列表

pub mod camera;
pub mod light;
pub mod material;
pub mod pipes;
pub mod world;

pub use camera::OrbitCamera;
pub use light::PointLight;
pub use material::Material;
pub use pipes::PipesSimulation;
pub use world::{Drawable, Scene, SceneObject};
