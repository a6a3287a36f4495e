//! 应用程序基础接口
//!
//! 运行器按固定顺序驱动应用：
//!
//! ```text
//! initialize → load → { on_resize | update → render }*
//! ```
//!
//! 所有调用都在事件循环线程上串行发生。

use crate::core::error::Result;

/// 应用程序接口
///
/// # 方法说明
///
/// - `initialize()`: 创建图形设备和交换链相关资源
/// - `load()`: 创建静态管线状态、常量缓冲区、纹理和场景
/// - `on_resize()`: 窗口尺寸变化时重建交换链相关资源
/// - `update()`: 每帧推进一次模拟
/// - `render()`: 绘制并呈现一帧
/// - `is_suspended()`: 渲染是否暂停，运行器据此停止主动重绘
pub trait Application {
    /// 创建设备，失败时应用不可用
    fn initialize(&mut self) -> Result<()>;

    /// 创建与尺寸无关的资源，必须在 `initialize` 之后调用
    fn load(&mut self) -> Result<()>;

    /// 窗口尺寸变化
    ///
    /// 宽或高为 0（最小化）时暂停渲染，直到下一次非零尺寸。
    fn on_resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// 推进一帧的模拟状态
    fn update(&mut self);

    /// 绘制一帧
    fn render(&mut self) -> Result<()>;

    /// 渲染暂停（例如窗口最小化）
    fn is_suspended(&self) -> bool {
        false
    }
}
