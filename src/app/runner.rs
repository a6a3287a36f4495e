//! 主循环
//!
//! `run` 创建 winit 事件循环和窗口，按 `Application` 约定的顺序驱动应用：
//!
//! - `WindowEvent::Resized`：`on_resize`
//! - `WindowEvent::RedrawRequested`：`update` 然后 `render`
//! - `Event::AboutToWait`：请求下一次重绘；应用暂停时改为等待事件
//! - `WindowEvent::CloseRequested` 或 Esc：退出
//!
//! 任何一步返回错误都会记录日志并结束循环，错误由 `run` 返回。
//!
//! `run_headless` 不创建窗口，按同样的顺序渲染固定帧数。

use std::sync::Arc;

use tracing::{error, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::app::application::Application;
use crate::core::config::WindowConfig;
use crate::core::error::{DistRenderError, Result};

/// 创建窗口并运行主循环，直到窗口关闭或发生错误
///
/// # 参数
///
/// * `window_config` - 窗口配置
/// * `build` - 用创建好的窗口构造应用
pub fn run<A, B>(window_config: &WindowConfig, build: B) -> Result<()>
where
    A: Application,
    B: FnOnce(Arc<Window>) -> A,
{
    // 1. 创建事件循环和窗口
    let event_loop =
        EventLoop::new().map_err(|e| DistRenderError::Runtime(format!("Failed to create event loop: {}", e)))?;
    let window = WindowBuilder::new()
        .with_title(window_config.title.as_str())
        .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
        .with_resizable(window_config.resizable)
        .build(&event_loop)
        .map_err(|e| DistRenderError::Runtime(format!("Failed to create window: {}", e)))?;
    let window = Arc::new(window);

    // 2. 初始化应用
    let mut app = build(window.clone());
    app.initialize()?;
    app.load()?;

    info!("Entering main loop...");

    // 3. 主循环
    let mut failure: Option<DistRenderError> = None;
    event_loop
        .run(|event, elwt| {
            let result = match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key: Key::Named(NamedKey::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        info!("Close requested, exiting");
                        elwt.exit();
                        Ok(())
                    }
                    WindowEvent::Resized(size) => app.on_resize(size.width, size.height),
                    WindowEvent::RedrawRequested => {
                        app.update();
                        app.render()
                    }
                    _ => Ok(()),
                },
                Event::AboutToWait => {
                    let flow = control_flow_for(&app);
                    elwt.set_control_flow(flow);
                    if flow == ControlFlow::Poll {
                        window.request_redraw();
                    }
                    Ok(())
                }
                _ => Ok(()),
            };

            if let Err(e) = result {
                error!("Fatal error in main loop: {}", e);
                failure = Some(e);
                elwt.exit();
            }
        })
        .map_err(|e| DistRenderError::Runtime(format!("Event loop error: {}", e)))?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// 暂停时等待下一个窗口事件（例如恢复尺寸），否则持续重绘
fn control_flow_for<A: Application>(app: &A) -> ControlFlow {
    if app.is_suspended() {
        ControlFlow::Wait
    } else {
        ControlFlow::Poll
    }
}

/// 无窗口运行：初始化、加载，然后执行 `frames` 次 update + render
pub fn run_headless<A: Application>(app: &mut A, frames: u32) -> Result<()> {
    app.initialize()?;
    app.load()?;

    for _ in 0..frames {
        app.update();
        app.render()?;
    }

    info!(frames, "Headless run finished");
    Ok(())
}
