//! pipes_render - 实时 3D 图元与管道渲染
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件（默认 config.toml）
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --width 1920 --height 1080 --no-vsync --wireframe --seed 42
//!
//! # 不创建窗口，渲染 120 帧后退出
//! cargo run -- --headless 120
//! ```
//!
//! # 架构概览
//!
//! ```text
//! ┌─────────────┐
//! │   main.rs   │  配置 + 日志
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   runner    │  winit 主循环
//! └──────┬──────┘
//!        │
//! ┌──────▼──────────────────┐
//! │ Rendering3DApplication  │  生命周期、场景、常量
//! └──────┬──────────────────┘
//!        │
//!   ┌────┴─────┐
//!   │          │
//! ┌─▼───┐  ┌───▼─────┐
//! │wgpu │  │headless │  GraphicsDevice 实现
//! └─────┘  └─────────┘
//! ```

use anyhow::Context;
use tracing::info;

use pipes_render::app::{run, run_headless, Rendering3DApplication};
use pipes_render::core::{log, Config};
use pipes_render::gfx::{Extent2D, HeadlessDeviceFactory, WgpuDeviceFactory};

/// 默认配置文件路径
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（`--config` 指定时出错即退出，默认 config.toml 缺失时使用默认值）
/// 2. 应用命令行参数覆盖
/// 3. 验证配置
/// 4. 初始化日志系统
/// 5. 创建应用并启动主循环（或无窗口运行）
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // 1. 加载配置（在初始化日志之前）
    let (mut config, config_path) =
        Config::load_from_args(&args, DEFAULT_CONFIG_PATH).context("Failed to load configuration")?;

    // 2. 应用命令行参数
    config.apply_args(&args);

    // 3. 验证配置
    config.validate().context("Invalid configuration")?;

    // 4. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)
        .context("Failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path, "pipes_render starting...");
    info!(
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        seed = config.pipes.seed,
        "Configuration loaded"
    );

    // 5. 运行
    if let Some(frames) = config.headless_frames {
        let extent = Extent2D::new(config.window.width, config.window.height);
        let mut app = Rendering3DApplication::new(config.clone(), HeadlessDeviceFactory::new(extent));
        run_headless(&mut app, frames).context("Headless run failed")?;
        info!(
            frames = app.frame_index(),
            drawables = app.drawable_count(),
            "Headless run complete"
        );
        return Ok(());
    }

    let window_config = config.window.clone();
    run(&window_config, |window| {
        let factory = WgpuDeviceFactory::new(window, config.graphics.clone());
        Rendering3DApplication::new(config, factory)
    })
    .context("Renderer failed")?;

    info!("pipes_render exited");
    Ok(())
}
