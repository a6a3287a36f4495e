//! 应用生命周期集成测试，使用无窗口设备

use pipes_render::app::{run_headless, AppState, Application, Rendering3DApplication};
use pipes_render::core::{Config, DistRenderError, GraphicsError};
use pipes_render::gfx::{Extent2D, HeadlessDeviceFactory, HeadlessMonitor, ResourceKind};

fn headless_app(width: u32, height: u32) -> (Rendering3DApplication<HeadlessDeviceFactory>, HeadlessMonitor) {
    let factory = HeadlessDeviceFactory::new(Extent2D::new(width, height));
    let monitor = factory.monitor();
    (Rendering3DApplication::new(Config::default(), factory), monitor)
}

fn loaded_app() -> (Rendering3DApplication<HeadlessDeviceFactory>, HeadlessMonitor) {
    let (mut app, monitor) = headless_app(640, 480);
    app.initialize().unwrap();
    app.load().unwrap();
    (app, monitor)
}

#[test]
fn initialize_load_render_succeeds() {
    let (mut app, monitor) = loaded_app();
    app.update();
    app.render().unwrap();

    assert_eq!(app.state(), AppState::Loaded);
    assert_eq!(app.frame_index(), 1);
    assert_eq!(monitor.frames_presented(), 1);

    let frame = monitor.last_frame().unwrap();
    assert_eq!(frame.extent, Extent2D::new(640, 480));
    assert_eq!(frame.draw_count, app.drawable_count());
    assert!(frame.index_count > 0);
}

#[test]
fn resize_matches_render_and_depth_targets() {
    let (mut app, _monitor) = loaded_app();
    app.on_resize(1024, 600).unwrap();

    assert_eq!(app.render_target_extent(), Some(Extent2D::new(1024, 600)));
    assert_eq!(app.depth_target_extent(), Some(Extent2D::new(1024, 600)));
    app.render().unwrap();
}

#[test]
fn resize_to_same_size_is_idempotent() {
    let (mut app, monitor) = loaded_app();
    app.on_resize(800, 600).unwrap();
    let live = monitor.live_total();
    let depth_created = monitor.created(ResourceKind::DepthTarget);

    app.on_resize(800, 600).unwrap();
    assert_eq!(monitor.live_total(), live);
    assert_eq!(monitor.created(ResourceKind::DepthTarget), depth_created);
}

#[test]
fn repeated_resizes_do_not_leak() {
    let (mut app, monitor) = loaded_app();
    app.on_resize(800, 600).unwrap();
    let live = monitor.live_total();

    for size in [(320, 200), (1920, 1080), (1, 1), (800, 600)] {
        app.on_resize(size.0, size.1).unwrap();
        app.render().unwrap();
    }
    assert_eq!(monitor.live_total(), live);
    assert_eq!(monitor.live(ResourceKind::DepthTarget), 1);
}

#[test]
fn drop_without_initialize_is_clean() {
    let (app, monitor) = headless_app(640, 480);
    drop(app);
    assert_eq!(monitor.live_total(), 0);
}

#[test]
fn drop_after_failed_initialize_is_clean() {
    let factory = HeadlessDeviceFactory::failing("no suitable adapter");
    let monitor = factory.monitor();
    let mut app = Rendering3DApplication::new(Config::default(), factory);

    let err = app.initialize().unwrap_err();
    assert!(matches!(err, DistRenderError::Graphics(GraphicsError::DeviceCreation(_))));
    assert_eq!(app.state(), AppState::Created);

    drop(app);
    assert_eq!(monitor.live_total(), 0);
}

#[test]
fn drop_after_initialize_only_is_clean() {
    let (mut app, monitor) = headless_app(640, 480);
    app.initialize().unwrap();
    assert_eq!(monitor.live(ResourceKind::Device), 1);
    assert_eq!(monitor.live(ResourceKind::DepthTarget), 1);

    drop(app);
    assert_eq!(monitor.live_total(), 0);
}

#[test]
fn drop_after_full_run_is_clean() {
    let (mut app, monitor) = loaded_app();
    for _ in 0..10 {
        app.update();
        app.render().unwrap();
    }
    assert!(monitor.live_total() > 0);

    drop(app);
    assert_eq!(monitor.live_total(), 0);
}

#[test]
fn render_before_load_is_lifecycle_error() {
    let (mut app, _monitor) = headless_app(640, 480);
    assert!(matches!(app.render(), Err(DistRenderError::Lifecycle(_))));

    app.initialize().unwrap();
    assert!(matches!(app.render(), Err(DistRenderError::Lifecycle(_))));
}

#[test]
fn load_before_initialize_is_error() {
    let (mut app, monitor) = headless_app(640, 480);
    assert!(matches!(app.load(), Err(DistRenderError::Lifecycle(_))));
    assert_eq!(monitor.live_total(), 0);
}

#[test]
fn zero_size_resize_suspends_rendering() {
    let (mut app, monitor) = loaded_app();
    app.render().unwrap();

    app.on_resize(0, 480).unwrap();
    assert!(app.is_suspended());
    assert_eq!(app.depth_target_extent(), None);
    assert_eq!(monitor.live(ResourceKind::DepthTarget), 0);

    app.render().unwrap();
    assert_eq!(monitor.frames_presented(), 1);

    app.on_resize(640, 480).unwrap();
    assert!(!app.is_suspended());
    assert_eq!(app.depth_target_extent(), Some(Extent2D::new(640, 480)));

    app.render().unwrap();
    assert_eq!(monitor.frames_presented(), 2);
}

#[test]
fn resize_before_initialize_is_recorded() {
    let (mut app, _monitor) = headless_app(640, 480);
    app.on_resize(300, 200).unwrap();
    assert_eq!(app.render_target_extent(), None);

    app.initialize().unwrap();
    assert_eq!(app.render_target_extent(), Some(Extent2D::new(300, 200)));
    assert_eq!(app.depth_target_extent(), Some(Extent2D::new(300, 200)));
}

#[test]
fn minimized_before_initialize_starts_suspended() {
    let (mut app, monitor) = headless_app(640, 480);
    app.on_resize(0, 0).unwrap();
    app.initialize().unwrap();
    app.load().unwrap();

    assert!(app.is_suspended());
    app.render().unwrap();
    assert_eq!(monitor.frames_presented(), 0);
}

#[test]
fn missing_shader_fails_load() {
    let dir = std::env::temp_dir().join(format!("pipes_render_bad_shader_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("lit.wgsl"), "// no entry points\n").unwrap();

    let mut config = Config::default();
    config.graphics.shader_dir = Some(dir.display().to_string());
    let mut app = Rendering3DApplication::new(config, HeadlessDeviceFactory::new(Extent2D::new(64, 64)));
    app.initialize().unwrap();

    let err = app.load().unwrap_err();
    assert!(matches!(err, DistRenderError::Graphics(GraphicsError::ShaderCompilation(_))));
    assert_eq!(app.state(), AppState::Initialized);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn headless_run_presents_every_frame() {
    let (mut app, monitor) = headless_app(320, 240);
    run_headless(&mut app, 30).unwrap();
    assert_eq!(app.frame_index(), 30);
    assert_eq!(monitor.frames_presented(), 30);
}

#[test]
fn same_seed_renders_same_scene() {
    let mut config = Config::default();
    config.pipes.seed = 1234;

    let run = |config: Config| {
        let factory = HeadlessDeviceFactory::new(Extent2D::new(320, 240));
        let monitor = factory.monitor();
        let mut app = Rendering3DApplication::new(config, factory);
        app.initialize().unwrap();
        app.load().unwrap();
        for _ in 0..20 {
            app.advance(0.1);
            app.render().unwrap();
        }
        monitor.last_frame().unwrap()
    };

    assert_eq!(run(config.clone()), run(config));
}
