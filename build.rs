/// Build script for pipes_render
///
/// 着色器以 WGSL 源码形式通过 `include_str!` 嵌入，运行时由 wgpu 编译。
fn main() {
    // Trigger rebuild if shader files change
    println!("cargo:rerun-if-changed=src/shaders/lit.wgsl");
}
