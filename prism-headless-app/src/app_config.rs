use std::path::PathBuf;

use prism_render_graph::render_graph::RenderGraphConfig;
use serde::Deserialize;

/// headless 应用的配置，从 `prism-headless.toml` 读取，缺省字段使用默认值
///
/// ```toml
/// frames = 8
/// ambient_occlusion = false
/// dump_path = "target/render_graph.dot"
///
/// [render_graph]
/// log_execution_plan = true
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadlessAppConfig {
    pub frames: u32,
    pub width: u32,
    pub height: u32,

    pub ambient_occlusion: bool,
    pub bloom: bool,
    /// 最后一帧把 HDR 结果导出到截图纹理
    pub capture_last_frame: bool,
    /// 第一帧编译后写出 graphviz 文件
    pub dump_path: Option<PathBuf>,
    /// 启动 tracy client
    pub profiler: bool,

    pub render_graph: RenderGraphConfig,
}

impl Default for HeadlessAppConfig {
    fn default() -> Self {
        Self {
            frames: 4,
            width: 1280,
            height: 720,
            ambient_occlusion: true,
            bloom: true,
            capture_last_frame: true,
            dump_path: None,
            profiler: false,
            render_graph: RenderGraphConfig::default(),
        }
    }
}
