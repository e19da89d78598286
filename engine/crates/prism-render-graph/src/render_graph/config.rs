use std::path::Path;

use serde::Deserialize;

/// RenderGraph 的可配置项，缺省字段使用默认值
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderGraphConfig {
    /// 剔除输出没有被使用的 Pass
    pub cull_passes: bool,
    /// 显式读取临时资源之前必须有更早的 Pass 写入它
    pub validate_declaration_order: bool,
    /// 资源池中闲置超过这么多帧的资源会被销毁
    pub pool_eviction_frames: u64,
    /// 每次执行前打印执行计划
    pub log_execution_plan: bool,
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        Self {
            cull_passes: true,
            validate_declaration_order: true,
            pool_eviction_frames: 3,
            log_execution_plan: false,
        }
    }
}

impl RenderGraphConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        prism_crate_tools::config::load_toml(path)
    }
}
