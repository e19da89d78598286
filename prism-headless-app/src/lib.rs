//! Prism headless 应用
//!
//! 在录制设备上运行完整的 RenderGraph 帧，不需要窗口和 GPU。

pub mod app_config;
pub mod deferred;
