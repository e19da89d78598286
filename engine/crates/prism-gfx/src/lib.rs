//! Prism GFX 层
//!
//! RenderGraph 只通过这里定义的 [`device::GfxDevice`] 和 [`device::GfxCommandList`] 与 GPU 交互，
//! 不直接接触图形 API。
//!
//! - `format` / `resource_state` / `flags`: 资源格式、状态与绑定标记
//! - `texture` / `buffer`: 资源描述与子资源视图描述
//! - `render_pass`: render pass 的 attachment 描述
//! - `barrier`: 资源状态转换，以及到 Vulkan (`ash`) barrier 的转换
//! - `recording`: 只记录命令的参考实现，用于测试和 headless 运行
//!
//! `to_vk*` 系列函数是给 Vulkan 后端用的翻译接口，RenderGraph 的执行计划日志也用它们打印 layout、aspect 和 load/store op。

pub mod barrier;
pub mod buffer;
pub mod device;
pub mod flags;
pub mod format;
pub mod handles;
pub mod recording;
pub mod render_pass;
pub mod resource_state;
pub mod texture;
