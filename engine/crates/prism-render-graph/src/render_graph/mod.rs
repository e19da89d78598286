//! RenderGraph - 声明式的每帧渲染图
//!
//! 每帧重新构建：Pass 在 setup 中声明对资源的读写意图，graph 据此分析生命周期、
//! 剔除无用 Pass、推导资源状态转换，最后按声明顺序执行。
//!
//! # 核心概念
//!
//! - **RgResourceName**: 资源名的 64 位哈希，相同的名字在不同 Pass 之间指向同一个逻辑资源
//! - **RgHandle**: 带访问方式的资源句柄，只能在获取它的 Pass 的 execute 中解析
//! - **RgBuilder / RgContext**: setup 阶段声明资源，execute 阶段解析资源
//! - **RgBlackboard**: Pass 之间按类型共享数据
//! - **RgCompiledGraph**: 编译结果，包含剔除信息、生命周期和预计算的 barrier
//! - **RgResourcePool**: 跨帧复用的物理资源池
//!
//! # 使用示例
//!
//! ```ignore
//! use prism_render_graph::render_graph::*;
//!
//! #[derive(Clone, Copy, Default)]
//! struct GBufferData {
//!     albedo: RgRenderTargetId,
//! }
//!
//! let mut graph = RenderGraph::new(RenderGraphConfig::default());
//! graph.import_texture(rg_name!("Backbuffer"), backbuffer, backbuffer_desc);
//!
//! let gbuffer = graph.add_pass::<GBufferData, _, _>(
//!     "GBuffer",
//!     RgPassType::Graphics,
//!     RgPassFlags::empty(),
//!     |data, builder| {
//!         builder.declare_texture(rg_name!("GBufferAlbedo"), albedo_desc);
//!         data.albedo = builder.write_render_target(rg_name!("GBufferAlbedo"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
//!         builder.set_viewport(1280, 720);
//!     },
//!     |data, ctx, cmd| {
//!         let _albedo = ctx.render_target(data.albedo);
//!         cmd.draw(3, 1);
//!     },
//! );
//!
//! let mut compiled = graph.compile();
//! compiled.execute(&mut pool, &mut device, &mut cmd)?;
//! ```
//!
//! # 模块结构
//!
//! - `resource_name` / `handle`: 资源名与句柄
//! - `resource_registry`: 资源注册表
//! - `pass` / `builder` / `context` / `blackboard`: Pass 定义及其 setup / execute 接口
//! - `compiler`: 剔除、生命周期、barrier、事件
//! - `executor` / `resource_pool`: 执行与物理资源复用
//! - `export` / `event` / `dump` / `plan`: 导出资源、调试事件、graphviz 和执行计划日志

mod barrier;
mod blackboard;
mod buffer_resource;
mod builder;
mod compiler;
mod config;
mod context;
mod dump;
mod event;
mod executor;
mod export;
mod frame_graph;
mod graph;
mod handle;
mod pass;
mod plan;
mod resource;
mod resource_name;
mod resource_pool;
mod resource_registry;
mod texture_resource;

#[cfg(test)]
mod tests;

// Re-exports
pub use barrier::{RgBarrierDesc, RgPassBarriers};
pub use blackboard::RgBlackboard;
pub use buffer_resource::{RgBufferResource, RgBufferSource, RgBufferViewDesc};
pub use builder::RgBuilder;
pub use config::RenderGraphConfig;
pub use context::RgContext;
pub use event::RgEvent;
pub use executor::RgCompiledGraph;
pub use frame_graph::RenderGraph;
pub use graph::RgDependencyGraph;
pub use handle::*;
pub use pass::{
    RgDepthStencilInfo, RgLoadStoreAccessOp, RgPass, RgPassFlags, RgPassNode, RgPassType, RgReadAccess,
    RgRenderTargetInfo,
};
pub use plan::{format_access_flags, format_pipeline_stage};
pub use resource::RgResourceInfo;
pub use resource_name::{INVALID_HASH, RgResourceName, compute_name, insert_debug_name};
pub use resource_pool::RgResourcePool;
pub use resource_registry::RgResourceRegistry;
pub use texture_resource::{RgTextureResource, RgTextureSource, RgTextureViewDesc};
