//! 一帧的 RenderGraph
//!
//! 每帧重新创建：导入外部资源、按顺序添加 Pass（setup 立即执行），
//! 最后 `compile` 得到可执行的 [`RgCompiledGraph`]。
//!
//! [`RgCompiledGraph`]: super::RgCompiledGraph

use prism_gfx::buffer::GfxBufferDesc;
use prism_gfx::device::GfxCommandList;
use prism_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use prism_gfx::texture::GfxTextureDesc;

use super::blackboard::RgBlackboard;
use super::builder::RgBuilder;
use super::config::RenderGraphConfig;
use super::context::RgContext;
use super::event::RgEventStack;
use super::handle::{RgBufferId, RgPassId, RgTextureId};
use super::pass::{RgClosureExecutor, RgPass, RgPassExecutor, RgPassExecutorWrapper, RgPassFlags, RgPassNode, RgPassType};
use super::resource_name::RgResourceName;
use super::resource_registry::RgResourceRegistry;

/// RenderGraph 构建阶段
///
/// `'a` 是 Pass 执行闭包可以借用的外部数据的生命周期。
pub struct RenderGraph<'a> {
    pub(crate) config: RenderGraphConfig,

    /// 按声明顺序排列，下标即 [`RgPassId`]
    pub(crate) passes: Vec<RgPassNode>,
    /// 与 `passes` 一一对应
    pub(crate) executors: Vec<Box<dyn RgPassExecutor + 'a>>,

    pub(crate) registry: RgResourceRegistry,
    pub(crate) blackboard: RgBlackboard,
    pub(crate) events: RgEventStack,
}

impl Default for RenderGraph<'_> {
    fn default() -> Self {
        Self::new(RenderGraphConfig::default())
    }
}

// new & init
impl<'a> RenderGraph<'a> {
    pub fn new(config: RenderGraphConfig) -> Self {
        Self {
            config,
            passes: Vec::new(),
            executors: Vec::new(),
            registry: RgResourceRegistry::new(),
            blackboard: RgBlackboard::new(),
            events: RgEventStack::default(),
        }
    }
}

// import
impl<'a> RenderGraph<'a> {
    /// 导入外部纹理
    ///
    /// `desc.initial_state` 是纹理在帧开始时的状态，最后一个使用者之后会转换回这个状态。
    pub fn import_texture(&mut self, name: RgResourceName, texture: GfxTextureHandle, desc: GfxTextureDesc) -> RgTextureId {
        self.registry.import_texture(name, texture, desc)
    }

    /// 导入外部缓冲区，缓冲区总是以 `COMMON` 状态开始和结束一帧
    pub fn import_buffer(&mut self, name: RgResourceName, buffer: GfxBufferHandle, desc: GfxBufferDesc) -> RgBufferId {
        self.registry.import_buffer(name, buffer, desc)
    }
}

// add pass
impl<'a> RenderGraph<'a> {
    /// 添加一个由闭包定义的 Pass
    ///
    /// `setup` 立即执行一次，用来填充 pass 数据 `D` 并声明资源依赖；
    /// `execute` 在 graph 执行时调用。返回 setup 之后的 pass 数据，便于后续 Pass 使用其中的句柄。
    pub fn add_pass<D, S, E>(
        &mut self,
        name: &str,
        pass_type: RgPassType,
        flags: RgPassFlags,
        setup: S,
        execute: E,
    ) -> D
    where
        D: Default + Clone + 'a,
        S: FnOnce(&mut D, &mut RgBuilder),
        E: Fn(&D, &RgContext, &mut dyn GfxCommandList) + 'a,
    {
        let mut data = D::default();
        let mut node = RgPassNode::new(name, pass_type, flags);
        {
            let mut builder = RgBuilder::new(
                RgPassId(self.passes.len()),
                &mut node,
                &mut self.registry,
                &mut self.blackboard,
            );
            setup(&mut data, &mut builder);
        }

        self.passes.push(node);
        self.executors.push(Box::new(RgClosureExecutor {
            data: data.clone(),
            execute,
        }));
        data
    }

    /// 添加实现了 [`RgPass`] 的 Pass
    pub fn add_rg_pass<P: RgPass + 'a>(&mut self, name: &str, mut pass: P) {
        let mut node = RgPassNode::new(name, pass.pass_type(), pass.flags());
        {
            let mut builder = RgBuilder::new(
                RgPassId(self.passes.len()),
                &mut node,
                &mut self.registry,
                &mut self.blackboard,
            );
            pass.setup(&mut builder);
        }

        self.passes.push(node);
        self.executors.push(Box::new(RgPassExecutorWrapper { pass }));
    }
}

// event
impl<'a> RenderGraph<'a> {
    /// 开始一个调试事件区间，覆盖之后添加的 Pass，直到对应的 `pop_event`
    pub fn push_event(&mut self, name: &str) {
        self.events.push(name, self.passes.len());
    }

    pub fn pop_event(&mut self) {
        self.events.pop(self.passes.len());
    }
}

// getter
impl<'a> RenderGraph<'a> {
    #[inline]
    pub fn config(&self) -> &RenderGraphConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &RgResourceRegistry {
        &self.registry
    }

    #[inline]
    pub fn blackboard(&self) -> &RgBlackboard {
        &self.blackboard
    }

    #[inline]
    pub fn blackboard_mut(&mut self) -> &mut RgBlackboard {
        &mut self.blackboard
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn passes(&self) -> &[RgPassNode] {
        &self.passes
    }

    #[inline]
    pub fn is_texture_declared(&self, name: RgResourceName) -> bool {
        self.registry.is_texture_declared(name)
    }

    #[inline]
    pub fn is_buffer_declared(&self, name: RgResourceName) -> bool {
        self.registry.is_buffer_declared(name)
    }
}
