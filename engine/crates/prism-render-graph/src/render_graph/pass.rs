//! Pass 定义
//!
//! 每个 Pass 分为两个阶段：
//! - setup：通过 [`RgBuilder`] 声明资源依赖，在 `add_pass` 时立即执行一次
//! - execute：通过 [`RgContext`] 解析资源，在 graph 执行时录制命令
//!
//! 可以直接传入两个闭包（[`RenderGraph::add_pass`]），也可以实现 [`RgPass`] trait。
//!
//! [`RenderGraph::add_pass`]: super::RenderGraph::add_pass

use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use prism_gfx::device::GfxCommandList;
use prism_gfx::render_pass::{GfxLoadAccess, GfxStoreAccess};
use prism_gfx::resource_state::GfxResourceState;

use super::builder::RgBuilder;
use super::context::RgContext;
use super::handle::{RgBufferId, RgDepthStencilId, RgRenderTargetId, RgTextureId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RgPassType {
    #[default]
    Graphics,
    Compute,
    /// 只对设备层有意义，graph 仍然按顺序执行
    ComputeAsync,
    Copy,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RgPassFlags: u32 {
        /// 即使输出没有被使用也不剔除
        const FORCE_NO_CULL = 1 << 0;
        const LEGACY_RENDER_PASS = 1 << 1;
        /// Graphics pass 不自动开始 render pass
        const SKIP_AUTO_RENDER_PASS = 1 << 2;
        const ALLOW_UAV_WRITES = 1 << 3;
        /// 写入未在本 Pass 声明的资源时，不附带隐式读取
        const ACT_AS_CREATOR_WHEN_WRITING = 1 << 4;
    }
}

/// Graphics pass 中着色器读取发生的阶段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RgReadAccess {
    #[default]
    PixelShader,
    NonPixelShader,
    AllShader,
}

impl RgReadAccess {
    #[inline]
    pub fn to_state(&self) -> GfxResourceState {
        match self {
            Self::PixelShader => GfxResourceState::PIXEL_SHADER_RESOURCE,
            Self::NonPixelShader => GfxResourceState::NON_PIXEL_SHADER_RESOURCE,
            Self::AllShader => GfxResourceState::ALL_SHADER_RESOURCE,
        }
    }
}

/// attachment 的 load / store 操作
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RgLoadStoreAccessOp {
    pub load: GfxLoadAccess,
    pub store: GfxStoreAccess,
}

impl RgLoadStoreAccessOp {
    pub const CLEAR_PRESERVE: Self = Self::new(GfxLoadAccess::Clear, GfxStoreAccess::Preserve);
    pub const CLEAR_DISCARD: Self = Self::new(GfxLoadAccess::Clear, GfxStoreAccess::Discard);
    pub const CLEAR_RESOLVE: Self = Self::new(GfxLoadAccess::Clear, GfxStoreAccess::Resolve);
    pub const PRESERVE_PRESERVE: Self = Self::new(GfxLoadAccess::Preserve, GfxStoreAccess::Preserve);
    pub const PRESERVE_DISCARD: Self = Self::new(GfxLoadAccess::Preserve, GfxStoreAccess::Discard);
    pub const PRESERVE_RESOLVE: Self = Self::new(GfxLoadAccess::Preserve, GfxStoreAccess::Resolve);
    pub const DISCARD_PRESERVE: Self = Self::new(GfxLoadAccess::Discard, GfxStoreAccess::Preserve);
    pub const DISCARD_DISCARD: Self = Self::new(GfxLoadAccess::Discard, GfxStoreAccess::Discard);
    pub const NO_ACCESS: Self = Self::new(GfxLoadAccess::NoAccess, GfxStoreAccess::NoAccess);

    #[inline]
    pub const fn new(load: GfxLoadAccess, store: GfxStoreAccess) -> Self {
        Self { load, store }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RgRenderTargetInfo {
    pub handle: RgRenderTargetId,
    pub access: RgLoadStoreAccessOp,
}

#[derive(Clone, Copy, Debug)]
pub struct RgDepthStencilInfo {
    pub handle: RgDepthStencilId,
    pub depth_access: RgLoadStoreAccessOp,
    pub stencil_access: RgLoadStoreAccessOp,
    pub read_only: bool,
}

/// Pass 节点数据
///
/// setup 阶段由 [`RgBuilder`] 填充，compile 阶段补充剔除、生命周期与事件信息。
/// 集合都保持插入顺序，保证 barrier 的顺序稳定。
pub struct RgPassNode {
    pub name: String,
    pub pass_type: RgPassType,
    pub flags: RgPassFlags,

    pub(crate) texture_creates: IndexSet<RgTextureId>,
    pub(crate) texture_reads: IndexSet<RgTextureId>,
    pub(crate) texture_writes: IndexSet<RgTextureId>,
    /// 由写入带来的隐式读取，是 `texture_reads` 的子集
    pub(crate) implicit_texture_reads: IndexSet<RgTextureId>,
    pub(crate) texture_states: IndexMap<RgTextureId, GfxResourceState>,

    pub(crate) buffer_creates: IndexSet<RgBufferId>,
    pub(crate) buffer_reads: IndexSet<RgBufferId>,
    pub(crate) buffer_writes: IndexSet<RgBufferId>,
    pub(crate) implicit_buffer_reads: IndexSet<RgBufferId>,
    pub(crate) buffer_states: IndexMap<RgBufferId, GfxResourceState>,

    pub(crate) render_targets: Vec<RgRenderTargetInfo>,
    pub(crate) depth_stencil: Option<RgDepthStencilInfo>,
    pub(crate) viewport: (u32, u32),

    // compile 阶段填充
    pub(crate) ref_count: u32,
    pub(crate) culled: bool,
    /// 在这里分配物理资源（第一次使用）
    pub(crate) texture_allocates: IndexSet<RgTextureId>,
    pub(crate) buffer_allocates: IndexSet<RgBufferId>,
    /// 在这里释放物理资源（最后一次使用）
    pub(crate) texture_destroys: IndexSet<RgTextureId>,
    pub(crate) buffer_destroys: IndexSet<RgBufferId>,
    /// 在这个 Pass 之前开始的事件（下标指向 graph 的事件列表）
    pub(crate) begin_events: Vec<usize>,
    /// 在这个 Pass 之后结束的事件数量
    pub(crate) end_event_count: usize,
}

// new & init
impl RgPassNode {
    pub(crate) fn new(name: impl Into<String>, pass_type: RgPassType, flags: RgPassFlags) -> Self {
        Self {
            name: name.into(),
            pass_type,
            flags,
            texture_creates: IndexSet::new(),
            texture_reads: IndexSet::new(),
            texture_writes: IndexSet::new(),
            implicit_texture_reads: IndexSet::new(),
            texture_states: IndexMap::new(),
            buffer_creates: IndexSet::new(),
            buffer_reads: IndexSet::new(),
            buffer_writes: IndexSet::new(),
            implicit_buffer_reads: IndexSet::new(),
            buffer_states: IndexMap::new(),
            render_targets: Vec::new(),
            depth_stencil: None,
            viewport: (0, 0),
            ref_count: 0,
            culled: false,
            texture_allocates: IndexSet::new(),
            buffer_allocates: IndexSet::new(),
            texture_destroys: IndexSet::new(),
            buffer_destroys: IndexSet::new(),
            begin_events: Vec::new(),
            end_event_count: 0,
        }
    }
}

// getter
impl RgPassNode {
    #[inline]
    pub fn can_be_culled(&self) -> bool {
        !self.flags.contains(RgPassFlags::FORCE_NO_CULL)
    }

    /// compile 之后才有意义
    #[inline]
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    #[inline]
    pub fn render_targets(&self) -> &[RgRenderTargetInfo] {
        &self.render_targets
    }

    #[inline]
    pub fn depth_stencil(&self) -> Option<&RgDepthStencilInfo> {
        self.depth_stencil.as_ref()
    }

    #[inline]
    pub fn texture_reads(&self) -> &IndexSet<RgTextureId> {
        &self.texture_reads
    }

    #[inline]
    pub fn texture_writes(&self) -> &IndexSet<RgTextureId> {
        &self.texture_writes
    }

    #[inline]
    pub fn buffer_reads(&self) -> &IndexSet<RgBufferId> {
        &self.buffer_reads
    }

    #[inline]
    pub fn buffer_writes(&self) -> &IndexSet<RgBufferId> {
        &self.buffer_writes
    }

    #[inline]
    pub fn texture_state(&self, texture: RgTextureId) -> Option<GfxResourceState> {
        self.texture_states.get(&texture).copied()
    }

    #[inline]
    pub fn buffer_state(&self, buffer: RgBufferId) -> Option<GfxResourceState> {
        self.buffer_states.get(&buffer).copied()
    }

    #[inline]
    pub fn has_writes(&self) -> bool {
        !self.texture_writes.is_empty() || !self.buffer_writes.is_empty()
    }

    #[inline]
    pub fn has_reads(&self) -> bool {
        !self.texture_reads.is_empty() || !self.buffer_reads.is_empty()
    }
}

/// RgPass trait
///
/// 定义渲染图中的一个 Pass。setup 中声明的句柄保存在 Pass 自身，execute 时再解析。
///
/// ```ignore
/// struct BlurPass {
///     input: RgTextureReadOnlyId,
///     output: RgTextureReadWriteId,
/// }
///
/// impl RgPass for BlurPass {
///     fn pass_type(&self) -> RgPassType {
///         RgPassType::Compute
///     }
///
///     fn setup(&mut self, builder: &mut RgBuilder) {
///         self.input = builder.read_texture(rg_name!("HDR"), RgReadAccess::NonPixelShader, Default::default());
///         self.output = builder.write_texture(rg_name!("Blurred"), Default::default());
///     }
///
///     fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList) {
///         let input = ctx.read_only_texture(self.input);
///         let output = ctx.read_write_texture(self.output);
///         // 绑定描述符, dispatch...
///         cmd.dispatch(80, 45, 1);
///     }
/// }
/// ```
///
/// # 线程安全
///
/// Pass 不需要是 Send + Sync，RenderGraph 只在单线程中使用。
pub trait RgPass {
    fn pass_type(&self) -> RgPassType {
        RgPassType::Graphics
    }

    fn flags(&self) -> RgPassFlags {
        RgPassFlags::empty()
    }

    /// 声明 Pass 的资源依赖
    fn setup(&mut self, builder: &mut RgBuilder);

    /// 录制命令，graph 已经插入了需要的 barrier
    fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList);
}

/// 类型擦除的 Pass 执行器
pub(crate) trait RgPassExecutor {
    fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList);
}

/// 包装 [`RgPass`] 实现
pub(crate) struct RgPassExecutorWrapper<P: RgPass> {
    pub pass: P,
}

impl<P: RgPass> RgPassExecutor for RgPassExecutorWrapper<P> {
    fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList) {
        self.pass.execute(ctx, cmd);
    }
}

/// 包装 pass 数据与 execute 闭包
pub(crate) struct RgClosureExecutor<D, F> {
    pub data: D,
    pub execute: F,
}

impl<D, F> RgPassExecutor for RgClosureExecutor<D, F>
where
    F: Fn(&D, &RgContext, &mut dyn GfxCommandList),
{
    fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList) {
        (self.execute)(&self.data, ctx, cmd);
    }
}
