//! Barrier 描述
//!
//! 编译阶段只记录 graph 内部资源的状态转换，执行阶段再映射到物理资源。

use prism_gfx::barrier::GfxBarrier;
use prism_gfx::resource_state::GfxResourceState;

use super::handle::RgResourceKey;
use super::resource_registry::RgResourceRegistry;

/// 单个资源的状态转换
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RgBarrierDesc {
    pub resource: RgResourceKey,
    pub before: GfxResourceState,
    pub after: GfxResourceState,
}

impl RgBarrierDesc {
    #[inline]
    pub fn new(resource: RgResourceKey, before: GfxResourceState, after: GfxResourceState) -> Self {
        Self {
            resource,
            before,
            after,
        }
    }

    /// 状态相同不需要 barrier
    #[inline]
    pub fn needs_barrier(&self) -> bool {
        self.before != self.after
    }

    /// 转换为物理资源的 barrier，资源尚未分配时返回 `None`
    pub fn to_gfx_barrier(&self, registry: &RgResourceRegistry) -> Option<GfxBarrier> {
        match self.resource {
            RgResourceKey::Texture(id) => {
                let texture = registry.texture(id).physical_handle()?;
                Some(GfxBarrier::texture(texture, self.before, self.after))
            }
            RgResourceKey::Buffer(id) => {
                let buffer = registry.buffer(id).physical_handle()?;
                Some(GfxBarrier::buffer(buffer, self.before, self.after))
            }
        }
    }
}

/// 一个 Pass 执行前后需要的 barrier
#[derive(Clone, Debug, Default)]
pub struct RgPassBarriers {
    /// execute 之前
    pub before: Vec<RgBarrierDesc>,
    /// execute 之后，把释放的资源转换回初始状态
    pub after: Vec<RgBarrierDesc>,
}

impl RgPassBarriers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before(&mut self, barrier: RgBarrierDesc) {
        if barrier.needs_barrier() {
            self.before.push(barrier);
        }
    }

    pub fn add_after(&mut self, barrier: RgBarrierDesc) {
        if barrier.needs_barrier() {
            self.after.push(barrier);
        }
    }

    #[inline]
    pub fn has_barriers(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty()
    }
}
