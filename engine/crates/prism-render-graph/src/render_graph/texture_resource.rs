use prism_gfx::handles::{GfxDescriptor, GfxTextureHandle, GfxViewType};
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::{GfxTextureDesc, GfxTextureSubresourceDesc};

use super::resource::RgResourceInfo;
use super::resource_name::RgResourceName;

/// 纹理资源的来源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RgTextureSource {
    /// 从外部导入的纹理，graph 不负责销毁
    Imported(GfxTextureHandle),
    /// 由 RenderGraph 从资源池分配的临时纹理
    Transient,
}

/// 纹理视图请求，同一个 (子资源, 视图类型) 只会创建一次
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgTextureViewDesc {
    pub desc: GfxTextureSubresourceDesc,
    pub view_type: GfxViewType,
}

/// 纹理资源条目
#[derive(Clone, Debug)]
pub struct RgTextureResource {
    pub info: RgResourceInfo,
    pub source: RgTextureSource,
    /// 实际用于创建的描述，使用过程中会累积 bind flags 并提升初始状态
    pub desc: GfxTextureDesc,
    /// 声明时的描述，用于判断重复声明是否一致
    pub(crate) declared_desc: GfxTextureDesc,

    pub(crate) view_descs: Vec<RgTextureViewDesc>,
    /// 执行期间创建的视图，与 `view_descs` 一一对应
    pub(crate) views: Vec<GfxDescriptor>,
    /// 执行期间的物理纹理
    pub(crate) physical: Option<GfxTextureHandle>,
}

// new & init
impl RgTextureResource {
    pub fn transient(name: RgResourceName, desc: GfxTextureDesc) -> Self {
        Self {
            info: RgResourceInfo::new(name, false),
            source: RgTextureSource::Transient,
            desc,
            declared_desc: desc,
            view_descs: Vec::new(),
            views: Vec::new(),
            physical: None,
        }
    }

    /// `desc.initial_state` 是帧开始时外部纹理所处的状态
    pub fn imported(name: RgResourceName, texture: GfxTextureHandle, desc: GfxTextureDesc) -> Self {
        Self {
            info: RgResourceInfo::new(name, true),
            source: RgTextureSource::Imported(texture),
            desc,
            declared_desc: desc,
            view_descs: Vec::new(),
            views: Vec::new(),
            physical: Some(texture),
        }
    }
}

// getter
impl RgTextureResource {
    #[inline]
    pub fn name(&self) -> RgResourceName {
        self.info.name
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.info.imported
    }

    #[inline]
    pub fn physical_handle(&self) -> Option<GfxTextureHandle> {
        self.physical
    }

    #[inline]
    pub fn view_descs(&self) -> &[RgTextureViewDesc] {
        &self.view_descs
    }
}

// usage
impl RgTextureResource {
    /// 返回视图下标，相同的请求复用同一个视图
    pub(crate) fn view_index(&mut self, desc: GfxTextureSubresourceDesc, view_type: GfxViewType) -> u32 {
        let view_desc = RgTextureViewDesc { desc, view_type };
        match self.view_descs.iter().position(|v| *v == view_desc) {
            Some(index) => index as u32,
            None => {
                self.view_descs.push(view_desc);
                (self.view_descs.len() - 1) as u32
            }
        }
    }

    /// 初始状态为 `COMMON` 的临时纹理，在第一次带状态的使用时提升为该状态，
    /// 这样分配出来的纹理不需要额外的 barrier
    pub(crate) fn promote_initial_state(&mut self, state: GfxResourceState) {
        if !self.info.imported && self.desc.initial_state == GfxResourceState::COMMON {
            self.desc.initial_state = state;
        }
    }
}
