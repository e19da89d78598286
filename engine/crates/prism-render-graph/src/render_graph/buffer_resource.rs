use prism_gfx::buffer::{GfxBufferDesc, GfxBufferSubresourceDesc};
use prism_gfx::handles::{GfxBufferHandle, GfxDescriptor, GfxViewType};

use super::handle::RgBufferId;
use super::resource::RgResourceInfo;
use super::resource_name::RgResourceName;

/// 缓冲区资源的来源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RgBufferSource {
    Imported(GfxBufferHandle),
    Transient,
}

/// 缓冲区视图请求；UAV 可以附带 counter 缓冲区
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgBufferViewDesc {
    pub desc: GfxBufferSubresourceDesc,
    pub view_type: GfxViewType,
    pub counter: Option<RgBufferId>,
}

/// 缓冲区资源条目
///
/// 缓冲区总是以 `COMMON` 状态开始和结束一帧。
#[derive(Clone, Debug)]
pub struct RgBufferResource {
    pub info: RgResourceInfo,
    pub source: RgBufferSource,
    pub desc: GfxBufferDesc,
    pub(crate) declared_desc: GfxBufferDesc,

    pub(crate) view_descs: Vec<RgBufferViewDesc>,
    pub(crate) views: Vec<GfxDescriptor>,
    pub(crate) physical: Option<GfxBufferHandle>,
}

// new & init
impl RgBufferResource {
    pub fn transient(name: RgResourceName, desc: GfxBufferDesc) -> Self {
        Self {
            info: RgResourceInfo::new(name, false),
            source: RgBufferSource::Transient,
            desc,
            declared_desc: desc,
            view_descs: Vec::new(),
            views: Vec::new(),
            physical: None,
        }
    }

    pub fn imported(name: RgResourceName, buffer: GfxBufferHandle, desc: GfxBufferDesc) -> Self {
        Self {
            info: RgResourceInfo::new(name, true),
            source: RgBufferSource::Imported(buffer),
            desc,
            declared_desc: desc,
            view_descs: Vec::new(),
            views: Vec::new(),
            physical: Some(buffer),
        }
    }
}

// getter
impl RgBufferResource {
    #[inline]
    pub fn name(&self) -> RgResourceName {
        self.info.name
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.info.imported
    }

    #[inline]
    pub fn physical_handle(&self) -> Option<GfxBufferHandle> {
        self.physical
    }

    #[inline]
    pub fn view_descs(&self) -> &[RgBufferViewDesc] {
        &self.view_descs
    }
}

impl RgBufferResource {
    /// 返回视图下标，(子资源, 视图类型, counter) 相同的请求复用同一个视图
    pub(crate) fn view_index(
        &mut self,
        desc: GfxBufferSubresourceDesc,
        view_type: GfxViewType,
        counter: Option<RgBufferId>,
    ) -> u32 {
        let view_desc = RgBufferViewDesc {
            desc,
            view_type,
            counter,
        };
        match self.view_descs.iter().position(|v| *v == view_desc) {
            Some(index) => index as u32,
            None => {
                self.view_descs.push(view_desc);
                (self.view_descs.len() - 1) as u32
            }
        }
    }
}
