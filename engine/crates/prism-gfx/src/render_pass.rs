use ash::vk;
use glam::Vec4;

use crate::handles::GfxDescriptor;

/// attachment 在 render pass 开始时的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GfxLoadAccess {
    Discard,
    #[default]
    Preserve,
    Clear,
    NoAccess,
}

/// attachment 在 render pass 结束时的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GfxStoreAccess {
    Discard,
    #[default]
    Preserve,
    Resolve,
    NoAccess,
}

impl GfxLoadAccess {
    pub fn to_vk(&self) -> vk::AttachmentLoadOp {
        match self {
            Self::Discard | Self::NoAccess => vk::AttachmentLoadOp::DONT_CARE,
            Self::Preserve => vk::AttachmentLoadOp::LOAD,
            Self::Clear => vk::AttachmentLoadOp::CLEAR,
        }
    }
}

impl GfxStoreAccess {
    pub fn to_vk(&self) -> vk::AttachmentStoreOp {
        match self {
            Self::Discard => vk::AttachmentStoreOp::DONT_CARE,
            Self::Preserve | Self::Resolve => vk::AttachmentStoreOp::STORE,
            Self::NoAccess => vk::AttachmentStoreOp::NONE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GfxColorAttachmentDesc {
    pub descriptor: GfxDescriptor,
    pub load: GfxLoadAccess,
    pub store: GfxStoreAccess,
    pub clear_color: Vec4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GfxDepthAttachmentDesc {
    pub descriptor: GfxDescriptor,
    pub depth_load: GfxLoadAccess,
    pub depth_store: GfxStoreAccess,
    pub stencil_load: GfxLoadAccess,
    pub stencil_store: GfxStoreAccess,
    pub clear_depth: f32,
    pub clear_stencil: u8,
    pub read_only: bool,
}

/// 一次 render pass 的全部 attachment 信息
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GfxRenderPassDesc {
    pub width: u32,
    pub height: u32,
    pub color_attachments: Vec<GfxColorAttachmentDesc>,
    pub depth_attachment: Option<GfxDepthAttachmentDesc>,
    /// 使用传统的 framebuffer 方式而不是 dynamic rendering
    pub legacy: bool,
    pub allow_uav_writes: bool,
}
