//! 资源状态定义
//!
//! [`GfxResourceState`] 描述资源在某个 Pass 中被使用的方式，RenderGraph 以此推导 barrier。
//! 状态可以通过 [`GfxResourceState::to_vk_image_state`] 转换为 Vulkan 的 stage、access、layout 组合。

use ash::vk;
use bitflags::bitflags;

bitflags! {
    /// 资源状态
    ///
    /// `COMMON` 为 0，表示资源可以被任意队列以任意方式访问的通用状态。
    /// 多个只读状态可以组合；写状态必须单独出现。
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GfxResourceState: u32 {
        const COMMON = 0;
        const VERTEX_AND_CONSTANT_BUFFER = 1 << 0;
        const INDEX_BUFFER = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
        const DEPTH_WRITE = 1 << 4;
        const DEPTH_READ = 1 << 5;
        const NON_PIXEL_SHADER_RESOURCE = 1 << 6;
        const PIXEL_SHADER_RESOURCE = 1 << 7;
        const INDIRECT_ARGUMENT = 1 << 8;
        const COPY_DEST = 1 << 9;
        const COPY_SOURCE = 1 << 10;
        const RESOLVE_DEST = 1 << 11;
        const RESOLVE_SOURCE = 1 << 12;

        const ALL_SHADER_RESOURCE = Self::NON_PIXEL_SHADER_RESOURCE.bits() | Self::PIXEL_SHADER_RESOURCE.bits();
        const GENERIC_READ = Self::VERTEX_AND_CONSTANT_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::NON_PIXEL_SHADER_RESOURCE.bits()
            | Self::PIXEL_SHADER_RESOURCE.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::COPY_SOURCE.bits();
    }
}

impl GfxResourceState {
    const WRITE_STATES: Self = Self::RENDER_TARGET
        .union(Self::UNORDERED_ACCESS)
        .union(Self::DEPTH_WRITE)
        .union(Self::COPY_DEST)
        .union(Self::RESOLVE_DEST);

    /// 检查是否包含写状态
    #[inline]
    pub fn is_write(&self) -> bool {
        self.intersects(Self::WRITE_STATES)
    }

    /// 检查是否为只读状态（`COMMON` 也视为只读）
    #[inline]
    pub fn is_read_only(&self) -> bool {
        !self.is_write()
    }

    /// 写状态不能与其他任何状态组合
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.is_write() || self.bits().count_ones() == 1
    }
}

/// Vulkan 侧的资源状态：pipeline stage、access mask 和 image layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxVkImageState {
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
    pub layout: vk::ImageLayout,
}

impl GfxVkImageState {
    #[inline]
    pub const fn new(stage: vk::PipelineStageFlags2, access: vk::AccessFlags2, layout: vk::ImageLayout) -> Self {
        Self { stage, access, layout }
    }

    /// 用于 barrier src 的 access（去掉读操作）
    #[inline]
    pub fn src_access(&self) -> vk::AccessFlags2 {
        self.access
            & !(vk::AccessFlags2::SHADER_SAMPLED_READ
                | vk::AccessFlags2::SHADER_STORAGE_READ
                | vk::AccessFlags2::UNIFORM_READ
                | vk::AccessFlags2::VERTEX_ATTRIBUTE_READ
                | vk::AccessFlags2::INDEX_READ
                | vk::AccessFlags2::INDIRECT_COMMAND_READ
                | vk::AccessFlags2::COLOR_ATTACHMENT_READ
                | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags2::TRANSFER_READ
                | vk::AccessFlags2::MEMORY_READ)
    }
}

// vulkan 转换
impl GfxResourceState {
    /// 通用状态：任何 stage 都可能访问
    const VK_COMMON: GfxVkImageState = GfxVkImageState::new(
        vk::PipelineStageFlags2::ALL_COMMANDS,
        vk::AccessFlags2::from_raw(vk::AccessFlags2::MEMORY_READ.as_raw() | vk::AccessFlags2::MEMORY_WRITE.as_raw()),
        vk::ImageLayout::GENERAL,
    );

    /// 单个状态位对应的 stage 与 access
    fn vk_stage_access(flag: Self) -> (vk::PipelineStageFlags2, vk::AccessFlags2) {
        type S = vk::PipelineStageFlags2;
        type A = vk::AccessFlags2;
        match flag {
            Self::VERTEX_AND_CONSTANT_BUFFER => (
                S::VERTEX_INPUT | S::VERTEX_SHADER | S::FRAGMENT_SHADER | S::COMPUTE_SHADER,
                A::VERTEX_ATTRIBUTE_READ | A::UNIFORM_READ,
            ),
            Self::INDEX_BUFFER => (S::INDEX_INPUT, A::INDEX_READ),
            Self::RENDER_TARGET => {
                (S::COLOR_ATTACHMENT_OUTPUT, A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE)
            }
            Self::UNORDERED_ACCESS => (
                S::COMPUTE_SHADER | S::FRAGMENT_SHADER,
                A::SHADER_STORAGE_READ | A::SHADER_STORAGE_WRITE,
            ),
            Self::DEPTH_WRITE => (
                S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ),
            Self::DEPTH_READ => (S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS, A::DEPTH_STENCIL_ATTACHMENT_READ),
            Self::NON_PIXEL_SHADER_RESOURCE => (S::VERTEX_SHADER | S::COMPUTE_SHADER, A::SHADER_SAMPLED_READ),
            Self::PIXEL_SHADER_RESOURCE => (S::FRAGMENT_SHADER, A::SHADER_SAMPLED_READ),
            Self::INDIRECT_ARGUMENT => (S::DRAW_INDIRECT, A::INDIRECT_COMMAND_READ),
            Self::COPY_DEST => (S::COPY, A::TRANSFER_WRITE),
            Self::COPY_SOURCE => (S::COPY, A::TRANSFER_READ),
            Self::RESOLVE_DEST => (S::RESOLVE, A::TRANSFER_WRITE),
            Self::RESOLVE_SOURCE => (S::RESOLVE, A::TRANSFER_READ),
            _ => (S::NONE, A::NONE),
        }
    }

    /// 单个状态位对应的 image layout
    fn vk_layout(flag: Self) -> vk::ImageLayout {
        match flag {
            Self::RENDER_TARGET => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            Self::DEPTH_WRITE => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            Self::DEPTH_READ => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            Self::NON_PIXEL_SHADER_RESOURCE | Self::PIXEL_SHADER_RESOURCE => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            Self::COPY_DEST | Self::RESOLVE_DEST => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            Self::COPY_SOURCE | Self::RESOLVE_SOURCE => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            _ => vk::ImageLayout::GENERAL,
        }
    }

    /// 转换为 Vulkan 的 stage、access、layout
    ///
    /// 组合状态的 stage/access 取并集；layout 不一致时退化为 `GENERAL`，
    /// 但深度只读与着色器读取的组合仍然使用 `DEPTH_STENCIL_READ_ONLY_OPTIMAL`。
    pub fn to_vk_image_state(&self) -> GfxVkImageState {
        if self.is_empty() {
            return Self::VK_COMMON;
        }

        let mut stage = vk::PipelineStageFlags2::NONE;
        let mut access = vk::AccessFlags2::NONE;
        let mut layout = None;
        for flag in self.iter() {
            let (flag_stage, flag_access) = Self::vk_stage_access(flag);
            stage |= flag_stage;
            access |= flag_access;

            let flag_layout = Self::vk_layout(flag);
            layout = match layout {
                None => Some(flag_layout),
                Some(l) if l == flag_layout => Some(l),
                Some(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
                    if flag_layout == vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL =>
                {
                    Some(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
                }
                Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                    if flag_layout == vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL =>
                {
                    Some(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
                }
                Some(_) => Some(vk::ImageLayout::GENERAL),
            };
        }

        GfxVkImageState::new(stage, access, layout.unwrap_or(vk::ImageLayout::GENERAL))
    }
}
