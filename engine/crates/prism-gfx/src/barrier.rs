//! 资源状态转换
//!
//! RenderGraph 只产生 [`GfxBarrier`]，具体的图形后端再把它翻译为 API 相关的 barrier。
//! 这里同时提供到 Vulkan `ImageMemoryBarrier2` / `BufferMemoryBarrier2` 的转换。

use ash::vk;

use crate::handles::{GfxBufferHandle, GfxTextureHandle};
use crate::resource_state::GfxResourceState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GfxBarrierResource {
    Texture(GfxTextureHandle),
    Buffer(GfxBufferHandle),
}

/// 一个资源从 `before` 到 `after` 的状态转换
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxBarrier {
    pub resource: GfxBarrierResource,
    pub before: GfxResourceState,
    pub after: GfxResourceState,
}

// new & init
impl GfxBarrier {
    #[inline]
    pub fn texture(texture: GfxTextureHandle, before: GfxResourceState, after: GfxResourceState) -> Self {
        Self {
            resource: GfxBarrierResource::Texture(texture),
            before,
            after,
        }
    }

    #[inline]
    pub fn buffer(buffer: GfxBufferHandle, before: GfxResourceState, after: GfxResourceState) -> Self {
        Self {
            resource: GfxBarrierResource::Buffer(buffer),
            before,
            after,
        }
    }
}

// vulkan
impl GfxBarrier {
    pub fn to_vk_image_barrier(&self, image: vk::Image, aspect: vk::ImageAspectFlags) -> vk::ImageMemoryBarrier2<'static> {
        let src = self.before.to_vk_image_state();
        let dst = self.after.to_vk_image_state();

        vk::ImageMemoryBarrier2::default()
            .image(image)
            .old_layout(src.layout)
            .new_layout(dst.layout)
            .src_stage_mask(src.stage)
            .src_access_mask(src.src_access())
            .dst_stage_mask(dst.stage)
            .dst_access_mask(dst.access)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            })
    }

    pub fn to_vk_buffer_barrier(&self, buffer: vk::Buffer) -> vk::BufferMemoryBarrier2<'static> {
        let src = self.before.to_vk_image_state();
        let dst = self.after.to_vk_image_state();

        vk::BufferMemoryBarrier2::default()
            .buffer(buffer)
            .offset(0)
            .size(vk::WHOLE_SIZE)
            .src_stage_mask(src.stage)
            .src_access_mask(src.src_access())
            .dst_stage_mask(dst.stage)
            .dst_access_mask(dst.access)
    }
}
