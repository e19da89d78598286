//! Pass 执行上下文
//!
//! execute 阶段把 setup 中得到的句柄解析成物理资源和视图。
//! 句柄只能在获取它的 Pass 中解析，且物理资源必须已经分配。

use prism_gfx::buffer::GfxBufferDesc;
use prism_gfx::handles::{GfxBufferHandle, GfxDescriptor, GfxTextureHandle};
use prism_gfx::texture::GfxTextureDesc;

use super::blackboard::RgBlackboard;
use super::buffer_resource::RgBufferResource;
use super::handle::*;
use super::resource_registry::RgResourceRegistry;
use super::texture_resource::RgTextureResource;

pub struct RgContext<'g> {
    pass_id: RgPassId,
    pass_name: &'g str,
    registry: &'g RgResourceRegistry,
    blackboard: &'g RgBlackboard,
}

// new & init
impl<'g> RgContext<'g> {
    pub(crate) fn new(
        pass_id: RgPassId,
        pass_name: &'g str,
        registry: &'g RgResourceRegistry,
        blackboard: &'g RgBlackboard,
    ) -> Self {
        Self {
            pass_id,
            pass_name,
            registry,
            blackboard,
        }
    }
}

// getter
impl<'g> RgContext<'g> {
    #[inline]
    pub fn pass_id(&self) -> RgPassId {
        self.pass_id
    }

    #[inline]
    pub fn pass_name(&self) -> &'g str {
        self.pass_name
    }

    #[inline]
    pub fn blackboard(&self) -> &'g RgBlackboard {
        self.blackboard
    }

    pub fn texture_desc<K: RgAccessKind<Key = RgTextureId>>(&self, handle: RgHandle<K>) -> &'g GfxTextureDesc {
        &self.texture(handle).desc
    }

    pub fn buffer_desc<K: RgAccessKind<Key = RgBufferId>>(&self, handle: RgHandle<K>) -> &'g GfxBufferDesc {
        &self.buffer(handle).desc
    }
}

// texture views
impl RgContext<'_> {
    pub fn read_only_texture(&self, handle: RgTextureReadOnlyId) -> GfxDescriptor {
        self.texture_view(handle)
    }

    pub fn read_write_texture(&self, handle: RgTextureReadWriteId) -> GfxDescriptor {
        self.texture_view(handle)
    }

    pub fn render_target(&self, handle: RgRenderTargetId) -> GfxDescriptor {
        self.texture_view(handle)
    }

    pub fn depth_stencil(&self, handle: RgDepthStencilId) -> GfxDescriptor {
        self.texture_view(handle)
    }

    pub fn copy_src_texture(&self, handle: RgTextureCopySrcId) -> GfxTextureHandle {
        self.physical_texture(handle)
    }

    pub fn copy_dst_texture(&self, handle: RgTextureCopyDstId) -> GfxTextureHandle {
        self.physical_texture(handle)
    }
}

// buffer views
impl RgContext<'_> {
    pub fn read_only_buffer(&self, handle: RgBufferReadOnlyId) -> GfxDescriptor {
        self.buffer_view(handle)
    }

    pub fn read_write_buffer(&self, handle: RgBufferReadWriteId) -> GfxDescriptor {
        self.buffer_view(handle)
    }

    pub fn copy_src_buffer(&self, handle: RgBufferCopySrcId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }

    pub fn copy_dst_buffer(&self, handle: RgBufferCopyDstId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }

    pub fn indirect_args_buffer(&self, handle: RgBufferIndirectArgsId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }

    pub fn vertex_buffer(&self, handle: RgBufferVertexId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }

    pub fn index_buffer(&self, handle: RgBufferIndexId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }

    pub fn constant_buffer(&self, handle: RgBufferConstantId) -> GfxBufferHandle {
        self.physical_buffer(handle)
    }
}

// resolve
impl<'g> RgContext<'g> {
    fn check_handle<K: RgAccessKind>(&self, handle: RgHandle<K>) {
        assert!(handle.is_valid(), "RenderGraph: pass \"{}\" resolves an invalid {}", self.pass_name, K::NAME);
        assert!(
            handle.pass == self.pass_id,
            "RenderGraph: pass \"{}\" resolves {:?} obtained by another pass",
            self.pass_name,
            handle
        );
    }

    fn texture<K: RgAccessKind<Key = RgTextureId>>(&self, handle: RgHandle<K>) -> &'g RgTextureResource {
        self.check_handle(handle);
        self.registry.texture(handle.resource)
    }

    fn buffer<K: RgAccessKind<Key = RgBufferId>>(&self, handle: RgHandle<K>) -> &'g RgBufferResource {
        self.check_handle(handle);
        self.registry.buffer(handle.resource)
    }

    fn physical_texture<K: RgAccessKind<Key = RgTextureId>>(&self, handle: RgHandle<K>) -> GfxTextureHandle {
        let texture = self.texture(handle);
        let Some(physical) = texture.physical else {
            panic!("RenderGraph: texture \"{}\" has no physical resource in pass \"{}\"", texture.name(), self.pass_name);
        };
        physical
    }

    fn physical_buffer<K: RgAccessKind<Key = RgBufferId>>(&self, handle: RgHandle<K>) -> GfxBufferHandle {
        let buffer = self.buffer(handle);
        let Some(physical) = buffer.physical else {
            panic!("RenderGraph: buffer \"{}\" has no physical resource in pass \"{}\"", buffer.name(), self.pass_name);
        };
        physical
    }

    fn texture_view<K: RgAccessKind<Key = RgTextureId>>(&self, handle: RgHandle<K>) -> GfxDescriptor {
        let texture = self.texture(handle);
        let Some(&view) = texture.views.get(handle.view as usize) else {
            panic!("RenderGraph: texture \"{}\" has no view {} in pass \"{}\"", texture.name(), handle.view, self.pass_name);
        };
        view
    }

    fn buffer_view<K: RgAccessKind<Key = RgBufferId>>(&self, handle: RgHandle<K>) -> GfxDescriptor {
        let buffer = self.buffer(handle);
        let Some(&view) = buffer.views.get(handle.view as usize) else {
            panic!("RenderGraph: buffer \"{}\" has no view {} in pass \"{}\"", buffer.name(), handle.view, self.pass_name);
        };
        view
    }
}
