use std::collections::HashMap;

use prism_gfx::buffer::GfxBufferDesc;
use prism_gfx::flags::GfxBindFlags;
use prism_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use prism_gfx::texture::GfxTextureDesc;
use slotmap::SlotMap;

use super::buffer_resource::RgBufferResource;
use super::handle::{RgBufferId, RgTextureId};
use super::resource_name::RgResourceName;
use super::texture_resource::RgTextureResource;

/// 资源注册表
///
/// 管理 RenderGraph 中所有声明和导入的资源，按名字查找资源 id。
/// 一帧之内资源条目不会被移除。
#[derive(Default)]
pub struct RgResourceRegistry {
    textures: SlotMap<RgTextureId, RgTextureResource>,
    buffers: SlotMap<RgBufferId, RgBufferResource>,

    texture_names: HashMap<RgResourceName, RgTextureId>,
    buffer_names: HashMap<RgResourceName, RgBufferId>,
}

// new & init
impl RgResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

// register
impl RgResourceRegistry {
    /// 声明临时纹理
    ///
    /// 用相同的描述重复声明同一个名字会返回已有的 id；描述不同，或者名字属于导入的纹理时 panic。
    pub fn declare_texture(&mut self, name: RgResourceName, desc: GfxTextureDesc) -> RgTextureId {
        if let Some(&id) = self.texture_names.get(&name) {
            let existing = &self.textures[id];
            assert!(!existing.is_imported(), "RenderGraph: cannot declare texture \"{name}\", it is an imported texture");
            assert!(
                existing.declared_desc == desc,
                "RenderGraph: texture \"{name}\" re-declared with a different desc\n  old: {:?}\n  new: {:?}",
                existing.declared_desc,
                desc
            );
            return id;
        }

        let id = self.textures.insert(RgTextureResource::transient(name, desc));
        self.texture_names.insert(name, id);
        id
    }

    pub fn declare_buffer(&mut self, name: RgResourceName, desc: GfxBufferDesc) -> RgBufferId {
        if let Some(&id) = self.buffer_names.get(&name) {
            let existing = &self.buffers[id];
            assert!(!existing.is_imported(), "RenderGraph: cannot declare buffer \"{name}\", it is an imported buffer");
            assert!(
                existing.declared_desc == desc,
                "RenderGraph: buffer \"{name}\" re-declared with a different desc\n  old: {:?}\n  new: {:?}",
                existing.declared_desc,
                desc
            );
            return id;
        }

        let id = self.buffers.insert(RgBufferResource::transient(name, desc));
        self.buffer_names.insert(name, id);
        id
    }

    /// 导入外部纹理，`desc.initial_state` 为纹理在帧开始时的状态
    pub fn import_texture(&mut self, name: RgResourceName, texture: GfxTextureHandle, desc: GfxTextureDesc) -> RgTextureId {
        assert!(!self.texture_names.contains_key(&name), "RenderGraph: texture \"{name}\" is already declared");
        let id = self.textures.insert(RgTextureResource::imported(name, texture, desc));
        self.texture_names.insert(name, id);
        id
    }

    pub fn import_buffer(&mut self, name: RgResourceName, buffer: GfxBufferHandle, desc: GfxBufferDesc) -> RgBufferId {
        assert!(!self.buffer_names.contains_key(&name), "RenderGraph: buffer \"{name}\" is already declared");
        let id = self.buffers.insert(RgBufferResource::imported(name, buffer, desc));
        self.buffer_names.insert(name, id);
        id
    }

    pub fn add_texture_bind_flags(&mut self, name: RgResourceName, flags: GfxBindFlags) {
        let id = self.texture_id(name);
        self.textures[id].desc.bind_flags |= flags;
    }

    pub fn add_buffer_bind_flags(&mut self, name: RgResourceName, flags: GfxBindFlags) {
        let id = self.buffer_id(name);
        self.buffers[id].desc.bind_flags |= flags;
    }
}

// getter & iter
impl RgResourceRegistry {
    #[inline]
    pub fn is_texture_declared(&self, name: RgResourceName) -> bool {
        self.texture_names.contains_key(&name)
    }

    #[inline]
    pub fn is_buffer_declared(&self, name: RgResourceName) -> bool {
        self.buffer_names.contains_key(&name)
    }

    /// 名字没有声明时 panic
    pub fn texture_id(&self, name: RgResourceName) -> RgTextureId {
        match self.texture_names.get(&name) {
            Some(&id) => id,
            None => panic!("RenderGraph: texture \"{name}\" has not been declared"),
        }
    }

    pub fn buffer_id(&self, name: RgResourceName) -> RgBufferId {
        match self.buffer_names.get(&name) {
            Some(&id) => id,
            None => panic!("RenderGraph: buffer \"{name}\" has not been declared"),
        }
    }

    #[inline]
    pub fn texture(&self, id: RgTextureId) -> &RgTextureResource {
        &self.textures[id]
    }

    #[inline]
    pub fn texture_mut(&mut self, id: RgTextureId) -> &mut RgTextureResource {
        &mut self.textures[id]
    }

    #[inline]
    pub fn buffer(&self, id: RgBufferId) -> &RgBufferResource {
        &self.buffers[id]
    }

    #[inline]
    pub fn buffer_mut(&mut self, id: RgBufferId) -> &mut RgBufferResource {
        &mut self.buffers[id]
    }

    pub fn texture_by_name(&self, name: RgResourceName) -> Option<&RgTextureResource> {
        self.texture_names.get(&name).map(|&id| &self.textures[id])
    }

    pub fn buffer_by_name(&self, name: RgResourceName) -> Option<&RgBufferResource> {
        self.buffer_names.get(&name).map(|&id| &self.buffers[id])
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// 按声明顺序迭代
    #[inline]
    pub fn iter_textures(&self) -> impl Iterator<Item = (RgTextureId, &RgTextureResource)> {
        self.textures.iter()
    }

    #[inline]
    pub fn iter_buffers(&self) -> impl Iterator<Item = (RgBufferId, &RgBufferResource)> {
        self.buffers.iter()
    }

    #[inline]
    pub(crate) fn iter_textures_mut(&mut self) -> impl Iterator<Item = (RgTextureId, &mut RgTextureResource)> {
        self.textures.iter_mut()
    }

    #[inline]
    pub(crate) fn iter_buffers_mut(&mut self) -> impl Iterator<Item = (RgBufferId, &mut RgBufferResource)> {
        self.buffers.iter_mut()
    }
}
