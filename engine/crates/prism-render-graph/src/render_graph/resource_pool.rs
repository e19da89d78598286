//! 跨帧的物理资源池
//!
//! 临时资源在第一次使用时从池中取出，最后一次使用后归还。
//! 同一帧内生命周期不重叠的兼容资源会复用同一个物理资源，
//! 闲置超过若干帧的资源在 `tick` 时销毁。

use anyhow::Context;
use prism_gfx::buffer::GfxBufferDesc;
use prism_gfx::device::GfxDevice;
use prism_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::GfxTextureDesc;

struct RgPooledTexture {
    handle: GfxTextureHandle,
    desc: GfxTextureDesc,
    /// 归还时纹理所处的状态，下次取出时由 graph 转换到需要的初始状态
    state: GfxResourceState,
    last_used_frame: u64,
    active: bool,
}

struct RgPooledBuffer {
    handle: GfxBufferHandle,
    desc: GfxBufferDesc,
    last_used_frame: u64,
    active: bool,
}

pub struct RgResourcePool {
    textures: Vec<RgPooledTexture>,
    buffers: Vec<RgPooledBuffer>,
    frame_index: u64,
    eviction_frames: u64,
}

impl Default for RgResourcePool {
    fn default() -> Self {
        Self::new(3)
    }
}

// new & init
impl RgResourcePool {
    pub fn new(eviction_frames: u64) -> Self {
        Self {
            textures: Vec::new(),
            buffers: Vec::new(),
            frame_index: 0,
            eviction_frames,
        }
    }

    /// 销毁所有资源，包括仍在使用中的
    pub fn destroy(&mut self, device: &mut dyn GfxDevice) {
        for texture in self.textures.drain(..) {
            device.destroy_texture(texture.handle);
        }
        for buffer in self.buffers.drain(..) {
            device.destroy_buffer(buffer.handle);
        }
    }
}

// tick
impl RgResourcePool {
    /// 销毁闲置太久的资源，然后进入下一帧
    pub fn tick(&mut self, device: &mut dyn GfxDevice) {
        let _span = prism_crate_tools::profile_scope!("RgResourcePool::tick");

        let frame_index = self.frame_index;
        let eviction_frames = self.eviction_frames;
        let is_stale = |active: bool, last_used_frame: u64| !active && last_used_frame + eviction_frames < frame_index;

        let mut i = 0;
        while i < self.textures.len() {
            if is_stale(self.textures[i].active, self.textures[i].last_used_frame) {
                let texture = self.textures.swap_remove(i);
                log::debug!("RgResourcePool: evict texture {:?}", texture.handle);
                device.destroy_texture(texture.handle);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.buffers.len() {
            if is_stale(self.buffers[i].active, self.buffers[i].last_used_frame) {
                let buffer = self.buffers.swap_remove(i);
                log::debug!("RgResourcePool: evict buffer {:?}", buffer.handle);
                device.destroy_buffer(buffer.handle);
            } else {
                i += 1;
            }
        }

        self.frame_index += 1;
    }
}

// allocate & release
impl RgResourcePool {
    /// 取出一个闲置的兼容纹理，没有则创建
    ///
    /// 返回纹理以及它当前所处的状态
    pub fn allocate_texture(
        &mut self,
        device: &mut dyn GfxDevice,
        desc: &GfxTextureDesc,
        name: &str,
    ) -> anyhow::Result<(GfxTextureHandle, GfxResourceState)> {
        if let Some(pooled) = self.textures.iter_mut().find(|t| !t.active && t.desc.is_compatible(desc)) {
            pooled.active = true;
            pooled.last_used_frame = self.frame_index;
            return Ok((pooled.handle, pooled.state));
        }

        let handle = device
            .create_texture(desc, name)
            .with_context(|| format!("failed to create pooled texture \"{name}\""))?;
        self.textures.push(RgPooledTexture {
            handle,
            desc: *desc,
            state: desc.initial_state,
            last_used_frame: self.frame_index,
            active: true,
        });
        Ok((handle, desc.initial_state))
    }

    /// 归还纹理，`state` 是归还时纹理所处的状态
    pub fn release_texture(&mut self, handle: GfxTextureHandle, state: GfxResourceState) {
        if let Some(pooled) = self.textures.iter_mut().find(|t| t.active && t.handle == handle) {
            pooled.active = false;
            pooled.state = state;
        }
    }

    pub fn allocate_buffer(
        &mut self,
        device: &mut dyn GfxDevice,
        desc: &GfxBufferDesc,
        name: &str,
    ) -> anyhow::Result<GfxBufferHandle> {
        if let Some(pooled) = self.buffers.iter_mut().find(|b| !b.active && b.desc.is_compatible(desc)) {
            pooled.active = true;
            pooled.last_used_frame = self.frame_index;
            return Ok(pooled.handle);
        }

        let handle = device
            .create_buffer(desc, name)
            .with_context(|| format!("failed to create pooled buffer \"{name}\""))?;
        self.buffers.push(RgPooledBuffer {
            handle,
            desc: *desc,
            last_used_frame: self.frame_index,
            active: true,
        });
        Ok(handle)
    }

    pub fn release_buffer(&mut self, handle: GfxBufferHandle) {
        if let Some(pooled) = self.buffers.iter_mut().find(|b| b.active && b.handle == handle) {
            pooled.active = false;
        }
    }
}

// getter
impl RgResourcePool {
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn eviction_frames(&self) -> u64 {
        self.eviction_frames
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn active_texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.active).count()
    }

    pub fn active_buffer_count(&self) -> usize {
        self.buffers.iter().filter(|b| b.active).count()
    }
}
