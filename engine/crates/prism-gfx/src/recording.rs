//! 只记录命令的参考设备
//!
//! 不与任何 GPU 交互：设备在 slotmap 中保存资源描述并统计存活对象，
//! 命令列表把每次调用记录为 [`GfxCommand`]。用于单元测试和 headless 运行。

use anyhow::{Context, bail};
use slotmap::SlotMap;

use crate::barrier::GfxBarrier;
use crate::buffer::{GfxBufferDesc, GfxBufferSubresourceDesc};
use crate::device::{GfxCommandList, GfxDevice};
use crate::handles::{GfxBufferHandle, GfxDescriptor, GfxTextureHandle, GfxViewType};
use crate::render_pass::GfxRenderPassDesc;
use crate::texture::{GfxTextureDesc, GfxTextureSubresourceDesc};

struct RecordedTexture {
    name: String,
    desc: GfxTextureDesc,
}

struct RecordedBuffer {
    name: String,
    desc: GfxBufferDesc,
}

/// 描述符指向的资源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GfxRecordedView {
    Texture {
        texture: GfxTextureHandle,
        view_type: GfxViewType,
        desc: GfxTextureSubresourceDesc,
    },
    Buffer {
        buffer: GfxBufferHandle,
        view_type: GfxViewType,
        desc: GfxBufferSubresourceDesc,
        counter: Option<GfxBufferHandle>,
    },
}

#[derive(Default)]
pub struct GfxRecordingDevice {
    textures: SlotMap<GfxTextureHandle, RecordedTexture>,
    buffers: SlotMap<GfxBufferHandle, RecordedBuffer>,
    descriptors: SlotMap<GfxDescriptor, GfxRecordedView>,

    created_texture_count: usize,
    created_buffer_count: usize,

    /// 为 true 时所有资源创建都会失败，用于测试错误传播
    fail_allocations: bool,
}

// new & init
impl GfxRecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }
}

// getter
impl GfxRecordingDevice {
    #[inline]
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn live_descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// 设备生命周期内一共创建过多少纹理
    #[inline]
    pub fn created_texture_count(&self) -> usize {
        self.created_texture_count
    }

    #[inline]
    pub fn created_buffer_count(&self) -> usize {
        self.created_buffer_count
    }

    pub fn texture_name(&self, texture: GfxTextureHandle) -> Option<&str> {
        self.textures.get(texture).map(|t| t.name.as_str())
    }

    pub fn buffer_name(&self, buffer: GfxBufferHandle) -> Option<&str> {
        self.buffers.get(buffer).map(|b| b.name.as_str())
    }

    pub fn view(&self, descriptor: GfxDescriptor) -> Option<&GfxRecordedView> {
        self.descriptors.get(descriptor)
    }
}

impl GfxDevice for GfxRecordingDevice {
    fn create_texture(&mut self, desc: &GfxTextureDesc, name: &str) -> anyhow::Result<GfxTextureHandle> {
        if self.fail_allocations {
            bail!("out of device memory while creating texture \"{name}\"");
        }
        if desc.width == 0 || desc.height == 0 {
            bail!("texture \"{name}\" has zero extent {}x{}", desc.width, desc.height);
        }

        self.created_texture_count += 1;
        Ok(self.textures.insert(RecordedTexture {
            name: name.to_string(),
            desc: *desc,
        }))
    }

    fn destroy_texture(&mut self, texture: GfxTextureHandle) {
        if self.textures.remove(texture).is_none() {
            log::warn!("destroy unknown texture {:?}", texture);
        }
    }

    fn create_buffer(&mut self, desc: &GfxBufferDesc, name: &str) -> anyhow::Result<GfxBufferHandle> {
        if self.fail_allocations {
            bail!("out of device memory while creating buffer \"{name}\"");
        }
        if desc.size == 0 {
            bail!("buffer \"{name}\" has zero size");
        }

        self.created_buffer_count += 1;
        Ok(self.buffers.insert(RecordedBuffer {
            name: name.to_string(),
            desc: *desc,
        }))
    }

    fn destroy_buffer(&mut self, buffer: GfxBufferHandle) {
        if self.buffers.remove(buffer).is_none() {
            log::warn!("destroy unknown buffer {:?}", buffer);
        }
    }

    fn create_texture_view(
        &mut self,
        texture: GfxTextureHandle,
        view_type: GfxViewType,
        desc: &GfxTextureSubresourceDesc,
    ) -> anyhow::Result<GfxDescriptor> {
        self.textures.get(texture).with_context(|| format!("texture {:?} does not exist", texture))?;
        Ok(self.descriptors.insert(GfxRecordedView::Texture {
            texture,
            view_type,
            desc: *desc,
        }))
    }

    fn create_buffer_view(
        &mut self,
        buffer: GfxBufferHandle,
        view_type: GfxViewType,
        desc: &GfxBufferSubresourceDesc,
        counter: Option<GfxBufferHandle>,
    ) -> anyhow::Result<GfxDescriptor> {
        self.buffers.get(buffer).with_context(|| format!("buffer {:?} does not exist", buffer))?;
        if let Some(counter) = counter {
            self.buffers.get(counter).with_context(|| format!("counter buffer {:?} does not exist", counter))?;
        }
        Ok(self.descriptors.insert(GfxRecordedView::Buffer {
            buffer,
            view_type,
            desc: *desc,
            counter,
        }))
    }

    fn free_descriptor(&mut self, descriptor: GfxDescriptor) {
        self.descriptors.remove(descriptor);
    }

    fn texture_desc(&self, texture: GfxTextureHandle) -> Option<&GfxTextureDesc> {
        self.textures.get(texture).map(|t| &t.desc)
    }

    fn buffer_desc(&self, buffer: GfxBufferHandle) -> Option<&GfxBufferDesc> {
        self.buffers.get(buffer).map(|b| &b.desc)
    }
}

/// 命令列表记录下来的一条命令
#[derive(Clone, Debug, PartialEq)]
pub enum GfxCommand {
    Barriers(Vec<GfxBarrier>),
    BeginRenderPass(GfxRenderPassDesc),
    EndRenderPass,
    CopyTexture { dst: GfxTextureHandle, src: GfxTextureHandle },
    CopyBuffer { dst: GfxBufferHandle, src: GfxBufferHandle },
    BeginEvent(String),
    EndEvent,
    Draw { vertex_count: u32, instance_count: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
}

#[derive(Default)]
pub struct GfxRecordingCommandList {
    commands: Vec<GfxCommand>,
}

impl GfxRecordingCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn commands(&self) -> &[GfxCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// 所有 barrier 按提交顺序展开
    pub fn barriers(&self) -> impl Iterator<Item = &GfxBarrier> {
        self.commands.iter().flat_map(|cmd| match cmd {
            GfxCommand::Barriers(barriers) => barriers.as_slice(),
            _ => &[],
        })
    }

    /// 所有 `BeginEvent` 的名字
    pub fn event_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                GfxCommand::BeginEvent(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl GfxCommandList for GfxRecordingCommandList {
    fn resource_barriers(&mut self, barriers: &[GfxBarrier]) {
        if !barriers.is_empty() {
            self.commands.push(GfxCommand::Barriers(barriers.to_vec()));
        }
    }

    fn begin_render_pass(&mut self, desc: &GfxRenderPassDesc) {
        self.commands.push(GfxCommand::BeginRenderPass(desc.clone()));
    }

    fn end_render_pass(&mut self) {
        self.commands.push(GfxCommand::EndRenderPass);
    }

    fn copy_texture(&mut self, dst: GfxTextureHandle, src: GfxTextureHandle) {
        self.commands.push(GfxCommand::CopyTexture { dst, src });
    }

    fn copy_buffer(&mut self, dst: GfxBufferHandle, src: GfxBufferHandle) {
        self.commands.push(GfxCommand::CopyBuffer { dst, src });
    }

    fn begin_event(&mut self, name: &str) {
        self.commands.push(GfxCommand::BeginEvent(name.to_string()));
    }

    fn end_event(&mut self) {
        self.commands.push(GfxCommand::EndEvent);
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(GfxCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    fn dispatch(&mut self, group_x: u32, group_y: u32, group_z: u32) {
        self.commands.push(GfxCommand::Dispatch {
            x: group_x,
            y: group_y,
            z: group_z,
        });
    }
}
