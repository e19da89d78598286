//! RenderGraph 依赖的设备接口
//!
//! 设备负责创建/销毁物理资源和描述符，命令列表负责录制 barrier、render pass、拷贝等命令。
//! 两者都以 trait object 的形式传入 RenderGraph。

use crate::barrier::GfxBarrier;
use crate::buffer::{GfxBufferDesc, GfxBufferSubresourceDesc};
use crate::handles::{GfxBufferHandle, GfxDescriptor, GfxTextureHandle, GfxViewType};
use crate::render_pass::GfxRenderPassDesc;
use crate::texture::{GfxTextureDesc, GfxTextureSubresourceDesc};

pub trait GfxDevice {
    fn create_texture(&mut self, desc: &GfxTextureDesc, name: &str) -> anyhow::Result<GfxTextureHandle>;
    fn destroy_texture(&mut self, texture: GfxTextureHandle);

    fn create_buffer(&mut self, desc: &GfxBufferDesc, name: &str) -> anyhow::Result<GfxBufferHandle>;
    fn destroy_buffer(&mut self, buffer: GfxBufferHandle);

    fn create_texture_view(
        &mut self,
        texture: GfxTextureHandle,
        view_type: GfxViewType,
        desc: &GfxTextureSubresourceDesc,
    ) -> anyhow::Result<GfxDescriptor>;

    /// `counter` 只对 `UnorderedAccess` 视图有意义
    fn create_buffer_view(
        &mut self,
        buffer: GfxBufferHandle,
        view_type: GfxViewType,
        desc: &GfxBufferSubresourceDesc,
        counter: Option<GfxBufferHandle>,
    ) -> anyhow::Result<GfxDescriptor>;

    fn free_descriptor(&mut self, descriptor: GfxDescriptor);

    fn texture_desc(&self, texture: GfxTextureHandle) -> Option<&GfxTextureDesc>;
    fn buffer_desc(&self, buffer: GfxBufferHandle) -> Option<&GfxBufferDesc>;
}

pub trait GfxCommandList {
    fn resource_barriers(&mut self, barriers: &[GfxBarrier]);

    fn begin_render_pass(&mut self, desc: &GfxRenderPassDesc);
    fn end_render_pass(&mut self);

    fn copy_texture(&mut self, dst: GfxTextureHandle, src: GfxTextureHandle);
    fn copy_buffer(&mut self, dst: GfxBufferHandle, src: GfxBufferHandle);

    /// 调试标记，用于 RenderDoc / PIX 等工具
    fn begin_event(&mut self, name: &str);
    fn end_event(&mut self);

    fn draw(&mut self, vertex_count: u32, instance_count: u32);
    fn dispatch(&mut self, group_x: u32, group_y: u32, group_z: u32);
}
