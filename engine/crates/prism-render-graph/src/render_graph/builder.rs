//! Pass 构建器
//!
//! setup 阶段唯一可以修改 graph 的接口。每个读写操作会：
//! - 记录 Pass 对资源的读写集合以及期望的资源状态
//! - 为资源累积 bind flags，并在第一次使用时提升临时资源的初始状态
//! - 返回绑定到当前 Pass 的类型化句柄

use std::hash::Hash;

use indexmap::IndexMap;
use indexmap::map::Entry;
use prism_gfx::buffer::{GfxBufferDesc, GfxBufferSubresourceDesc};
use prism_gfx::flags::GfxBindFlags;
use prism_gfx::handles::GfxViewType;
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::{GfxTextureDesc, GfxTextureSubresourceDesc};

use super::blackboard::RgBlackboard;
use super::handle::*;
use super::pass::{RgDepthStencilInfo, RgLoadStoreAccessOp, RgPassFlags, RgPassNode, RgPassType, RgReadAccess, RgRenderTargetInfo};
use super::resource_name::RgResourceName;
use super::resource_registry::RgResourceRegistry;

pub struct RgBuilder<'r> {
    pass_id: RgPassId,
    node: &'r mut RgPassNode,
    registry: &'r mut RgResourceRegistry,
    blackboard: &'r mut RgBlackboard,
}

// new & init
impl<'r> RgBuilder<'r> {
    pub(crate) fn new(
        pass_id: RgPassId,
        node: &'r mut RgPassNode,
        registry: &'r mut RgResourceRegistry,
        blackboard: &'r mut RgBlackboard,
    ) -> Self {
        Self {
            pass_id,
            node,
            registry,
            blackboard,
        }
    }
}

// declare & query
impl RgBuilder<'_> {
    /// 声明临时纹理，本 Pass 视为它的创建者
    pub fn declare_texture(&mut self, name: RgResourceName, desc: GfxTextureDesc) {
        let id = self.registry.declare_texture(name, desc);
        self.node.texture_creates.insert(id);
    }

    pub fn declare_buffer(&mut self, name: RgResourceName, desc: GfxBufferDesc) {
        let id = self.registry.declare_buffer(name, desc);
        self.node.buffer_creates.insert(id);
    }

    #[inline]
    pub fn is_texture_declared(&self, name: RgResourceName) -> bool {
        self.registry.is_texture_declared(name)
    }

    #[inline]
    pub fn is_buffer_declared(&self, name: RgResourceName) -> bool {
        self.registry.is_buffer_declared(name)
    }

    /// 只读取描述，不会建立依赖
    pub fn texture_desc(&self, name: RgResourceName) -> &GfxTextureDesc {
        &self.registry.texture(self.registry.texture_id(name)).desc
    }

    pub fn buffer_desc(&self, name: RgResourceName) -> &GfxBufferDesc {
        &self.registry.buffer(self.registry.buffer_id(name)).desc
    }

    pub fn add_texture_bind_flags(&mut self, name: RgResourceName, flags: GfxBindFlags) {
        self.registry.add_texture_bind_flags(name, flags);
    }

    pub fn add_buffer_bind_flags(&mut self, name: RgResourceName, flags: GfxBindFlags) {
        self.registry.add_buffer_bind_flags(name, flags);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.node.viewport = (width, height);
    }

    #[inline]
    pub fn pass_id(&self) -> RgPassId {
        self.pass_id
    }

    #[inline]
    pub fn pass_type(&self) -> RgPassType {
        self.node.pass_type
    }

    #[inline]
    pub fn blackboard(&self) -> &RgBlackboard {
        &*self.blackboard
    }

    #[inline]
    pub fn blackboard_mut(&mut self) -> &mut RgBlackboard {
        &mut *self.blackboard
    }
}

// dummy access：只建立依赖，不要求任何状态
impl RgBuilder<'_> {
    pub fn dummy_read_texture(&mut self, name: RgResourceName) {
        let id = self.registry.texture_id(name);
        self.add_texture_read(id);
    }

    pub fn dummy_write_texture(&mut self, name: RgResourceName) {
        let id = self.registry.texture_id(name);
        self.record_texture_write(id);
    }

    pub fn dummy_read_buffer(&mut self, name: RgResourceName) {
        let id = self.registry.buffer_id(name);
        self.add_buffer_read(id);
    }

    pub fn dummy_write_buffer(&mut self, name: RgResourceName) {
        let id = self.registry.buffer_id(name);
        self.record_buffer_write(id);
    }
}

// texture
impl RgBuilder<'_> {
    /// 着色器读取纹理
    ///
    /// Graphics pass 使用 `access` 指定的阶段，Compute pass 总是 `NON_PIXEL_SHADER_RESOURCE`。
    pub fn read_texture(
        &mut self,
        name: RgResourceName,
        access: RgReadAccess,
        desc: GfxTextureSubresourceDesc,
    ) -> RgTextureReadOnlyId {
        self.assert_not_copy_pass("read_texture", name);
        let id = self.registry.texture_id(name);

        let texture = self.registry.texture_mut(id);
        texture.desc.bind_flags |= GfxBindFlags::SHADER_RESOURCE;
        texture.promote_initial_state(GfxResourceState::ALL_SHADER_RESOURCE);
        let view = texture.view_index(desc, GfxViewType::ShaderResource);

        let state = match self.node.pass_type {
            RgPassType::Graphics => access.to_state(),
            _ => GfxResourceState::NON_PIXEL_SHADER_RESOURCE,
        };
        self.set_texture_state(id, state);
        self.add_texture_read(id);

        RgHandle::new(id, view, self.registry.texture(id).info.version, self.pass_id)
    }

    /// UAV 写入纹理
    pub fn write_texture(&mut self, name: RgResourceName, desc: GfxTextureSubresourceDesc) -> RgTextureReadWriteId {
        self.assert_not_copy_pass("write_texture", name);
        let id = self.registry.texture_id(name);

        let texture = self.registry.texture_mut(id);
        texture.desc.bind_flags |= GfxBindFlags::UNORDERED_ACCESS;
        texture.promote_initial_state(GfxResourceState::UNORDERED_ACCESS);
        let view = texture.view_index(desc, GfxViewType::UnorderedAccess);

        self.set_texture_state(id, GfxResourceState::UNORDERED_ACCESS);
        let version = self.write_texture_common(id);

        RgHandle::new(id, view, version, self.pass_id)
    }

    pub fn write_render_target(
        &mut self,
        name: RgResourceName,
        access: RgLoadStoreAccessOp,
        desc: GfxTextureSubresourceDesc,
    ) -> RgRenderTargetId {
        self.assert_not_copy_pass("write_render_target", name);
        let id = self.registry.texture_id(name);

        let texture = self.registry.texture_mut(id);
        texture.desc.bind_flags |= GfxBindFlags::RENDER_TARGET;
        texture.promote_initial_state(GfxResourceState::RENDER_TARGET);
        let view = texture.view_index(desc, GfxViewType::RenderTarget);

        self.set_texture_state(id, GfxResourceState::RENDER_TARGET);
        let version = self.write_texture_common(id);

        let handle = RgHandle::new(id, view, version, self.pass_id);
        self.node.render_targets.push(RgRenderTargetInfo { handle, access });
        handle
    }

    pub fn write_depth_stencil(
        &mut self,
        name: RgResourceName,
        depth_access: RgLoadStoreAccessOp,
        stencil_access: RgLoadStoreAccessOp,
        desc: GfxTextureSubresourceDesc,
    ) -> RgDepthStencilId {
        self.assert_not_copy_pass("write_depth_stencil", name);
        let id = self.registry.texture_id(name);
        let view = self.depth_stencil_view(id, desc);

        self.set_texture_state(id, GfxResourceState::DEPTH_WRITE);
        let version = self.write_texture_common(id);

        let handle = RgHandle::new(id, view, version, self.pass_id);
        self.node.depth_stencil = Some(RgDepthStencilInfo {
            handle,
            depth_access,
            stencil_access,
            read_only: false,
        });
        handle
    }

    /// 只读深度（深度测试但不写入）
    pub fn read_depth_stencil(
        &mut self,
        name: RgResourceName,
        depth_access: RgLoadStoreAccessOp,
        stencil_access: RgLoadStoreAccessOp,
        desc: GfxTextureSubresourceDesc,
    ) -> RgDepthStencilId {
        self.assert_not_copy_pass("read_depth_stencil", name);
        let id = self.registry.texture_id(name);
        let view = self.depth_stencil_view(id, desc);

        self.set_texture_state(id, GfxResourceState::DEPTH_READ);
        self.add_texture_read(id);
        if self.registry.texture(id).is_imported() {
            self.node.flags |= RgPassFlags::FORCE_NO_CULL;
        }

        let handle = RgHandle::new(id, view, self.registry.texture(id).info.version, self.pass_id);
        self.node.depth_stencil = Some(RgDepthStencilInfo {
            handle,
            depth_access,
            stencil_access,
            read_only: true,
        });
        handle
    }

    pub fn read_copy_src_texture(&mut self, name: RgResourceName) -> RgTextureCopySrcId {
        let id = self.registry.texture_id(name);
        self.registry.texture_mut(id).promote_initial_state(GfxResourceState::COPY_SOURCE);

        self.set_texture_state(id, GfxResourceState::COPY_SOURCE);
        self.add_texture_read(id);

        RgHandle::new(id, 0, self.registry.texture(id).info.version, self.pass_id)
    }

    pub fn write_copy_dst_texture(&mut self, name: RgResourceName) -> RgTextureCopyDstId {
        let id = self.registry.texture_id(name);
        self.registry.texture_mut(id).promote_initial_state(GfxResourceState::COPY_DEST);

        self.set_texture_state(id, GfxResourceState::COPY_DEST);
        let version = self.write_texture_common(id);

        RgHandle::new(id, 0, version, self.pass_id)
    }
}

// buffer
impl RgBuilder<'_> {
    pub fn read_buffer(
        &mut self,
        name: RgResourceName,
        access: RgReadAccess,
        desc: GfxBufferSubresourceDesc,
    ) -> RgBufferReadOnlyId {
        self.assert_not_copy_pass("read_buffer", name);
        let id = self.registry.buffer_id(name);

        let buffer = self.registry.buffer_mut(id);
        buffer.desc.bind_flags |= GfxBindFlags::SHADER_RESOURCE;
        let view = buffer.view_index(desc, GfxViewType::ShaderResource, None);

        let state = match self.node.pass_type {
            RgPassType::Graphics => access.to_state(),
            _ => GfxResourceState::NON_PIXEL_SHADER_RESOURCE,
        };
        self.set_buffer_state(id, state);
        self.add_buffer_read(id);

        RgHandle::new(id, view, self.registry.buffer(id).info.version, self.pass_id)
    }

    pub fn write_buffer(&mut self, name: RgResourceName, desc: GfxBufferSubresourceDesc) -> RgBufferReadWriteId {
        self.assert_not_copy_pass("write_buffer", name);
        let id = self.registry.buffer_id(name);

        let buffer = self.registry.buffer_mut(id);
        buffer.desc.bind_flags |= GfxBindFlags::UNORDERED_ACCESS;
        let view = buffer.view_index(desc, GfxViewType::UnorderedAccess, None);

        self.set_buffer_state(id, GfxResourceState::UNORDERED_ACCESS);
        let version = self.write_buffer_common(id);

        RgHandle::new(id, view, version, self.pass_id)
    }

    /// 带 counter 的 UAV 写入（append / consume buffer）
    ///
    /// counter 缓冲区同样进入 UAV 状态并被视为写入。
    pub fn write_buffer_with_counter(
        &mut self,
        name: RgResourceName,
        counter_name: RgResourceName,
        desc: GfxBufferSubresourceDesc,
    ) -> RgBufferReadWriteId {
        self.assert_not_copy_pass("write_buffer_with_counter", name);
        let id = self.registry.buffer_id(name);
        let counter_id = self.registry.buffer_id(counter_name);

        self.registry.buffer_mut(counter_id).desc.bind_flags |= GfxBindFlags::UNORDERED_ACCESS;
        let buffer = self.registry.buffer_mut(id);
        buffer.desc.bind_flags |= GfxBindFlags::UNORDERED_ACCESS;
        let view = buffer.view_index(desc, GfxViewType::UnorderedAccess, Some(counter_id));

        self.set_buffer_state(id, GfxResourceState::UNORDERED_ACCESS);
        self.set_buffer_state(counter_id, GfxResourceState::UNORDERED_ACCESS);

        self.record_buffer_write(counter_id);
        // counter 可能由别的 Pass 创建，单独判断
        if !self.acts_as_creator_of_buffer(id) {
            self.add_implicit_buffer_read(id);
        }
        if !self.acts_as_creator_of_buffer(counter_id) {
            self.add_implicit_buffer_read(counter_id);
        }
        let version = self.record_buffer_write(id);

        RgHandle::new(id, view, version, self.pass_id)
    }

    pub fn read_copy_src_buffer(&mut self, name: RgResourceName) -> RgBufferCopySrcId {
        self.read_buffer_with_state(name, GfxResourceState::COPY_SOURCE)
    }

    pub fn write_copy_dst_buffer(&mut self, name: RgResourceName) -> RgBufferCopyDstId {
        let id = self.registry.buffer_id(name);
        self.set_buffer_state(id, GfxResourceState::COPY_DEST);
        let version = self.write_buffer_common(id);
        RgHandle::new(id, 0, version, self.pass_id)
    }

    pub fn read_indirect_args_buffer(&mut self, name: RgResourceName) -> RgBufferIndirectArgsId {
        self.read_buffer_with_state(name, GfxResourceState::INDIRECT_ARGUMENT)
    }

    pub fn read_vertex_buffer(&mut self, name: RgResourceName) -> RgBufferVertexId {
        self.read_buffer_with_state(name, GfxResourceState::VERTEX_AND_CONSTANT_BUFFER)
    }

    pub fn read_index_buffer(&mut self, name: RgResourceName) -> RgBufferIndexId {
        self.read_buffer_with_state(name, GfxResourceState::INDEX_BUFFER)
    }

    pub fn read_constant_buffer(&mut self, name: RgResourceName) -> RgBufferConstantId {
        self.read_buffer_with_state(name, GfxResourceState::VERTEX_AND_CONSTANT_BUFFER)
    }
}

// helpers
impl RgBuilder<'_> {
    fn assert_not_copy_pass(&self, op: &str, name: RgResourceName) {
        assert!(
            self.node.pass_type != RgPassType::Copy,
            "RenderGraph: {op}(\"{name}\") is not allowed in copy pass \"{}\"",
            self.node.name
        );
    }

    fn depth_stencil_view(&mut self, id: RgTextureId, desc: GfxTextureSubresourceDesc) -> u32 {
        let texture = self.registry.texture_mut(id);
        texture.desc.bind_flags |= GfxBindFlags::DEPTH_STENCIL;
        texture.promote_initial_state(GfxResourceState::DEPTH_WRITE);
        texture.view_index(desc, GfxViewType::DepthStencil)
    }

    fn read_buffer_with_state<K: RgAccessKind<Key = RgBufferId>>(
        &mut self,
        name: RgResourceName,
        state: GfxResourceState,
    ) -> RgHandle<K> {
        let id = self.registry.buffer_id(name);
        self.set_buffer_state(id, state);
        self.add_buffer_read(id);
        RgHandle::new(id, 0, self.registry.buffer(id).info.version, self.pass_id)
    }

    fn acts_as_creator_of_texture(&self, id: RgTextureId) -> bool {
        self.node.texture_creates.contains(&id) || self.node.flags.contains(RgPassFlags::ACT_AS_CREATOR_WHEN_WRITING)
    }

    fn acts_as_creator_of_buffer(&self, id: RgBufferId) -> bool {
        self.node.buffer_creates.contains(&id) || self.node.flags.contains(RgPassFlags::ACT_AS_CREATOR_WHEN_WRITING)
    }

    fn add_texture_read(&mut self, id: RgTextureId) {
        self.node.implicit_texture_reads.shift_remove(&id);
        if self.node.texture_reads.insert(id) {
            self.registry.texture_mut(id).info.ref_count += 1;
        }
    }

    fn add_implicit_texture_read(&mut self, id: RgTextureId) {
        if self.node.texture_reads.insert(id) {
            self.registry.texture_mut(id).info.ref_count += 1;
            self.node.implicit_texture_reads.insert(id);
        }
    }

    fn add_buffer_read(&mut self, id: RgBufferId) {
        self.node.implicit_buffer_reads.shift_remove(&id);
        if self.node.buffer_reads.insert(id) {
            self.registry.buffer_mut(id).info.ref_count += 1;
        }
    }

    fn add_implicit_buffer_read(&mut self, id: RgBufferId) {
        if self.node.buffer_reads.insert(id) {
            self.registry.buffer_mut(id).info.ref_count += 1;
            self.node.implicit_buffer_reads.insert(id);
        }
    }

    /// 写入未由本 Pass 创建的资源，意味着需要保留之前的内容，因此附带一次读取
    fn write_texture_common(&mut self, id: RgTextureId) -> u32 {
        if !self.acts_as_creator_of_texture(id) {
            self.add_implicit_texture_read(id);
        }
        self.record_texture_write(id)
    }

    fn write_buffer_common(&mut self, id: RgBufferId) -> u32 {
        if !self.acts_as_creator_of_buffer(id) {
            self.add_implicit_buffer_read(id);
        }
        self.record_buffer_write(id)
    }

    /// 返回写入后的版本
    fn record_texture_write(&mut self, id: RgTextureId) -> u32 {
        self.node.texture_writes.insert(id);
        let texture = self.registry.texture_mut(id);
        texture.info.version += 1;
        texture.info.writer = Some(self.pass_id);
        if texture.is_imported() {
            self.node.flags |= RgPassFlags::FORCE_NO_CULL;
        }
        texture.info.version
    }

    fn record_buffer_write(&mut self, id: RgBufferId) -> u32 {
        self.node.buffer_writes.insert(id);
        let buffer = self.registry.buffer_mut(id);
        buffer.info.version += 1;
        buffer.info.writer = Some(self.pass_id);
        if buffer.is_imported() {
            self.node.flags |= RgPassFlags::FORCE_NO_CULL;
        }
        buffer.info.version
    }

    fn set_texture_state(&mut self, id: RgTextureId, state: GfxResourceState) {
        let name = self.registry.texture(id).name();
        merge_state(&mut self.node.texture_states, id, state, &self.node.name, name);
    }

    fn set_buffer_state(&mut self, id: RgBufferId, state: GfxResourceState) {
        let name = self.registry.buffer(id).name();
        merge_state(&mut self.node.buffer_states, id, state, &self.node.name, name);
    }
}

/// 同一个 Pass 多次使用同一资源：只读状态合并，否则以后一次为准
fn merge_state<K: Hash + Eq>(
    states: &mut IndexMap<K, GfxResourceState>,
    key: K,
    state: GfxResourceState,
    pass_name: &str,
    resource: RgResourceName,
) {
    match states.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(state);
        }
        Entry::Occupied(mut entry) => {
            let prev = *entry.get();
            if prev == state {
                return;
            }
            if prev.is_read_only() && state.is_read_only() {
                *entry.get_mut() = prev | state;
            } else {
                log::warn!(
                    "RenderGraph: pass \"{pass_name}\" uses \"{resource}\" as both {:?} and {:?}, keeping {:?}",
                    prev,
                    state,
                    state
                );
                *entry.get_mut() = state;
            }
        }
    }
}
