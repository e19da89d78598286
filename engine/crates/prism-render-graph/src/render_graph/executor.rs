//! 编译后的 graph 与执行
//!
//! 按声明顺序执行未剔除的 Pass：分配临时资源并创建视图、提交 barrier、
//! 为 Graphics pass 开始 render pass、调用执行闭包，最后把资源归还资源池。

use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use prism_gfx::barrier::GfxBarrier;
use prism_gfx::device::{GfxCommandList, GfxDevice};
use prism_gfx::render_pass::{GfxColorAttachmentDesc, GfxDepthAttachmentDesc, GfxRenderPassDesc};
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::GfxClearValue;

use super::barrier::{RgBarrierDesc, RgPassBarriers};
use super::blackboard::RgBlackboard;
use super::config::RenderGraphConfig;
use super::context::RgContext;
use super::event::RgEvent;
use super::frame_graph::RenderGraph;
use super::graph::RgDependencyGraph;
use super::handle::{RgBufferId, RgPassId, RgResourceKey, RgTextureId};
use super::pass::{RgPassExecutor, RgPassFlags, RgPassNode, RgPassType};
use super::resource_pool::RgResourcePool;
use super::resource_registry::RgResourceRegistry;
use super::texture_resource::RgTextureResource;

/// 编译完成、可以执行的 graph
pub struct RgCompiledGraph<'a> {
    pub(crate) config: RenderGraphConfig,
    pub(crate) passes: Vec<RgPassNode>,
    pub(crate) executors: Vec<Box<dyn RgPassExecutor + 'a>>,
    pub(crate) registry: RgResourceRegistry,
    pub(crate) blackboard: RgBlackboard,
    pub(crate) events: Vec<RgEvent>,
    pub(crate) dependency_graph: RgDependencyGraph,
    /// 与 `passes` 一一对应
    pub(crate) barriers: Vec<RgPassBarriers>,
}

/// 执行期间持有物理资源的临时资源
#[derive(Default)]
struct RgLiveResources {
    /// 纹理及其当前所处的状态
    textures: IndexMap<RgTextureId, GfxResourceState>,
    buffers: IndexSet<RgBufferId>,
    /// 已经在命令列表上打开、尚未关闭的事件数
    open_events: usize,
}

impl RgLiveResources {
    fn apply(&mut self, barriers: &[RgBarrierDesc]) {
        for barrier in barriers {
            let RgResourceKey::Texture(id) = barrier.resource else {
                continue;
            };
            if let Some(state) = self.textures.get_mut(&id) {
                *state = barrier.after;
            }
        }
    }
}

// new & init
impl<'a> RgCompiledGraph<'a> {
    pub(crate) fn new(graph: RenderGraph<'a>, dependency_graph: RgDependencyGraph, barriers: Vec<RgPassBarriers>) -> Self {
        let RenderGraph {
            config,
            passes,
            executors,
            registry,
            blackboard,
            events,
        } = graph;

        Self {
            config,
            passes,
            executors,
            registry,
            blackboard,
            events: events.events,
            dependency_graph,
            barriers,
        }
    }
}

// getter
impl<'a> RgCompiledGraph<'a> {
    #[inline]
    pub fn config(&self) -> &RenderGraphConfig {
        &self.config
    }

    #[inline]
    pub fn passes(&self) -> &[RgPassNode] {
        &self.passes
    }

    #[inline]
    pub fn pass(&self, pass: RgPassId) -> &RgPassNode {
        &self.passes[pass.index()]
    }

    pub fn pass_by_name(&self, name: &str) -> Option<&RgPassNode> {
        self.passes.iter().find(|pass| pass.name == name)
    }

    /// 按执行顺序排列的未剔除 Pass
    pub fn executed_pass_names(&self) -> Vec<&str> {
        self.passes.iter().filter(|pass| !pass.is_culled()).map(|pass| pass.name.as_str()).collect_vec()
    }

    #[inline]
    pub fn barriers(&self, pass: RgPassId) -> &RgPassBarriers {
        &self.barriers[pass.index()]
    }

    #[inline]
    pub fn registry(&self) -> &RgResourceRegistry {
        &self.registry
    }

    #[inline]
    pub fn blackboard(&self) -> &RgBlackboard {
        &self.blackboard
    }

    #[inline]
    pub fn dependency_graph(&self) -> &RgDependencyGraph {
        &self.dependency_graph
    }

    #[inline]
    pub fn events(&self) -> &[RgEvent] {
        &self.events
    }
}

// execute
impl<'a> RgCompiledGraph<'a> {
    /// 执行 graph
    ///
    /// 出错时仍然会释放所有视图，并把已经分配的临时资源归还资源池。
    /// 之前的 Pass 打开的事件区间也会被关闭。
    pub fn execute(
        &mut self,
        pool: &mut RgResourcePool,
        device: &mut dyn GfxDevice,
        cmd: &mut dyn GfxCommandList,
    ) -> anyhow::Result<()> {
        let _span = prism_crate_tools::profile_scope!("RenderGraph::execute");

        if self.config.log_execution_plan {
            self.print_execution_plan();
        }

        pool.tick(device);

        let mut live = RgLiveResources::default();
        let result = self.execute_passes(pool, device, cmd, &mut live);
        if result.is_err() {
            log::debug!("RenderGraph: close {} open events after a failed pass", live.open_events);
        }
        for _ in 0..live.open_events {
            cmd.end_event();
        }
        live.open_events = 0;
        self.release_resources(pool, device, &mut live);
        result
    }

    fn execute_passes(
        &mut self,
        pool: &mut RgResourcePool,
        device: &mut dyn GfxDevice,
        cmd: &mut dyn GfxCommandList,
        live: &mut RgLiveResources,
    ) -> anyhow::Result<()> {
        // 导入资源在第一个 Pass 之前创建视图
        let imported_textures = self
            .registry
            .iter_textures()
            .filter(|(_, texture)| texture.is_imported() && texture.info.is_used())
            .map(|(id, _)| id)
            .collect_vec();
        for id in imported_textures {
            create_texture_views(&mut self.registry, device, id)?;
        }
        let imported_buffers = self
            .registry
            .iter_buffers()
            .filter(|(_, buffer)| buffer.is_imported() && buffer.info.is_used())
            .map(|(id, _)| id)
            .collect_vec();
        for id in imported_buffers {
            create_buffer_views(&mut self.registry, device, id)?;
        }

        for index in 0..self.passes.len() {
            if self.passes[index].is_culled() {
                continue;
            }
            self.execute_pass(index, pool, device, cmd, live)?;
        }
        Ok(())
    }

    fn execute_pass(
        &mut self,
        index: usize,
        pool: &mut RgResourcePool,
        device: &mut dyn GfxDevice,
        cmd: &mut dyn GfxCommandList,
        live: &mut RgLiveResources,
    ) -> anyhow::Result<()> {
        let node = &self.passes[index];
        let barriers = &self.barriers[index];
        let registry = &mut self.registry;

        // 分配临时资源；池中的纹理可能停留在别的状态，需要先转换回初始状态
        let mut gfx_barriers = Vec::new();
        for &id in &node.texture_allocates {
            let texture = registry.texture_mut(id);
            let name = texture.name().to_string();
            let initial = texture.desc.initial_state;
            let (handle, resting) = pool
                .allocate_texture(device, &texture.desc, &name)
                .with_context(|| format!("RenderGraph: pass \"{}\" failed to allocate texture \"{name}\"", node.name))?;
            texture.physical = Some(handle);
            live.textures.insert(id, resting);
            if resting != initial {
                gfx_barriers.push(GfxBarrier::texture(handle, resting, initial));
                live.textures.insert(id, initial);
            }
        }
        for &id in &node.buffer_allocates {
            let buffer = registry.buffer_mut(id);
            let name = buffer.name().to_string();
            let handle = pool
                .allocate_buffer(device, &buffer.desc, &name)
                .with_context(|| format!("RenderGraph: pass \"{}\" failed to allocate buffer \"{name}\"", node.name))?;
            buffer.physical = Some(handle);
            live.buffers.insert(id);
        }
        // counter 可能在同一个 Pass 中分配，所有资源分配完成后再创建视图
        for &id in &node.texture_allocates {
            create_texture_views(registry, device, id)?;
        }
        for &id in &node.buffer_allocates {
            create_buffer_views(registry, device, id)?;
        }

        for &event in &node.begin_events {
            cmd.begin_event(&self.events[event].name);
        }
        live.open_events += node.begin_events.len();

        gfx_barriers.extend(barriers.before.iter().filter_map(|barrier| barrier.to_gfx_barrier(registry)));
        if !gfx_barriers.is_empty() {
            cmd.resource_barriers(&gfx_barriers);
        }
        live.apply(&barriers.before);

        cmd.begin_event(&node.name);
        {
            let ctx = RgContext::new(RgPassId(index), &node.name, registry, &self.blackboard);
            let render_pass = if node.pass_type == RgPassType::Graphics
                && !node.flags.contains(RgPassFlags::SKIP_AUTO_RENDER_PASS)
            {
                Some(build_render_pass_desc(node, registry))
            } else {
                None
            };

            if let Some(desc) = &render_pass {
                cmd.begin_render_pass(desc);
            }
            self.executors[index].execute(&ctx, cmd);
            if render_pass.is_some() {
                cmd.end_render_pass();
            }
        }
        cmd.end_event();

        let after_barriers = barriers.after.iter().filter_map(|barrier| barrier.to_gfx_barrier(registry)).collect_vec();
        if !after_barriers.is_empty() {
            cmd.resource_barriers(&after_barriers);
        }
        live.apply(&barriers.after);

        // 最后一个使用者之后归还资源池，后面的兼容资源可以复用
        for &id in &node.texture_destroys {
            let Some(state) = live.textures.shift_remove(&id) else {
                continue;
            };
            let texture = registry.texture_mut(id);
            if let Some(handle) = texture.physical.take() {
                pool.release_texture(handle, state);
            }
        }
        for &id in &node.buffer_destroys {
            if !live.buffers.shift_remove(&id) {
                continue;
            }
            let buffer = registry.buffer_mut(id);
            if let Some(handle) = buffer.physical.take() {
                pool.release_buffer(handle);
            }
        }

        for _ in 0..node.end_event_count {
            cmd.end_event();
        }
        live.open_events -= node.end_event_count;

        Ok(())
    }

    /// 释放所有视图，归还仍在使用的临时资源
    fn release_resources(&mut self, pool: &mut RgResourcePool, device: &mut dyn GfxDevice, live: &mut RgLiveResources) {
        for (id, state) in live.textures.drain(..) {
            if let Some(handle) = self.registry.texture(id).physical {
                pool.release_texture(handle, state);
            }
        }
        for id in live.buffers.drain(..) {
            if let Some(handle) = self.registry.buffer(id).physical {
                pool.release_buffer(handle);
            }
        }

        for (_, texture) in self.registry.iter_textures_mut() {
            for view in texture.views.drain(..) {
                device.free_descriptor(view);
            }
            if !texture.is_imported() {
                texture.physical = None;
            }
        }
        for (_, buffer) in self.registry.iter_buffers_mut() {
            for view in buffer.views.drain(..) {
                device.free_descriptor(view);
            }
            if !buffer.is_imported() {
                buffer.physical = None;
            }
        }
    }
}

fn create_texture_views(registry: &mut RgResourceRegistry, device: &mut dyn GfxDevice, id: RgTextureId) -> anyhow::Result<()> {
    let texture = registry.texture_mut(id);
    let Some(physical) = texture.physical else {
        return Ok(());
    };
    let name = texture.name();

    for view_desc in &texture.view_descs {
        let view = device
            .create_texture_view(physical, view_desc.view_type, &view_desc.desc)
            .with_context(|| format!("RenderGraph: failed to create {:?} view of texture \"{name}\"", view_desc.view_type))?;
        texture.views.push(view);
    }
    Ok(())
}

fn create_buffer_views(registry: &mut RgResourceRegistry, device: &mut dyn GfxDevice, id: RgBufferId) -> anyhow::Result<()> {
    let buffer = registry.buffer(id);
    let Some(physical) = buffer.physical else {
        return Ok(());
    };
    let name = buffer.name();
    let view_descs = buffer.view_descs.clone();

    let mut counters = Vec::with_capacity(view_descs.len());
    for view_desc in &view_descs {
        let counter = match view_desc.counter {
            Some(counter) => {
                let counter = registry.buffer(counter);
                let Some(handle) = counter.physical else {
                    anyhow::bail!("RenderGraph: counter \"{}\" of buffer \"{name}\" is not allocated", counter.name());
                };
                Some(handle)
            }
            None => None,
        };
        counters.push(counter);
    }

    for (view_desc, counter) in view_descs.iter().zip(counters) {
        let view = device
            .create_buffer_view(physical, view_desc.view_type, &view_desc.desc, counter)
            .with_context(|| format!("RenderGraph: failed to create {:?} view of buffer \"{name}\"", view_desc.view_type))?;
        registry.buffer_mut(id).views.push(view);
    }
    Ok(())
}

fn attachment_view(texture: &RgTextureResource, view: u32) -> prism_gfx::handles::GfxDescriptor {
    let Some(&descriptor) = texture.views.get(view as usize) else {
        panic!("RenderGraph: attachment \"{}\" has no view {view}", texture.name());
    };
    descriptor
}

/// 根据 Pass 记录的 render target / depth stencil 构建 render pass
fn build_render_pass_desc(node: &RgPassNode, registry: &RgResourceRegistry) -> GfxRenderPassDesc {
    let (width, height) = node.viewport;
    assert!(
        width > 0 && height > 0,
        "RenderGraph: graphics pass \"{}\" has a zero viewport, call set_viewport in setup",
        node.name
    );

    let color_attachments = node
        .render_targets
        .iter()
        .map(|target| {
            let texture = registry.texture(target.handle.resource);
            let clear_value = texture.desc.clear_value;
            assert!(
                matches!(clear_value, GfxClearValue::None | GfxClearValue::Color(_)),
                "RenderGraph: render target \"{}\" has a depth-stencil clear value",
                texture.name()
            );
            GfxColorAttachmentDesc {
                descriptor: attachment_view(texture, target.handle.view),
                load: target.access.load,
                store: target.access.store,
                clear_color: clear_value.color(),
            }
        })
        .collect_vec();

    let depth_attachment = node.depth_stencil.as_ref().map(|depth_stencil| {
        let texture = registry.texture(depth_stencil.handle.resource);
        let clear_value = texture.desc.clear_value;
        assert!(
            matches!(clear_value, GfxClearValue::None | GfxClearValue::DepthStencil { .. }),
            "RenderGraph: depth stencil \"{}\" has a color clear value",
            texture.name()
        );
        let (clear_depth, clear_stencil) = clear_value.depth_stencil();
        GfxDepthAttachmentDesc {
            descriptor: attachment_view(texture, depth_stencil.handle.view),
            depth_load: depth_stencil.depth_access.load,
            depth_store: depth_stencil.depth_access.store,
            stencil_load: depth_stencil.stencil_access.load,
            stencil_store: depth_stencil.stencil_access.store,
            clear_depth,
            clear_stencil,
            read_only: depth_stencil.read_only,
        }
    });

    GfxRenderPassDesc {
        width,
        height,
        color_attachments,
        depth_attachment,
        legacy: node.flags.contains(RgPassFlags::LEGACY_RENDER_PASS),
        allow_uav_writes: node.flags.contains(RgPassFlags::ALLOW_UAV_WRITES),
    }
}
