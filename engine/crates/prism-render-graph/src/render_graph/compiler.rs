//! Graph 编译
//!
//! 在所有 Pass 添加完成之后执行一次，依次进行：
//! 1. 声明顺序校验
//! 2. Pass 剔除
//! 3. 依赖分析
//! 4. 资源生命周期（分配点与释放点）
//! 5. barrier 推导
//! 6. 事件区间收缩

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use prism_gfx::resource_state::GfxResourceState;

use super::barrier::{RgBarrierDesc, RgPassBarriers};
use super::executor::RgCompiledGraph;
use super::frame_graph::RenderGraph;
use super::graph::RgDependencyGraph;
use super::handle::{RgBufferId, RgPassId, RgResourceKey, RgTextureId};
use super::pass::RgPassNode;

impl<'a> RenderGraph<'a> {
    /// 编译 graph，之后不能再添加 Pass
    pub fn compile(mut self) -> RgCompiledGraph<'a> {
        let _span = prism_crate_tools::profile_scope!("RenderGraph::compile");

        assert!(self.events.is_balanced(), "RenderGraph: push_event without matching pop_event");

        if self.config.validate_declaration_order {
            self.validate_declaration_order();
        }
        self.cull_passes();
        let dependency_graph = RgDependencyGraph::build(&self.passes);
        self.compute_lifetimes();
        let barriers = self.compute_barriers();
        self.resolve_events();

        RgCompiledGraph::new(self, dependency_graph, barriers)
    }

    /// 显式读取的临时资源必须已经被更早的 Pass 写入
    ///
    /// 写入附带的隐式读取不参与校验。
    fn validate_declaration_order(&self) {
        let mut written_textures: HashSet<RgTextureId> = HashSet::new();
        let mut written_buffers: HashSet<RgBufferId> = HashSet::new();

        for node in &self.passes {
            for id in node.texture_reads.iter().filter(|id| !node.implicit_texture_reads.contains(*id)) {
                let texture = self.registry.texture(*id);
                assert!(
                    texture.is_imported() || written_textures.contains(id),
                    "RenderGraph: pass \"{}\" reads texture \"{}\" before any earlier pass writes it",
                    node.name,
                    texture.name()
                );
            }
            for id in node.buffer_reads.iter().filter(|id| !node.implicit_buffer_reads.contains(*id)) {
                let buffer = self.registry.buffer(*id);
                assert!(
                    buffer.is_imported() || written_buffers.contains(id),
                    "RenderGraph: pass \"{}\" reads buffer \"{}\" before any earlier pass writes it",
                    node.name,
                    buffer.name()
                );
            }

            written_textures.extend(node.texture_writes.iter().copied());
            written_buffers.extend(node.buffer_writes.iter().copied());
        }
    }

    /// 传递式剔除
    ///
    /// Pass 的引用计数是写入的资源数，资源的引用计数是读取它的 Pass 数。
    /// 没有读者的资源会让它的最后写入者的计数减一，写入者计数归零后，它读取的资源计数也随之减一。
    ///
    /// 写入者自己的读取（包括写入附带的隐式读取）看到的是上一个写入者的版本：
    /// 它不计入资源的读者，只在写入者被剔除时让上一个写入者的计数减一。
    fn cull_passes(&mut self) {
        if !self.config.cull_passes {
            return;
        }

        let passes = &mut self.passes;
        let registry = &self.registry;

        let mut writers: HashMap<RgResourceKey, Vec<RgPassId>> = HashMap::new();
        for (index, node) in passes.iter_mut().enumerate() {
            node.ref_count = (node.texture_writes.len() + node.buffer_writes.len()) as u32;
            // 只读不写的 Pass，结果离开了 graph（例如写入 swapchain 之外的外部对象），保留
            if node.ref_count == 0 && node.has_reads() {
                node.ref_count = 1;
            }

            let written = node.texture_writes.iter().map(|&id| RgResourceKey::Texture(id));
            let written = written.chain(node.buffer_writes.iter().map(|&id| RgResourceKey::Buffer(id)));
            for key in written {
                writers.entry(key).or_default().push(RgPassId(index));
            }
        }

        let writes = |key: RgResourceKey, pass: RgPassId| writers.get(&key).is_some_and(|list| list.contains(&pass));
        let last_writer = |key: RgResourceKey| writers.get(&key).and_then(|list| list.last().copied());
        let previous_writer = |key: RgResourceKey, pass: RgPassId| {
            writers.get(&key).and_then(|list| {
                let position = list.iter().position(|&writer| writer == pass)?;
                position.checked_sub(1).map(|prev| list[prev])
            })
        };
        let read_keys = |node: &RgPassNode| {
            node.texture_reads
                .iter()
                .map(|&id| RgResourceKey::Texture(id))
                .chain(node.buffer_reads.iter().map(|&id| RgResourceKey::Buffer(id)))
                .collect_vec()
        };

        // 资源的有效读者数，不含它的写入者
        let mut readers: HashMap<RgResourceKey, u32> = HashMap::new();
        for (id, texture) in registry.iter_textures() {
            readers.insert(RgResourceKey::Texture(id), texture.info.ref_count);
        }
        for (id, buffer) in registry.iter_buffers() {
            readers.insert(RgResourceKey::Buffer(id), buffer.info.ref_count);
        }
        for (index, node) in passes.iter().enumerate() {
            for key in read_keys(node) {
                if !writes(key, RgPassId(index)) {
                    continue;
                }
                if let Some(count) = readers.get_mut(&key) {
                    *count = count.saturating_sub(1);
                }
            }
        }

        let mut pending = readers
            .iter()
            .filter(|(_, count)| **count == 0)
            .filter_map(|(key, _)| last_writer(*key))
            .collect_vec();

        while let Some(writer) = pending.pop() {
            let node = &mut passes[writer.index()];
            if !node.can_be_culled() || node.ref_count == 0 {
                continue;
            }
            node.ref_count -= 1;
            if node.ref_count > 0 {
                continue;
            }

            for key in read_keys(&*node) {
                // 读取的是上一个写入者的版本
                if writes(key, writer) {
                    pending.extend(previous_writer(key, writer));
                    continue;
                }
                let Some(count) = readers.get_mut(&key) else {
                    continue;
                };
                *count = count.saturating_sub(1);
                if *count == 0 {
                    pending.extend(last_writer(key));
                }
            }
        }

        for node in passes.iter_mut() {
            node.culled = node.can_be_culled() && node.ref_count == 0;
            if node.culled {
                log::debug!("RenderGraph: cull pass \"{}\"", node.name);
            }
        }
    }

    /// 计算每个资源的首次和最后一次使用，确定分配点与释放点
    fn compute_lifetimes(&mut self) {
        let passes = &mut self.passes;
        let registry = &mut self.registry;

        for (index, node) in passes.iter().enumerate() {
            if node.culled {
                continue;
            }
            let pass_id = RgPassId(index);
            for &id in node.texture_reads.iter().chain(node.texture_writes.iter()) {
                let info = &mut registry.texture_mut(id).info;
                info.first_used_by.get_or_insert(pass_id);
                info.last_used_by = Some(pass_id);
            }
            for &id in node.buffer_reads.iter().chain(node.buffer_writes.iter()) {
                let info = &mut registry.buffer_mut(id).info;
                info.first_used_by.get_or_insert(pass_id);
                info.last_used_by = Some(pass_id);
            }
        }

        for (id, texture) in registry.iter_textures() {
            let (Some(first), Some(last)) = (texture.info.first_used_by, texture.info.last_used_by) else {
                continue;
            };
            if !texture.is_imported() {
                passes[first.index()].texture_allocates.insert(id);
            }
            passes[last.index()].texture_destroys.insert(id);
        }
        for (id, buffer) in registry.iter_buffers() {
            let (Some(first), Some(last)) = (buffer.info.first_used_by, buffer.info.last_used_by) else {
                continue;
            };
            if !buffer.is_imported() {
                passes[first.index()].buffer_allocates.insert(id);
            }
            passes[last.index()].buffer_destroys.insert(id);
        }
    }

    /// 按声明顺序模拟每个资源的状态，得到每个 Pass 前后的状态转换
    ///
    /// 资源在帧开始时处于初始状态（缓冲区为 `COMMON`），最后一个使用者之后转换回初始状态。
    fn compute_barriers(&self) -> Vec<RgPassBarriers> {
        let mut texture_states: HashMap<RgTextureId, GfxResourceState> = HashMap::new();
        let mut buffer_states: HashMap<RgBufferId, GfxResourceState> = HashMap::new();
        let mut result = vec![RgPassBarriers::new(); self.passes.len()];

        for (index, node) in self.passes.iter().enumerate() {
            if node.culled {
                continue;
            }
            let barriers = &mut result[index];

            for (&id, &wanted) in &node.texture_states {
                let initial = self.registry.texture(id).desc.initial_state;
                let key = RgResourceKey::Texture(id);
                let current = match texture_states.get(&id) {
                    Some(&prev) => {
                        barriers.add_before(RgBarrierDesc::new(key, prev, wanted));
                        wanted
                    }
                    // 新分配或导入的纹理处于初始状态，初始状态覆盖了需要的状态时不需要转换
                    None if (node.texture_allocates.contains(&id) || self.registry.texture(id).is_imported())
                        && initial.contains(wanted) =>
                    {
                        initial
                    }
                    None => {
                        barriers.add_before(RgBarrierDesc::new(key, initial, wanted));
                        wanted
                    }
                };
                texture_states.insert(id, current);
            }

            for (&id, &wanted) in &node.buffer_states {
                let prev = buffer_states.get(&id).copied().unwrap_or(GfxResourceState::COMMON);
                barriers.add_before(RgBarrierDesc::new(RgResourceKey::Buffer(id), prev, wanted));
                buffer_states.insert(id, wanted);
            }

            for &id in &node.texture_destroys {
                if let Some(&current) = texture_states.get(&id) {
                    let initial = self.registry.texture(id).desc.initial_state;
                    barriers.add_after(RgBarrierDesc::new(RgResourceKey::Texture(id), current, initial));
                }
            }
            for &id in &node.buffer_destroys {
                if let Some(&current) = buffer_states.get(&id) {
                    barriers.add_after(RgBarrierDesc::new(
                        RgResourceKey::Buffer(id),
                        current,
                        GfxResourceState::COMMON,
                    ));
                }
            }
        }

        result
    }

    /// 把事件区间收缩到未剔除的 Pass 上，没有剩余 Pass 的区间被丢弃
    fn resolve_events(&mut self) {
        let alive = self.passes.iter().map(|node| !node.culled).collect_vec();

        for (index, event) in self.events.events.iter().enumerate() {
            let Some((first, last)) = event.clamp(&alive) else {
                log::debug!("RenderGraph: drop event \"{}\", all of its passes are culled", event.name);
                continue;
            };
            self.passes[first].begin_events.push(index);
            self.passes[last].end_event_count += 1;
        }
    }
}
