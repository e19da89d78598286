//! 执行计划日志

//!
//! barrier 与 attachment 都按 Vulkan 后端翻译后的形式打印（stage、access、layout、load/store op）。

use ash::vk;
use itertools::Itertools;
use prism_gfx::barrier::GfxBarrier;
use prism_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use prism_gfx::resource_state::GfxResourceState;

use super::barrier::RgBarrierDesc;
use super::executor::RgCompiledGraph;
use super::handle::RgResourceKey;
use super::pass::RgLoadStoreAccessOp;

const PIPELINE_STAGE_NAMES: &[(vk::PipelineStageFlags2, &str)] = &[
    (vk::PipelineStageFlags2::TOP_OF_PIPE, "TOP_OF_PIPE"),
    (vk::PipelineStageFlags2::DRAW_INDIRECT, "DRAW_INDIRECT"),
    (vk::PipelineStageFlags2::VERTEX_INPUT, "VERTEX_INPUT"),
    (vk::PipelineStageFlags2::VERTEX_SHADER, "VERTEX_SHADER"),
    (vk::PipelineStageFlags2::FRAGMENT_SHADER, "FRAGMENT_SHADER"),
    (vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS, "EARLY_FRAGMENT_TESTS"),
    (vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS, "LATE_FRAGMENT_TESTS"),
    (vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, "COLOR_ATTACHMENT_OUTPUT"),
    (vk::PipelineStageFlags2::COMPUTE_SHADER, "COMPUTE_SHADER"),
    (vk::PipelineStageFlags2::TRANSFER, "TRANSFER"),
    (vk::PipelineStageFlags2::BOTTOM_OF_PIPE, "BOTTOM_OF_PIPE"),
    (vk::PipelineStageFlags2::ALL_GRAPHICS, "ALL_GRAPHICS"),
    (vk::PipelineStageFlags2::ALL_COMMANDS, "ALL_COMMANDS"),
];

const ACCESS_FLAG_NAMES: &[(vk::AccessFlags2, &str)] = &[
    (vk::AccessFlags2::INDIRECT_COMMAND_READ, "INDIRECT_CMD_READ"),
    (vk::AccessFlags2::INDEX_READ, "INDEX_READ"),
    (vk::AccessFlags2::VERTEX_ATTRIBUTE_READ, "VERTEX_ATTR_READ"),
    (vk::AccessFlags2::UNIFORM_READ, "UNIFORM_READ"),
    (vk::AccessFlags2::SHADER_SAMPLED_READ, "SHADER_SAMPLED_READ"),
    (vk::AccessFlags2::SHADER_STORAGE_READ, "STORAGE_READ"),
    (vk::AccessFlags2::SHADER_STORAGE_WRITE, "STORAGE_WRITE"),
    (vk::AccessFlags2::COLOR_ATTACHMENT_READ, "COLOR_ATTACH_READ"),
    (vk::AccessFlags2::COLOR_ATTACHMENT_WRITE, "COLOR_ATTACH_WRITE"),
    (vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ, "DEPTH_ATTACH_READ"),
    (vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE, "DEPTH_ATTACH_WRITE"),
    (vk::AccessFlags2::TRANSFER_READ, "TRANSFER_READ"),
    (vk::AccessFlags2::TRANSFER_WRITE, "TRANSFER_WRITE"),
    (vk::AccessFlags2::MEMORY_READ, "MEMORY_READ"),
    (vk::AccessFlags2::MEMORY_WRITE, "MEMORY_WRITE"),
];

/// PipelineStageFlags2 的可读形式
pub fn format_pipeline_stage(stage: vk::PipelineStageFlags2) -> String {
    if stage == vk::PipelineStageFlags2::NONE {
        return "NONE".to_string();
    }
    let names = PIPELINE_STAGE_NAMES.iter().filter(|(flag, _)| stage.contains(*flag)).map(|(_, name)| *name).collect_vec();
    if names.is_empty() { format!("{:?}", stage) } else { names.join(" | ") }
}

/// AccessFlags2 的可读形式
pub fn format_access_flags(access: vk::AccessFlags2) -> String {
    if access == vk::AccessFlags2::NONE {
        return "NONE".to_string();
    }
    let names = ACCESS_FLAG_NAMES.iter().filter(|(flag, _)| access.contains(*flag)).map(|(_, name)| *name).collect_vec();
    if names.is_empty() { format!("{:?}", access) } else { names.join(" | ") }
}

fn format_state(state: GfxResourceState) -> String {
    let vk_state = state.to_vk_image_state();
    format!(
        "{:?} (stage: {}, access: {}, layout: {:?})",
        state,
        format_pipeline_stage(vk_state.stage),
        format_access_flags(vk_state.access),
        vk_state.layout
    )
}

fn format_attachment_ops(access: RgLoadStoreAccessOp) -> String {
    format!("load: {:?}, store: {:?}", access.load.to_vk(), access.store.to_vk())
}

impl RgCompiledGraph<'_> {
    /// barrier 翻译成 Vulkan barrier 之后的形式，物理资源在编译期未知，用空句柄代替
    fn describe_barrier(&self, barrier: &RgBarrierDesc) -> String {
        match barrier.resource {
            RgResourceKey::Texture(id) => {
                let aspect = self.registry.texture(id).desc.format.vk_aspect();
                let vk_barrier = GfxBarrier::texture(GfxTextureHandle::default(), barrier.before, barrier.after)
                    .to_vk_image_barrier(vk::Image::null(), aspect);
                format!(
                    "{:?} → {:?} (stage: {} → {}, access: {} → {}, layout: {:?} → {:?}, aspect: {:?})",
                    barrier.before,
                    barrier.after,
                    format_pipeline_stage(vk_barrier.src_stage_mask),
                    format_pipeline_stage(vk_barrier.dst_stage_mask),
                    format_access_flags(vk_barrier.src_access_mask),
                    format_access_flags(vk_barrier.dst_access_mask),
                    vk_barrier.old_layout,
                    vk_barrier.new_layout,
                    vk_barrier.subresource_range.aspect_mask
                )
            }
            RgResourceKey::Buffer(_) => {
                let vk_barrier = GfxBarrier::buffer(GfxBufferHandle::default(), barrier.before, barrier.after)
                    .to_vk_buffer_barrier(vk::Buffer::null());
                format!(
                    "{:?} → {:?} (stage: {} → {}, access: {} → {})",
                    barrier.before,
                    barrier.after,
                    format_pipeline_stage(vk_barrier.src_stage_mask),
                    format_pipeline_stage(vk_barrier.dst_stage_mask),
                    format_access_flags(vk_barrier.src_access_mask),
                    format_access_flags(vk_barrier.dst_access_mask)
                )
            }
        }
    }

    fn resource_label(&self, resource: RgResourceKey) -> String {
        match resource {
            RgResourceKey::Texture(id) => format!("Texture \"{}\"", self.registry.texture(id).name()),
            RgResourceKey::Buffer(id) => format!("Buffer \"{}\"", self.registry.buffer(id).name()),
        }
    }

    fn log_barriers(&self, title: &str, barriers: &[RgBarrierDesc]) {
        if barriers.is_empty() {
            return;
        }
        log::info!("│ {} Barriers: {}", title, barriers.len());
        for barrier in barriers {
            log::info!("│   🔒 {}:", self.resource_label(barrier.resource));
            log::info!("│       {}", self.describe_barrier(barrier));
        }
    }

    /// 以 info 级别打印执行计划：执行顺序、每个 Pass 的资源访问、分配/释放点以及 barrier
    pub fn print_execution_plan(&self) {
        let executed = self.executed_pass_names();

        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              RenderGraph Execution Plan                          ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Culled: {}  |  Execution Order: [{}]",
            self.passes.len(),
            self.passes.len() - executed.len(),
            executed.iter().join(" → ")
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        let mut order = 0;
        for (index, pass) in self.passes.iter().enumerate() {
            if pass.is_culled() {
                log::info!("");
                log::info!("  ✂️  Pass \"{}\" is culled", pass.name);
                continue;
            }
            order += 1;

            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!(
                "│ [{}/{}] Pass: \"{}\" ({:?}, level {})",
                order,
                executed.len(),
                pass.name,
                pass.pass_type,
                self.dependency_graph.level(index).unwrap_or(0)
            );
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            for (&id, &state) in &pass.texture_states {
                let access = if pass.texture_writes.contains(&id) { "✏️ " } else { "📖" };
                log::info!("│   {} Texture \"{}\" @ {}", access, self.registry.texture(id).name(), format_state(state));
            }
            for (&id, &state) in &pass.buffer_states {
                let access = if pass.buffer_writes.contains(&id) { "✏️ " } else { "📖" };
                log::info!("│   {} Buffer \"{}\" @ {}", access, self.registry.buffer(id).name(), format_state(state));
            }

            for target in pass.render_targets() {
                let name = self.registry.texture(target.handle.resource()).name();
                log::info!("│   🎯 RT \"{}\" {}", name, format_attachment_ops(target.access));
            }
            if let Some(depth) = pass.depth_stencil() {
                let name = self.registry.texture(depth.handle.resource()).name();
                log::info!(
                    "│   🎯 DS \"{}\" depth {}, stencil {}{}",
                    name,
                    format_attachment_ops(depth.depth_access),
                    format_attachment_ops(depth.stencil_access),
                    if depth.read_only { " (read only)" } else { "" }
                );
            }

            let allocates = pass
                .texture_allocates
                .iter()
                .map(|id| {
                    let texture = self.registry.texture(*id);
                    format!("{} ({:?})", texture.name(), texture.desc.format.to_vk())
                })
                .chain(pass.buffer_allocates.iter().map(|id| self.registry.buffer(*id).name().to_string()))
                .collect_vec();
            if !allocates.is_empty() {
                log::info!("│ Allocate: {}", allocates.join(", "));
            }
            let destroys = pass
                .texture_destroys
                .iter()
                .map(|id| self.registry.texture(*id).name().to_string())
                .chain(pass.buffer_destroys.iter().map(|id| self.registry.buffer(*id).name().to_string()))
                .collect_vec();
            if !destroys.is_empty() {
                log::info!("│ Release:  {}", destroys.join(", "));
            }

            let barriers = &self.barriers[index];
            if barriers.has_barriers() {
                log::info!("├─────────────────────────────────────────────────────────────────┤");
                self.log_barriers("Before", &barriers.before);
                self.log_barriers("After", &barriers.after);
            } else {
                log::info!("│ No barriers required");
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        log::info!("");
        log::info!("═══════════════════════ End of Execution Plan ═══════════════════════");
    }
}
