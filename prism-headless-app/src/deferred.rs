//! 延迟渲染帧
//!
//! ```text
//! ┌─────────────┐   albedo / normal / depth
//! │   GBuffer   │──────────────┬──────────────┐
//! └─────────────┘              ▼              │
//!                      ┌─────────────┐        │
//!                      │    Ssao     │ (可选) │
//!                      └──────┬──────┘        │
//!                             ▼               ▼
//!                      ┌────────────────────────┐
//!                      │        Lighting        │──> HdrColor
//!                      └────────────────────────┘
//!                                   │
//!                      ┌────────────▼───────────┐
//!                      │   Bloom (可选, 原地)   │
//!                      └────────────┬───────────┘
//!                                   ▼
//!                      ┌────────────────────────┐
//!                      │        Tonemap         │──> Backbuffer
//!                      └────────────────────────┘
//! ```
//!
//! `DebugOverlay` 的输出没有读者，每帧都会被剔除。

use glam::Vec4;
use prism_gfx::device::GfxDevice;
use prism_gfx::format::GfxFormat;
use prism_gfx::handles::GfxTextureHandle;
use prism_gfx::recording::{GfxRecordingCommandList, GfxRecordingDevice};
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::{GfxClearValue, GfxTextureDesc};
use prism_render_graph::render_graph::*;
use prism_render_graph::rg_name;

use crate::app_config::HeadlessAppConfig;

/// GBuffer 的输出，通过 blackboard 传给后续 Pass
#[derive(Clone, Copy)]
pub struct GBufferOutputs {
    pub albedo: RgResourceName,
    pub normal: RgResourceName,
    pub depth: RgResourceName,
}

#[derive(Clone, Copy, Default)]
struct GBufferPassData {
    albedo: RgRenderTargetId,
    normal: RgRenderTargetId,
    depth: RgDepthStencilId,
}

#[derive(Clone, Copy, Default)]
struct SsaoPassData {
    depth: RgTextureReadOnlyId,
    normal: RgTextureReadOnlyId,
    output: RgTextureReadWriteId,
}

#[derive(Clone, Copy, Default)]
struct LightingPassData {
    albedo: RgTextureReadOnlyId,
    normal: RgTextureReadOnlyId,
    depth: RgTextureReadOnlyId,
    ambient_occlusion: RgTextureReadOnlyId,
    output: RgTextureReadWriteId,
}

#[derive(Clone, Copy, Default)]
struct TonemapPassData {
    input: RgTextureReadOnlyId,
    output: RgRenderTargetId,
}

/// 8x8 线程组
#[inline]
fn group_count(extent: u32) -> u32 {
    extent.div_ceil(8)
}

pub struct DeferredApp {
    config: HeadlessAppConfig,

    device: GfxRecordingDevice,
    pool: RgResourcePool,

    /// 外部资源：每帧导入 graph
    backbuffer: GfxTextureHandle,
    white: GfxTextureHandle,
    screenshot: GfxTextureHandle,

    frame_index: u32,
}

// new & init
impl DeferredApp {
    pub fn new(config: HeadlessAppConfig) -> anyhow::Result<Self> {
        let mut device = GfxRecordingDevice::new();

        let backbuffer = device.create_texture(&Self::backbuffer_desc(&config), "Backbuffer")?;
        let white = device.create_texture(&Self::white_desc(), "White")?;
        let screenshot = device.create_texture(&Self::hdr_desc(&config), "Screenshot")?;

        let pool = RgResourcePool::new(config.render_graph.pool_eviction_frames);

        Ok(Self {
            config,
            device,
            pool,
            backbuffer,
            white,
            screenshot,
            frame_index: 0,
        })
    }

    fn backbuffer_desc(config: &HeadlessAppConfig) -> GfxTextureDesc {
        GfxTextureDesc::new_2d(config.width, config.height, GfxFormat::B8G8R8A8Unorm)
    }

    fn hdr_desc(config: &HeadlessAppConfig) -> GfxTextureDesc {
        GfxTextureDesc::new_2d(config.width, config.height, GfxFormat::R16G16B16A16Float)
    }

    /// 没有 AO 时使用的 1x1 白色纹理
    fn white_desc() -> GfxTextureDesc {
        GfxTextureDesc::new_2d(1, 1, GfxFormat::R8Unorm).with_initial_state(GfxResourceState::ALL_SHADER_RESOURCE)
    }

    pub fn destroy(mut self) {
        self.pool.destroy(&mut self.device);
        self.device.destroy_texture(self.backbuffer);
        self.device.destroy_texture(self.white);
        self.device.destroy_texture(self.screenshot);
        log::info!(
            "DeferredApp destroyed, live textures: {}, live buffers: {}",
            self.device.live_texture_count(),
            self.device.live_buffer_count()
        );
    }
}

// getter
impl DeferredApp {
    #[inline]
    pub fn device(&self) -> &GfxRecordingDevice {
        &self.device
    }

    #[inline]
    pub fn pool(&self) -> &RgResourcePool {
        &self.pool
    }

    #[inline]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }
}

// frame
impl DeferredApp {
    pub fn run(&mut self) -> anyhow::Result<()> {
        for _ in 0..self.config.frames {
            let cmd = self.render_frame()?;
            log::info!(
                "frame {}: {} commands, {} barriers, pooled textures: {}",
                self.frame_index,
                cmd.commands().len(),
                cmd.barriers().count(),
                self.pool.texture_count()
            );
            self.frame_index += 1;
        }
        log::info!(
            "{} frames rendered, {} textures and {} buffers created",
            self.config.frames,
            self.device.created_texture_count(),
            self.device.created_buffer_count()
        );
        Ok(())
    }

    /// 构建、编译并执行一帧，返回录制的命令
    pub fn render_frame(&mut self) -> anyhow::Result<GfxRecordingCommandList> {
        let _span = prism_crate_tools::profile_scope!("DeferredApp::render_frame");

        let capture = self.config.capture_last_frame && self.frame_index + 1 == self.config.frames;
        let mut compiled = self.build_graph(capture).compile();

        if self.frame_index == 0 {
            if !self.config.render_graph.log_execution_plan {
                compiled.print_execution_plan();
            }
            if let Some(path) = &self.config.dump_path {
                compiled.dump(path)?;
            }
        }

        let mut cmd = GfxRecordingCommandList::new();
        compiled.execute(&mut self.pool, &mut self.device, &mut cmd)?;
        Ok(cmd)
    }

    pub fn build_graph(&self, capture: bool) -> RenderGraph<'static> {
        let config = &self.config;
        let (width, height) = (config.width, config.height);

        let mut graph = RenderGraph::new(config.render_graph.clone());
        graph.import_texture(rg_name!("Backbuffer"), self.backbuffer, Self::backbuffer_desc(config));
        graph.import_texture(rg_name!("White"), self.white, Self::white_desc());

        graph.push_event("Frame");

        graph.add_pass::<GBufferPassData, _, _>(
            "GBuffer",
            RgPassType::Graphics,
            RgPassFlags::empty(),
            |data, builder| {
                let outputs = GBufferOutputs {
                    albedo: rg_name!("GBufferAlbedo"),
                    normal: rg_name!("GBufferNormal"),
                    depth: rg_name!("SceneDepth"),
                };
                builder.declare_texture(
                    outputs.albedo,
                    GfxTextureDesc::new_2d(width, height, GfxFormat::R8G8B8A8Unorm)
                        .with_clear_value(GfxClearValue::Color(Vec4::ZERO)),
                );
                builder.declare_texture(
                    outputs.normal,
                    GfxTextureDesc::new_2d(width, height, GfxFormat::R16G16B16A16Float)
                        .with_clear_value(GfxClearValue::Color(Vec4::new(0.0, 0.0, 1.0, 0.0))),
                );
                builder.declare_texture(
                    outputs.depth,
                    GfxTextureDesc::new_2d(width, height, GfxFormat::D32Float)
                        .with_clear_value(GfxClearValue::DepthStencil { depth: 0.0, stencil: 0 }),
                );

                data.albedo =
                    builder.write_render_target(outputs.albedo, RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
                data.normal =
                    builder.write_render_target(outputs.normal, RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
                data.depth = builder.write_depth_stencil(
                    outputs.depth,
                    RgLoadStoreAccessOp::CLEAR_PRESERVE,
                    RgLoadStoreAccessOp::NO_ACCESS,
                    Default::default(),
                );
                builder.set_viewport(width, height);
                builder.blackboard_mut().add(outputs);
            },
            |data, ctx, cmd| {
                let _ = (ctx.render_target(data.albedo), ctx.render_target(data.normal), ctx.depth_stencil(data.depth));
                // 全屏三角形代替场景
                cmd.draw(3, 1);
            },
        );

        if config.ambient_occlusion {
            graph.add_pass::<SsaoPassData, _, _>(
                "Ssao",
                RgPassType::Compute,
                RgPassFlags::empty(),
                |data, builder| {
                    let gbuffer = *builder.blackboard().get_checked::<GBufferOutputs>();
                    data.depth = builder.read_texture(gbuffer.depth, RgReadAccess::NonPixelShader, Default::default());
                    data.normal = builder.read_texture(gbuffer.normal, RgReadAccess::NonPixelShader, Default::default());

                    builder.declare_texture(
                        rg_name!("AmbientOcclusion"),
                        GfxTextureDesc::new_2d(width, height, GfxFormat::R8Unorm),
                    );
                    data.output = builder.write_texture(rg_name!("AmbientOcclusion"), Default::default());
                },
                move |data, ctx, cmd| {
                    let _ = (ctx.read_only_texture(data.depth), ctx.read_only_texture(data.normal));
                    let _ = ctx.read_write_texture(data.output);
                    cmd.dispatch(group_count(width), group_count(height), 1);
                },
            );
        }

        graph.add_pass::<LightingPassData, _, _>(
            "Lighting",
            RgPassType::Compute,
            RgPassFlags::empty(),
            |data, builder| {
                let gbuffer = *builder.blackboard().get_checked::<GBufferOutputs>();
                data.albedo = builder.read_texture(gbuffer.albedo, RgReadAccess::NonPixelShader, Default::default());
                data.normal = builder.read_texture(gbuffer.normal, RgReadAccess::NonPixelShader, Default::default());
                data.depth = builder.read_texture(gbuffer.depth, RgReadAccess::NonPixelShader, Default::default());

                let ambient_occlusion = if builder.is_texture_declared(rg_name!("AmbientOcclusion")) {
                    rg_name!("AmbientOcclusion")
                } else {
                    rg_name!("White")
                };
                data.ambient_occlusion =
                    builder.read_texture(ambient_occlusion, RgReadAccess::NonPixelShader, Default::default());

                builder.declare_texture(rg_name!("HdrColor"), GfxTextureDesc::new_2d(width, height, GfxFormat::R16G16B16A16Float));
                data.output = builder.write_texture(rg_name!("HdrColor"), Default::default());
            },
            move |data, ctx, cmd| {
                let _ = (
                    ctx.read_only_texture(data.albedo),
                    ctx.read_only_texture(data.normal),
                    ctx.read_only_texture(data.depth),
                    ctx.read_only_texture(data.ambient_occlusion),
                );
                let _ = ctx.read_write_texture(data.output);
                cmd.dispatch(group_count(width), group_count(height), 1);
            },
        );

        graph.add_pass::<(), _, _>(
            "DebugOverlay",
            RgPassType::Compute,
            RgPassFlags::empty(),
            |_, builder| {
                builder.declare_texture(rg_name!("DebugOverlay"), GfxTextureDesc::new_2d(width, height, GfxFormat::R8G8B8A8Unorm));
                builder.write_texture(rg_name!("DebugOverlay"), Default::default());
            },
            move |_, _, cmd| cmd.dispatch(group_count(width), group_count(height), 1),
        );

        if capture {
            graph.export_texture(rg_name!("HdrColor"), self.screenshot, Self::hdr_desc(config));
        }

        graph.push_event("PostProcess");
        if config.bloom {
            // 原地修改 HdrColor，写入附带隐式读取
            graph.add_pass::<RgTextureReadWriteId, _, _>(
                "Bloom",
                RgPassType::Compute,
                RgPassFlags::empty(),
                |data, builder| {
                    *data = builder.write_texture(rg_name!("HdrColor"), Default::default());
                },
                move |data, ctx, cmd| {
                    let _ = ctx.read_write_texture(*data);
                    cmd.dispatch(group_count(width / 2), group_count(height / 2), 1);
                },
            );
        }

        graph.add_pass::<TonemapPassData, _, _>(
            "Tonemap",
            RgPassType::Graphics,
            RgPassFlags::empty(),
            |data, builder| {
                data.input = builder.read_texture(rg_name!("HdrColor"), RgReadAccess::PixelShader, Default::default());
                data.output = builder.write_render_target(
                    rg_name!("Backbuffer"),
                    RgLoadStoreAccessOp::DISCARD_PRESERVE,
                    Default::default(),
                );
                builder.set_viewport(width, height);
            },
            |data, ctx, cmd| {
                let _ = (ctx.read_only_texture(data.input), ctx.render_target(data.output));
                cmd.draw(3, 1);
            },
        );
        graph.pop_event();

        graph.pop_event();
        graph
    }
}
