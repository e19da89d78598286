//! graph 级别的场景测试，使用录制设备与录制命令列表

use std::cell::Cell;

use glam::Vec4;
use prism_gfx::barrier::GfxBarrier;
use prism_gfx::buffer::{GfxBufferDesc, GfxBufferSubresourceDesc};
use prism_gfx::device::{GfxCommandList, GfxDevice};
use prism_gfx::flags::GfxBindFlags;
use prism_gfx::format::GfxFormat;
use prism_gfx::recording::{GfxCommand, GfxRecordingCommandList, GfxRecordingDevice};
use prism_gfx::render_pass::GfxLoadAccess;
use prism_gfx::resource_state::GfxResourceState;
use prism_gfx::texture::{GfxClearValue, GfxTextureDesc, GfxTextureSubresourceDesc};

use super::*;
use crate::rg_name;

fn color_desc() -> GfxTextureDesc {
    GfxTextureDesc::new_2d(64, 64, GfxFormat::R8G8B8A8Unorm)
}

/// 使用新的设备和资源池执行一帧
fn execute_frame(compiled: &mut RgCompiledGraph) -> (GfxRecordingDevice, GfxRecordingCommandList, RgResourcePool) {
    let mut device = GfxRecordingDevice::new();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();
    (device, cmd, pool)
}

#[derive(Clone, Copy, Default)]
struct WriteData {
    output: RgTextureReadWriteId,
}

#[derive(Clone, Copy, Default)]
struct ReadData {
    input: RgTextureReadOnlyId,
}

#[derive(Clone, Copy, Default)]
struct ReadWriteData {
    input: RgTextureReadOnlyId,
    output: RgTextureReadWriteId,
}

// 声明与版本
#[test]
fn test_idempotent_declaration() {
    let mut graph = RenderGraph::default();
    for pass in ["A", "B"] {
        graph.add_pass::<(), _, _>(
            pass,
            RgPassType::Compute,
            RgPassFlags::empty(),
            |_, builder| {
                builder.declare_texture(rg_name!("Shared"), color_desc());
                builder.write_texture(rg_name!("Shared"), Default::default());
            },
            |_, _, _| {},
        );
    }

    assert_eq!(graph.registry().texture_count(), 1);
    // 两个 Pass 都是创建者，写入不附带隐式读取
    assert!(graph.passes()[1].texture_reads().is_empty());
}

#[test]
#[should_panic(expected = "re-declared with a different desc")]
fn test_conflicting_declaration_panics() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "A",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_texture(rg_name!("Conflict"), color_desc());
            builder.declare_texture(rg_name!("Conflict"), GfxTextureDesc::new_2d(32, 32, GfxFormat::R8G8B8A8Unorm));
        },
        |_, _, _| {},
    );
}

#[test]
fn test_version_monotonicity() {
    let mut graph = RenderGraph::default();
    let first = graph.add_pass::<WriteData, _, _>(
        "First",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("History"), color_desc());
            data.output = builder.write_texture(rg_name!("History"), Default::default());
        },
        |_, _, _| {},
    );
    let read_first = graph.add_pass::<ReadData, _, _>(
        "ReadFirst",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("History"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    let second = graph.add_pass::<WriteData, _, _>(
        "Second",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.output = builder.write_texture(rg_name!("History"), Default::default());
        },
        |_, _, _| {},
    );
    let read_second = graph.add_pass::<ReadData, _, _>(
        "ReadSecond",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("History"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    assert_eq!(first.output.version(), 1);
    assert_eq!(read_first.input.version(), first.output.version());
    assert!(second.output.version() > read_first.input.version());
    assert_eq!(read_second.input.version(), second.output.version());
    assert_eq!(read_second.input.pass(), RgPassId(3));
}

// 剔除
#[test]
fn test_round_trip_and_empty_pass_culled() {
    let resolved = Cell::new(0u32);
    let mut graph = RenderGraph::default();

    let a = graph.add_pass::<WriteData, _, _>(
        "A",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("T"), GfxTextureDesc::new_2d(1, 1, GfxFormat::R8G8B8A8Unorm));
            data.output = builder.write_texture(rg_name!("T"), Default::default());
        },
        |data, ctx, _| {
            ctx.read_write_texture(data.output);
        },
    );
    let b = graph.add_pass::<ReadData, _, _>(
        "B",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("T"), RgReadAccess::NonPixelShader, Default::default());
        },
        |data, ctx, _| {
            ctx.read_only_texture(data.input);
            assert_eq!(ctx.texture_desc(data.input).width, 1);
            resolved.set(resolved.get() + 1);
        },
    );
    graph.add_pass::<(), _, _>("C", RgPassType::Compute, RgPassFlags::empty(), |_, _| {}, |_, _, _| {});

    assert_eq!(b.input.version(), a.output.version());

    let mut compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names(), vec!["A", "B"]);
    assert!(compiled.pass(RgPassId(2)).is_culled());

    let (device, _, _) = execute_frame(&mut compiled);
    assert_eq!(resolved.get(), 1);
    // A 与 B 解析到同一个物理纹理
    assert_eq!(device.created_texture_count(), 1);
    assert_eq!(device.live_descriptor_count(), 0);
}

#[test]
fn test_culled_pass_is_not_executed() {
    let executed = Cell::new(false);
    let mut graph = RenderGraph::default();

    graph.add_pass::<WriteData, _, _>(
        "Unused",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Unused"), color_desc());
            data.output = builder.write_texture(rg_name!("Unused"), Default::default());
        },
        |_, _, _| executed.set(true),
    );
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Used"), color_desc());
            data.output = builder.write_texture(rg_name!("Used"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Used"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    assert!(compiled.pass_by_name("Unused").unwrap().is_culled());

    let (device, cmd, _) = execute_frame(&mut compiled);
    assert!(!executed.get());
    // 被剔除 Pass 独占的资源不会分配
    assert_eq!(device.created_texture_count(), 1);
    assert!(!cmd.event_names().contains(&"Unused"));
}

#[test]
fn test_transitive_culling() {
    let mut graph = RenderGraph::default();

    graph.add_pass::<WriteData, _, _>(
        "Downsample",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Half"), color_desc());
            data.output = builder.write_texture(rg_name!("Half"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadWriteData, _, _>(
        "Blur",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Half"), RgReadAccess::NonPixelShader, Default::default());
            builder.declare_texture(rg_name!("Blurred"), color_desc());
            data.output = builder.write_texture(rg_name!("Blurred"), Default::default());
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    assert!(compiled.executed_pass_names().is_empty());
    assert!(compiled.passes().iter().all(|pass| pass.is_culled()));
    assert!(compiled.dependency_graph().level(0).is_none());
}

#[test]
fn test_unread_modification_chain_is_culled() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Create",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("History"), color_desc());
            data.output = builder.write_texture(rg_name!("History"), Default::default());
        },
        |_, _, _| {},
    );
    for name in ["Modify", "Refine"] {
        graph.add_pass::<WriteData, _, _>(
            name,
            RgPassType::Compute,
            RgPassFlags::empty(),
            |data, builder| {
                data.output = builder.write_texture(rg_name!("History"), Default::default());
            },
            |_, _, _| {},
        );
    }
    // 有读者的同构链保持存活
    graph.add_pass::<WriteData, _, _>(
        "Clear",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Accum"), color_desc());
            data.output = builder.write_texture(rg_name!("Accum"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<WriteData, _, _>(
        "Accumulate",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.output = builder.write_texture(rg_name!("Accum"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Resolve",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Accum"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    assert!(compiled.pass_by_name("Create").unwrap().is_culled());
    assert!(compiled.pass_by_name("Modify").unwrap().is_culled());
    assert!(compiled.pass_by_name("Refine").unwrap().is_culled());
    assert_eq!(compiled.executed_pass_names(), vec!["Clear", "Accumulate", "Resolve"]);
}

#[test]
fn test_force_no_cull_and_imported_writes() {
    let mut device = GfxRecordingDevice::new();
    let backbuffer = device.create_texture(&color_desc(), "Backbuffer").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("Backbuffer"), backbuffer, color_desc());

    graph.add_pass::<WriteData, _, _>(
        "Present",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.output = builder.write_texture(rg_name!("Backbuffer"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<WriteData, _, _>(
        "Readback",
        RgPassType::Compute,
        RgPassFlags::FORCE_NO_CULL,
        |data, builder| {
            builder.declare_texture(rg_name!("Readback"), color_desc());
            data.output = builder.write_texture(rg_name!("Readback"), Default::default());
        },
        |_, _, _| {},
    );

    assert!(graph.passes()[0].flags.contains(RgPassFlags::FORCE_NO_CULL));

    let compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names(), vec!["Present", "Readback"]);
}

#[test]
fn test_imported_depth_read_forces_no_cull() {
    let depth_desc = GfxTextureDesc::new_2d(64, 64, GfxFormat::D32Float);
    let mut device = GfxRecordingDevice::new();
    let depth = device.create_texture(&depth_desc, "SceneDepth").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("SceneDepth"), depth, depth_desc);
    graph.add_pass::<(), _, _>(
        "DepthTest",
        RgPassType::Graphics,
        RgPassFlags::empty(),
        |_, builder| {
            builder.read_depth_stencil(
                rg_name!("SceneDepth"),
                RgLoadStoreAccessOp::PRESERVE_PRESERVE,
                RgLoadStoreAccessOp::NO_ACCESS,
                Default::default(),
            );
            builder.set_viewport(64, 64);
        },
        |_, _, _| {},
    );

    let node = &graph.passes()[0];
    assert!(node.flags.contains(RgPassFlags::FORCE_NO_CULL));
    assert!(node.depth_stencil().unwrap().read_only);
    assert_eq!(node.texture_state(node.depth_stencil().unwrap().handle.resource()), Some(GfxResourceState::DEPTH_READ));
}

#[test]
fn test_culling_disabled() {
    let mut graph = RenderGraph::new(RenderGraphConfig {
        cull_passes: false,
        ..Default::default()
    });
    graph.add_pass::<WriteData, _, _>(
        "Unused",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Unused"), color_desc());
            data.output = builder.write_texture(rg_name!("Unused"), Default::default());
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names(), vec!["Unused"]);
}

// 读写语义
#[test]
fn test_implicit_read_on_write() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Create",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Accum"), color_desc());
            data.output = builder.write_texture(rg_name!("Accum"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<WriteData, _, _>(
        "Accumulate",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.output = builder.write_texture(rg_name!("Accum"), Default::default());
        },
        |_, _, _| {},
    );
    let overwrite = graph.add_pass::<WriteData, _, _>(
        "Overwrite",
        RgPassType::Compute,
        RgPassFlags::ACT_AS_CREATOR_WHEN_WRITING,
        |data, builder| {
            data.output = builder.write_texture(rg_name!("Accum"), Default::default());
        },
        |_, _, _| {},
    );
    let read = graph.add_pass::<ReadData, _, _>(
        "Resolve",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Accum"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let accum = graph.registry().texture_id(rg_name!("Accum"));
    let passes = graph.passes();
    assert!(!passes[0].texture_reads().contains(&accum));
    assert!(passes[1].texture_reads().contains(&accum));
    assert!(!passes[2].texture_reads().contains(&accum));
    assert!(passes[3].texture_reads().contains(&accum));
    // 隐式读取与显式读取都计入引用
    assert_eq!(graph.registry().texture(accum).info.ref_count, 2);
    assert_eq!(overwrite.output.version(), 3);
    assert_eq!(read.input.version(), 3);

    // 隐式读取不参与声明顺序校验
    let compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names().len(), 4);
}

#[test]
fn test_compute_reads_use_non_pixel_state() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Input"), color_desc());
            data.output = builder.write_texture(rg_name!("Input"), Default::default());
        },
        |_, _, _| {},
    );
    let read = graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Input"), RgReadAccess::PixelShader, Default::default());
        },
        |_, _, _| {},
    );

    assert_eq!(
        graph.passes()[1].texture_state(read.input.resource()),
        Some(GfxResourceState::NON_PIXEL_SHADER_RESOURCE)
    );
}

#[test]
fn test_read_states_merge_within_pass() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Shadow"), color_desc());
            data.output = builder.write_texture(rg_name!("Shadow"), Default::default());
        },
        |_, _, _| {},
    );
    let read = graph.add_pass::<ReadData, _, _>(
        "Lighting",
        RgPassType::Graphics,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Shadow"), RgReadAccess::PixelShader, Default::default());
            builder.read_texture(rg_name!("Shadow"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    assert_eq!(
        graph.passes()[1].texture_state(read.input.resource()),
        Some(GfxResourceState::ALL_SHADER_RESOURCE)
    );
    // 同一个 Pass 多次读取只计一次引用
    assert_eq!(graph.registry().texture(read.input.resource()).info.ref_count, 1);
}

#[test]
fn test_initial_state_promotion() {
    let mut device = GfxRecordingDevice::new();
    let external = device.create_texture(&color_desc(), "External").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("External"), external, color_desc());
    graph.add_pass::<(), _, _>(
        "Draw",
        RgPassType::Graphics,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_texture(rg_name!("Color"), color_desc());
            builder.declare_texture(
                rg_name!("Preset"),
                color_desc().with_initial_state(GfxResourceState::PIXEL_SHADER_RESOURCE),
            );
            builder.write_render_target(rg_name!("Color"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
            builder.write_render_target(rg_name!("Preset"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
            builder.write_render_target(rg_name!("External"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
            builder.set_viewport(64, 64);
        },
        |_, _, _| {},
    );

    let registry = graph.registry();
    let initial = |name: RgResourceName| registry.texture_by_name(name).unwrap().desc.initial_state;
    assert_eq!(initial(rg_name!("Color")), GfxResourceState::RENDER_TARGET);
    assert_eq!(initial(rg_name!("Preset")), GfxResourceState::PIXEL_SHADER_RESOURCE);
    assert_eq!(initial(rg_name!("External")), GfxResourceState::COMMON);

    let color = registry.texture_by_name(rg_name!("Color")).unwrap();
    assert!(color.desc.bind_flags.contains(GfxBindFlags::RENDER_TARGET));
    assert_eq!(color.declared_desc.bind_flags, GfxBindFlags::empty());
}

#[test]
fn test_view_deduplication() {
    let mut graph = RenderGraph::default();
    let write = graph.add_pass::<WriteData, _, _>(
        "BuildMips",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Pyramid"), color_desc().with_mips(4));
            data.output = builder.write_texture(rg_name!("Pyramid"), GfxTextureSubresourceDesc::mip(0));
        },
        |_, _, _| {},
    );
    let mut reads = Vec::new();
    for (pass, desc) in [
        ("ReadAll", GfxTextureSubresourceDesc::default()),
        ("ReadAllAgain", GfxTextureSubresourceDesc::default()),
        ("ReadMip1", GfxTextureSubresourceDesc::mip(1)),
    ] {
        reads.push(graph.add_pass::<ReadData, _, _>(
            pass,
            RgPassType::Compute,
            RgPassFlags::empty(),
            |data, builder| {
                data.input = builder.read_texture(rg_name!("Pyramid"), RgReadAccess::NonPixelShader, desc);
            },
            |_, _, _| {},
        ));
    }

    assert_eq!(write.output.view(), 0);
    assert_eq!(reads[0].input.view(), 1);
    assert_eq!(reads[1].input.view(), 1);
    assert_eq!(reads[2].input.view(), 2);
    assert_eq!(graph.registry().texture_by_name(rg_name!("Pyramid")).unwrap().view_descs().len(), 3);
}

#[test]
fn test_optional_resource_fallback() {
    #[derive(Clone, Copy, Default)]
    struct LightingData {
        ambient_occlusion: RgTextureReadOnlyId,
    }

    let resolved = Cell::new(0u32);
    let mut device = GfxRecordingDevice::new();
    let white = device.create_texture(&color_desc(), "White").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("White"), white, color_desc());
    let lighting = graph.add_pass::<LightingData, _, _>(
        "Lighting",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            let name = if builder.is_texture_declared(rg_name!("AmbientOcclusion")) {
                rg_name!("AmbientOcclusion")
            } else {
                rg_name!("White")
            };
            data.ambient_occlusion = builder.read_texture(name, RgReadAccess::NonPixelShader, Default::default());
        },
        |data, ctx, _| {
            assert!(data.ambient_occlusion.is_valid());
            ctx.read_only_texture(data.ambient_occlusion);
            resolved.set(resolved.get() + 1);
        },
    );
    assert_eq!(lighting.ambient_occlusion.resource(), graph.registry().texture_id(rg_name!("White")));

    let mut compiled = graph.compile();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    assert_eq!(resolved.get(), 1);
    assert_eq!(device.live_descriptor_count(), 0);
    // 导入的纹理不归 graph 管理
    assert_eq!(device.live_texture_count(), 1);
    assert_eq!(compiled.registry().texture_by_name(rg_name!("White")).unwrap().physical_handle(), Some(white));
}

#[test]
fn test_blackboard_shares_data_between_passes() {
    #[derive(Clone, Copy)]
    struct GBufferOutputs {
        normal: RgResourceName,
    }

    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "GBuffer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("GBufferNormal"), color_desc());
            data.output = builder.write_texture(rg_name!("GBufferNormal"), Default::default());
            builder.blackboard_mut().create(GBufferOutputs {
                normal: rg_name!("GBufferNormal"),
            });
        },
        |_, _, _| {},
    );
    let read = graph.add_pass::<ReadData, _, _>(
        "Decals",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            let normal = builder.blackboard().get_checked::<GBufferOutputs>().normal;
            data.input = builder.read_texture(normal, RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    assert_eq!(read.input.resource(), graph.registry().texture_id(rg_name!("GBufferNormal")));
    assert!(graph.blackboard().contains::<GBufferOutputs>());
}

// barrier
#[test]
fn test_barrier_sufficiency() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "Draw",
        RgPassType::Graphics,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_texture(rg_name!("SceneColor"), color_desc());
            builder.write_render_target(rg_name!("SceneColor"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
            builder.set_viewport(64, 64);
        },
        |_, _, _| {},
    );
    for pass in ["Tonemap", "Histogram"] {
        graph.add_pass::<ReadData, _, _>(
            pass,
            RgPassType::Graphics,
            RgPassFlags::SKIP_AUTO_RENDER_PASS,
            |data, builder| {
                data.input = builder.read_texture(rg_name!("SceneColor"), RgReadAccess::PixelShader, Default::default());
            },
            |_, _, _| {},
        );
    }

    let compiled = graph.compile();
    let scene_color = RgResourceKey::Texture(compiled.registry().texture_id(rg_name!("SceneColor")));

    // 新分配的纹理已经处于 RENDER_TARGET
    assert!(!compiled.barriers(RgPassId(0)).has_barriers());
    assert_eq!(
        compiled.barriers(RgPassId(1)).before,
        vec![RgBarrierDesc::new(
            scene_color,
            GfxResourceState::RENDER_TARGET,
            GfxResourceState::PIXEL_SHADER_RESOURCE
        )]
    );
    assert!(compiled.barriers(RgPassId(2)).before.is_empty());
    assert_eq!(
        compiled.barriers(RgPassId(2)).after,
        vec![RgBarrierDesc::new(
            scene_color,
            GfxResourceState::PIXEL_SHADER_RESOURCE,
            GfxResourceState::RENDER_TARGET
        )]
    );
}

#[test]
fn test_buffer_barriers_start_from_common() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "Cull",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_buffer(rg_name!("DrawArgs"), GfxBufferDesc::indirect_args(16, 16));
            builder.write_buffer(rg_name!("DrawArgs"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<(), _, _>(
        "Draw",
        RgPassType::Graphics,
        RgPassFlags::SKIP_AUTO_RENDER_PASS,
        |_, builder| {
            builder.read_indirect_args_buffer(rg_name!("DrawArgs"));
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    let args = RgResourceKey::Buffer(compiled.registry().buffer_id(rg_name!("DrawArgs")));
    assert_eq!(
        compiled.barriers(RgPassId(0)).before,
        vec![RgBarrierDesc::new(args, GfxResourceState::COMMON, GfxResourceState::UNORDERED_ACCESS)]
    );
    assert_eq!(
        compiled.barriers(RgPassId(1)).before,
        vec![RgBarrierDesc::new(
            args,
            GfxResourceState::UNORDERED_ACCESS,
            GfxResourceState::INDIRECT_ARGUMENT
        )]
    );
    assert_eq!(
        compiled.barriers(RgPassId(1)).after,
        vec![RgBarrierDesc::new(args, GfxResourceState::INDIRECT_ARGUMENT, GfxResourceState::COMMON)]
    );
}

#[test]
fn test_imported_texture_in_initial_state_needs_no_barrier() {
    let white_desc = color_desc().with_initial_state(GfxResourceState::ALL_SHADER_RESOURCE);
    let mut device = GfxRecordingDevice::new();
    let white = device.create_texture(&white_desc, "White").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("White"), white, white_desc);
    graph.add_pass::<ReadData, _, _>(
        "Lighting",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("White"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    assert!(compiled.barriers(RgPassId(0)).before.is_empty());
    assert!(compiled.barriers(RgPassId(0)).after.is_empty());

    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();
    assert_eq!(cmd.barriers().count(), 0);
}

#[test]
fn test_executed_barriers_use_physical_handles() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Target"), color_desc());
            data.output = builder.write_texture(rg_name!("Target"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Target"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    let mut device = GfxRecordingDevice::new();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    let barriers = cmd.barriers().copied().collect::<Vec<_>>();
    assert_eq!(barriers.len(), 2);
    let physical = match barriers[0].resource {
        prism_gfx::barrier::GfxBarrierResource::Texture(handle) => handle,
        _ => panic!("expected a texture barrier"),
    };
    assert_eq!(device.texture_name(physical), Some("Target"));
    assert_eq!(
        barriers,
        vec![
            GfxBarrier::texture(
                physical,
                GfxResourceState::UNORDERED_ACCESS,
                GfxResourceState::NON_PIXEL_SHADER_RESOURCE
            ),
            GfxBarrier::texture(
                physical,
                GfxResourceState::NON_PIXEL_SHADER_RESOURCE,
                GfxResourceState::UNORDERED_ACCESS
            ),
        ]
    );
    // 归还资源池时处于初始状态
    assert_eq!(pool.texture_count(), 1);
    assert_eq!(pool.active_texture_count(), 0);
}

// 句柄解析
#[test]
#[should_panic(expected = "obtained by another pass")]
fn test_handle_is_bound_to_its_pass() {
    let mut graph = RenderGraph::default();
    let producer = graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Target"), color_desc());
            data.output = builder.write_texture(rg_name!("Target"), Default::default());
        },
        |_, _, _| {},
    );
    let stolen = producer.output;
    graph.add_pass::<ReadData, _, _>(
        "Thief",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Target"), RgReadAccess::NonPixelShader, Default::default());
        },
        move |_, ctx, _| {
            ctx.read_write_texture(stolen);
        },
    );

    let mut compiled = graph.compile();
    execute_frame(&mut compiled);
}

#[test]
#[should_panic(expected = "resolves an invalid")]
fn test_invalid_handle_panics() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<ReadData, _, _>(
        "Invalid",
        RgPassType::Compute,
        RgPassFlags::FORCE_NO_CULL,
        |_, _| {},
        |data, ctx, _| {
            ctx.read_only_texture(data.input);
        },
    );

    let mut compiled = graph.compile();
    execute_frame(&mut compiled);
}

// 校验
#[test]
#[should_panic(expected = "before any earlier pass writes it")]
fn test_read_before_write_panics() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<ReadData, _, _>(
        "Early",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("NeverWritten"), color_desc());
            data.input = builder.read_texture(rg_name!("NeverWritten"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    graph.compile();
}

#[test]
fn test_read_before_write_allowed_without_validation() {
    let mut graph = RenderGraph::new(RenderGraphConfig {
        validate_declaration_order: false,
        ..Default::default()
    });
    graph.add_pass::<ReadData, _, _>(
        "Early",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("NeverWritten"), color_desc());
            data.input = builder.read_texture(rg_name!("NeverWritten"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    let compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names(), vec!["Early"]);
}

#[test]
#[should_panic(expected = "has not been declared")]
fn test_undeclared_resource_panics() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<ReadData, _, _>(
        "Lost",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Missing"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
}

#[test]
#[should_panic(expected = "is not allowed in copy pass")]
fn test_copy_pass_rejects_shader_access() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Copy",
        RgPassType::Copy,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Dst"), color_desc());
            data.output = builder.write_texture(rg_name!("Dst"), Default::default());
        },
        |_, _, _| {},
    );
}

// 执行
#[test]
fn test_render_pass_desc() {
    let clear_color = Vec4::new(0.1, 0.2, 0.3, 1.0);
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "GBuffer",
        RgPassType::Graphics,
        RgPassFlags::FORCE_NO_CULL | RgPassFlags::LEGACY_RENDER_PASS,
        |_, builder| {
            builder.declare_texture(
                rg_name!("Albedo"),
                color_desc().with_clear_value(GfxClearValue::Color(clear_color)),
            );
            builder.declare_texture(
                rg_name!("Depth"),
                GfxTextureDesc::new_2d(64, 64, GfxFormat::D32Float)
                    .with_clear_value(GfxClearValue::DepthStencil { depth: 0.0, stencil: 0 }),
            );
            builder.write_render_target(rg_name!("Albedo"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
            builder.write_depth_stencil(
                rg_name!("Depth"),
                RgLoadStoreAccessOp::CLEAR_PRESERVE,
                RgLoadStoreAccessOp::NO_ACCESS,
                Default::default(),
            );
            builder.set_viewport(64, 32);
        },
        |_, _, cmd| cmd.draw(3, 1),
    );

    let mut compiled = graph.compile();
    let (device, cmd, _) = execute_frame(&mut compiled);

    let commands = cmd.commands();
    let begin = commands
        .iter()
        .position(|command| matches!(command, GfxCommand::BeginRenderPass(_)))
        .unwrap();
    let GfxCommand::BeginRenderPass(desc) = &commands[begin] else {
        unreachable!()
    };
    assert_eq!((desc.width, desc.height), (64, 32));
    assert!(desc.legacy);
    assert!(!desc.allow_uav_writes);
    assert_eq!(desc.color_attachments.len(), 1);
    assert_eq!(desc.color_attachments[0].load, GfxLoadAccess::Clear);
    assert_eq!(desc.color_attachments[0].clear_color, clear_color);
    let depth = desc.depth_attachment.unwrap();
    assert_eq!(depth.clear_depth, 0.0);
    assert_eq!(depth.stencil_load, GfxLoadAccess::NoAccess);
    assert!(!depth.read_only);

    assert!(matches!(commands[begin - 1], GfxCommand::BeginEvent(ref name) if name == "GBuffer"));
    assert!(matches!(
        commands[begin + 1],
        GfxCommand::Draw {
            vertex_count: 3,
            instance_count: 1
        }
    ));
    assert!(matches!(commands[begin + 2], GfxCommand::EndRenderPass));
    assert!(matches!(commands[begin + 3], GfxCommand::EndEvent));
    assert_eq!(device.created_texture_count(), 2);
}

#[test]
fn test_skip_auto_render_pass() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "Manual",
        RgPassType::Graphics,
        RgPassFlags::FORCE_NO_CULL | RgPassFlags::SKIP_AUTO_RENDER_PASS,
        |_, builder| {
            builder.declare_texture(rg_name!("Manual"), color_desc());
            builder.write_render_target(rg_name!("Manual"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    let (_, cmd, _) = execute_frame(&mut compiled);
    assert!(!cmd.commands().iter().any(|command| matches!(command, GfxCommand::BeginRenderPass(_))));
}

#[test]
#[should_panic(expected = "has a zero viewport")]
fn test_zero_viewport_panics() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "NoViewport",
        RgPassType::Graphics,
        RgPassFlags::FORCE_NO_CULL,
        |_, builder| {
            builder.declare_texture(rg_name!("Target"), color_desc());
            builder.write_render_target(rg_name!("Target"), RgLoadStoreAccessOp::CLEAR_PRESERVE, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    execute_frame(&mut compiled);
}

#[test]
fn test_buffer_with_counter() {
    #[derive(Clone, Copy, Default)]
    struct EmitData {
        particles: RgBufferReadWriteId,
    }

    let emitted = Cell::new(false);
    let mut graph = RenderGraph::default();
    let emit = graph.add_pass::<EmitData, _, _>(
        "Emit",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_buffer(rg_name!("Particles"), GfxBufferDesc::structured(128, 16));
            builder.declare_buffer(rg_name!("ParticleCounter"), GfxBufferDesc::new(4));
            data.particles = builder.write_buffer_with_counter(
                rg_name!("Particles"),
                rg_name!("ParticleCounter"),
                GfxBufferSubresourceDesc::default(),
            );
        },
        |data, ctx, cmd| {
            ctx.read_write_buffer(data.particles);
            cmd.dispatch(1, 1, 1);
            emitted.set(true);
        },
    );
    graph.add_pass::<(), _, _>(
        "Simulate",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.read_buffer(rg_name!("Particles"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let registry = graph.registry();
    let particles = registry.buffer_by_name(rg_name!("Particles")).unwrap();
    let counter_id = registry.buffer_id(rg_name!("ParticleCounter"));
    assert_eq!(particles.view_descs()[emit.particles.view() as usize].counter, Some(counter_id));
    assert!(registry.buffer(counter_id).desc.bind_flags.contains(GfxBindFlags::UNORDERED_ACCESS));
    assert!(graph.passes()[0].buffer_writes().contains(&counter_id));
    // 创建者写入不附带隐式读取
    assert!(graph.passes()[0].buffer_reads().is_empty());

    let mut compiled = graph.compile();
    let (device, _, pool) = execute_frame(&mut compiled);
    assert!(emitted.get());
    assert_eq!(device.created_buffer_count(), 2);
    assert_eq!(device.live_descriptor_count(), 0);
    assert_eq!(pool.active_buffer_count(), 0);
}

#[test]
fn test_counter_created_by_another_pass() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "ResetCounter",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_buffer(rg_name!("DrawCounter"), GfxBufferDesc::new(4));
            builder.write_buffer(rg_name!("DrawCounter"), GfxBufferSubresourceDesc::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<(), _, _>(
        "Append",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_buffer(rg_name!("DrawList"), GfxBufferDesc::structured(64, 16));
            builder.write_buffer_with_counter(
                rg_name!("DrawList"),
                rg_name!("DrawCounter"),
                GfxBufferSubresourceDesc::default(),
            );
        },
        |_, _, _| {},
    );

    let counter = graph.registry().buffer_id(rg_name!("DrawCounter"));
    let list = graph.registry().buffer_id(rg_name!("DrawList"));
    // 只有 DrawList 由 Append 创建，counter 的旧内容被读取
    assert!(graph.passes()[1].buffer_reads().contains(&counter));
    assert!(!graph.passes()[1].buffer_reads().contains(&list));

    // 没有读者时 Append 被剔除，它对 counter 的读取不再保留 ResetCounter
    let compiled = graph.compile();
    assert!(compiled.executed_pass_names().is_empty());
}

#[test]
fn test_in_frame_aliasing() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "A",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("T1"), color_desc());
            data.output = builder.write_texture(rg_name!("T1"), Default::default());
        },
        |_, _, _| {},
    );
    for (pass, input, output) in [
        ("B", rg_name!("T1"), rg_name!("T2")),
        ("C", rg_name!("T2"), rg_name!("T3")),
    ] {
        graph.add_pass::<ReadWriteData, _, _>(
            pass,
            RgPassType::Compute,
            RgPassFlags::empty(),
            |data, builder| {
                data.input = builder.read_texture(input, RgReadAccess::NonPixelShader, Default::default());
                builder.declare_texture(output, color_desc());
                data.output = builder.write_texture(output, Default::default());
            },
            |_, _, _| {},
        );
    }
    graph.add_pass::<ReadData, _, _>(
        "D",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("T3"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    let t1 = compiled.registry().texture_id(rg_name!("T1"));
    assert!(compiled.pass(RgPassId(1)).texture_destroys.contains(&t1));

    let (device, _, pool) = execute_frame(&mut compiled);
    // T3 复用了在 B 之后释放的 T1
    assert_eq!(device.created_texture_count(), 2);
    assert_eq!(pool.texture_count(), 2);
}

/// 同一个纹理在两帧中以不同的初始状态使用
fn resting_state_frame(render_target_first: bool) -> RenderGraph<'static> {
    let mut graph = RenderGraph::default();
    for (index, pass) in ["First", "Second"].into_iter().enumerate() {
        let as_render_target = (index == 0) == render_target_first;
        let pass_type = if as_render_target { RgPassType::Graphics } else { RgPassType::Compute };
        graph.add_pass::<(), _, _>(
            pass,
            pass_type,
            RgPassFlags::empty(),
            |_, builder| {
                if index == 0 {
                    builder.declare_texture(rg_name!("Lighting"), color_desc());
                }
                if as_render_target {
                    builder.write_render_target(
                        rg_name!("Lighting"),
                        RgLoadStoreAccessOp::PRESERVE_PRESERVE,
                        Default::default(),
                    );
                    builder.set_viewport(64, 64);
                } else {
                    builder.write_texture(rg_name!("Lighting"), Default::default());
                }
            },
            |_, _, _| {},
        );
    }
    graph.add_pass::<ReadData, _, _>(
        "Composite",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Lighting"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    graph
}

#[test]
fn test_pool_resting_state_fixup() {
    let mut device = GfxRecordingDevice::new();
    let mut pool = RgResourcePool::default();

    let mut cmd = GfxRecordingCommandList::new();
    resting_state_frame(true).compile().execute(&mut pool, &mut device, &mut cmd).unwrap();

    let mut cmd = GfxRecordingCommandList::new();
    let mut compiled = resting_state_frame(false).compile();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    assert_eq!(device.created_texture_count(), 1);
    let first_barriers = cmd
        .commands()
        .iter()
        .find_map(|command| match command {
            GfxCommand::Barriers(barriers) => Some(barriers.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_barriers.len(), 1);
    assert_eq!(first_barriers[0].before, GfxResourceState::RENDER_TARGET);
    assert_eq!(first_barriers[0].after, GfxResourceState::UNORDERED_ACCESS);
}

fn single_texture_frame<'a>(executed: &'a Cell<u32>) -> RenderGraph<'a> {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Persistent"), color_desc());
            data.output = builder.write_texture(rg_name!("Persistent"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Persistent"), RgReadAccess::NonPixelShader, Default::default());
        },
        move |_, _, _| executed.set(executed.get() + 1),
    );
    graph
}

#[test]
fn test_pool_reuse_and_eviction_across_frames() {
    let executed = Cell::new(0);
    let mut device = GfxRecordingDevice::new();
    let mut pool = RgResourcePool::new(RenderGraphConfig::default().pool_eviction_frames);
    let mut cmd = GfxRecordingCommandList::new();

    for _ in 0..3 {
        cmd.clear();
        single_texture_frame(&executed).compile().execute(&mut pool, &mut device, &mut cmd).unwrap();
    }
    assert_eq!(executed.get(), 3);
    assert_eq!(device.created_texture_count(), 1);
    assert_eq!(pool.texture_count(), 1);

    // 空帧：资源闲置一段时间后被回收
    RenderGraph::default().compile().execute(&mut pool, &mut device, &mut cmd).unwrap();
    assert_eq!(pool.texture_count(), 1);
    for _ in 0..8 {
        RenderGraph::default().compile().execute(&mut pool, &mut device, &mut cmd).unwrap();
    }
    assert_eq!(pool.texture_count(), 0);
    assert_eq!(device.live_texture_count(), 0);
}

#[test]
fn test_allocation_failure_cleans_up() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Valid"), color_desc());
            data.output = builder.write_texture(rg_name!("Valid"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadWriteData, _, _>(
        "Broken",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Valid"), RgReadAccess::NonPixelShader, Default::default());
            builder.declare_texture(rg_name!("Empty"), GfxTextureDesc::new_2d(0, 0, GfxFormat::R8G8B8A8Unorm));
            data.output = builder.write_texture(rg_name!("Empty"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Empty"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    let mut device = GfxRecordingDevice::new();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    let err = compiled.execute(&mut pool, &mut device, &mut cmd).unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("failed to allocate texture"), "{message}");
    assert!(message.contains("Broken"), "{message}");
    assert_eq!(device.live_descriptor_count(), 0);
    assert_eq!(pool.active_texture_count(), 0);
    assert_eq!(pool.texture_count(), 1);
    assert!(compiled.registry().iter_textures().all(|(_, texture)| texture.physical_handle().is_none()));
}

#[test]
fn test_failed_pass_closes_open_events() {
    let mut graph = RenderGraph::default();
    graph.push_event("Frame");
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Valid"), color_desc());
            data.output = builder.write_texture(rg_name!("Valid"), Default::default());
        },
        |_, _, _| {},
    );
    graph.push_event("PostProcess");
    graph.add_pass::<ReadWriteData, _, _>(
        "Broken",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Valid"), RgReadAccess::NonPixelShader, Default::default());
            builder.declare_texture(rg_name!("Empty"), GfxTextureDesc::new_2d(0, 0, GfxFormat::R8G8B8A8Unorm));
            data.output = builder.write_texture(rg_name!("Empty"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Empty"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    graph.pop_event();
    graph.pop_event();

    let mut compiled = graph.compile();
    let mut device = GfxRecordingDevice::new();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    assert!(compiled.execute(&mut pool, &mut device, &mut cmd).is_err());

    assert_eq!(cmd.event_names(), vec!["Frame", "Producer"]);
    let begin_count = cmd.commands().iter().filter(|c| matches!(c, GfxCommand::BeginEvent(_))).count();
    let end_count = cmd.commands().iter().filter(|c| matches!(c, GfxCommand::EndEvent)).count();
    assert_eq!(begin_count, end_count);
    assert!(matches!(cmd.commands().last(), Some(GfxCommand::EndEvent)));
}

#[test]
fn test_device_failure_propagates() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::FORCE_NO_CULL,
        |data, builder| {
            builder.declare_texture(rg_name!("OutOfMemory"), color_desc());
            data.output = builder.write_texture(rg_name!("OutOfMemory"), Default::default());
        },
        |_, _, _| {},
    );

    let mut compiled = graph.compile();
    let mut device = GfxRecordingDevice::new();
    device.set_fail_allocations(true);
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();

    assert!(compiled.execute(&mut pool, &mut device, &mut cmd).is_err());
    assert!(cmd.commands().is_empty());
    assert_eq!(pool.texture_count(), 0);
}

// export
#[test]
fn test_export_texture() {
    let mut device = GfxRecordingDevice::new();
    let screenshot = device.create_texture(&color_desc(), "Screenshot").unwrap();

    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Final",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("FinalColor"), color_desc());
            data.output = builder.write_texture(rg_name!("FinalColor"), Default::default());
        },
        |_, _, _| {},
    );
    graph.export_texture(rg_name!("FinalColor"), screenshot, color_desc());

    let mut compiled = graph.compile();
    assert_eq!(compiled.executed_pass_names().len(), 2);

    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    let copy = cmd
        .commands()
        .iter()
        .find_map(|command| match command {
            GfxCommand::CopyTexture { dst, src } => Some((*dst, *src)),
            _ => None,
        })
        .unwrap();
    assert_eq!(copy.0, screenshot);
    assert_eq!(device.texture_name(copy.1), Some("FinalColor"));
    assert!(
        cmd.barriers()
            .any(|barrier| *barrier == GfxBarrier::texture(screenshot, GfxResourceState::COMMON, GfxResourceState::COPY_DEST))
    );
    assert!(
        cmd.barriers()
            .any(|barrier| *barrier == GfxBarrier::texture(screenshot, GfxResourceState::COPY_DEST, GfxResourceState::COMMON))
    );
}

#[test]
fn test_export_buffer() {
    let mut device = GfxRecordingDevice::new();
    let readback = device.create_buffer(&GfxBufferDesc::new(256), "Readback").unwrap();

    let mut graph = RenderGraph::default();
    graph.add_pass::<(), _, _>(
        "Stats",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.declare_buffer(rg_name!("Stats"), GfxBufferDesc::new(256));
            builder.write_buffer(rg_name!("Stats"), Default::default());
        },
        |_, _, _| {},
    );
    graph.export_buffer(rg_name!("Stats"), readback, GfxBufferDesc::new(256));

    let mut compiled = graph.compile();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    assert!(
        cmd.commands()
            .iter()
            .any(|command| matches!(command, GfxCommand::CopyBuffer { dst, .. } if *dst == readback))
    );
    assert_eq!(device.live_buffer_count(), 2);
    assert_eq!(pool.active_buffer_count(), 0);
}

// 事件
#[test]
fn test_events_clamped_to_alive_passes() {
    let mut graph = RenderGraph::default();
    graph.push_event("Frame");
    graph.add_pass::<WriteData, _, _>(
        "Dead",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("DeadOutput"), color_desc());
            data.output = builder.write_texture(rg_name!("DeadOutput"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<WriteData, _, _>(
        "Producer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Output"), color_desc());
            data.output = builder.write_texture(rg_name!("Output"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<ReadData, _, _>(
        "Consumer",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.input = builder.read_texture(rg_name!("Output"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );
    graph.pop_event();
    graph.push_event("Culled");
    graph.add_pass::<(), _, _>("Empty", RgPassType::Compute, RgPassFlags::empty(), |_, _| {}, |_, _, _| {});
    graph.pop_event();

    let mut compiled = graph.compile();
    assert_eq!(compiled.events().len(), 2);

    let (_, cmd, _) = execute_frame(&mut compiled);
    assert_eq!(cmd.event_names(), vec!["Frame", "Producer", "Consumer"]);

    let begin_count = cmd.commands().iter().filter(|c| matches!(c, GfxCommand::BeginEvent(_))).count();
    let end_count = cmd.commands().iter().filter(|c| matches!(c, GfxCommand::EndEvent)).count();
    assert_eq!(begin_count, end_count);
    assert!(matches!(cmd.commands().last(), Some(GfxCommand::EndEvent)));
}

#[test]
#[should_panic(expected = "push_event without matching pop_event")]
fn test_unbalanced_events_panic() {
    let mut graph = RenderGraph::default();
    graph.push_event("Open");
    graph.compile();
}

// trait 形式的 Pass
struct ClearPass {
    target: RgTextureReadWriteId,
}

impl RgPass for ClearPass {
    fn pass_type(&self) -> RgPassType {
        RgPassType::Compute
    }

    fn setup(&mut self, builder: &mut RgBuilder) {
        self.target = builder.write_texture(rg_name!("Swapchain"), Default::default());
    }

    fn execute(&self, ctx: &RgContext, cmd: &mut dyn GfxCommandList) {
        ctx.read_write_texture(self.target);
        cmd.dispatch(8, 8, 1);
    }
}

#[test]
fn test_rg_pass_trait() {
    let mut device = GfxRecordingDevice::new();
    let swapchain = device.create_texture(&color_desc(), "Swapchain").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("Swapchain"), swapchain, color_desc());
    graph.add_rg_pass(
        "Clear",
        ClearPass {
            target: RgTextureReadWriteId::invalid(),
        },
    );

    let mut compiled = graph.compile();
    let mut cmd = GfxRecordingCommandList::new();
    let mut pool = RgResourcePool::default();
    compiled.execute(&mut pool, &mut device, &mut cmd).unwrap();

    assert!(cmd.commands().iter().any(|command| matches!(command, GfxCommand::Dispatch { x: 8, y: 8, z: 1 })));
}

// 分析与调试输出
#[test]
fn test_dependency_levels() {
    let mut graph = RenderGraph::default();
    graph.add_pass::<WriteData, _, _>(
        "Depth",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Depth"), color_desc());
            data.output = builder.write_texture(rg_name!("Depth"), Default::default());
        },
        |_, _, _| {},
    );
    for (pass, output) in [("Ssao", rg_name!("Ssao")), ("Shadows", rg_name!("Shadows"))] {
        graph.add_pass::<ReadWriteData, _, _>(
            pass,
            RgPassType::Compute,
            RgPassFlags::empty(),
            |data, builder| {
                data.input = builder.read_texture(rg_name!("Depth"), RgReadAccess::NonPixelShader, Default::default());
                builder.declare_texture(output, color_desc());
                data.output = builder.write_texture(output, Default::default());
            },
            |_, _, _| {},
        );
    }
    graph.add_pass::<(), _, _>(
        "Lighting",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |_, builder| {
            builder.read_texture(rg_name!("Ssao"), RgReadAccess::NonPixelShader, Default::default());
            builder.read_texture(rg_name!("Shadows"), RgReadAccess::NonPixelShader, Default::default());
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    let deps = compiled.dependency_graph();
    assert_eq!(deps.level(0), Some(0));
    assert_eq!(deps.level(1), Some(1));
    assert_eq!(deps.level(2), Some(1));
    assert_eq!(deps.level(3), Some(2));
    assert_eq!(deps.passes_by_level(), vec![vec![0], vec![1, 2], vec![3]]);
}

#[test]
fn test_graphviz_dump() {
    let mut device = GfxRecordingDevice::new();
    let backbuffer = device.create_texture(&color_desc(), "Backbuffer").unwrap();

    let mut graph = RenderGraph::default();
    graph.import_texture(rg_name!("Backbuffer"), backbuffer, color_desc());
    graph.add_pass::<WriteData, _, _>(
        "Unused",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            builder.declare_texture(rg_name!("Unused"), color_desc());
            data.output = builder.write_texture(rg_name!("Unused"), Default::default());
        },
        |_, _, _| {},
    );
    graph.add_pass::<WriteData, _, _>(
        "Present",
        RgPassType::Compute,
        RgPassFlags::empty(),
        |data, builder| {
            data.output = builder.write_texture(rg_name!("Backbuffer"), Default::default());
        },
        |_, _, _| {},
    );

    let compiled = graph.compile();
    let dot = compiled.to_graphviz();
    assert!(dot.starts_with("digraph RenderGraph {"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("Unused"));
    assert!(dot.contains("Present"));
    assert!(dot.contains("gray"));
    assert!(dot.contains("lightblue"));

    let path = std::env::temp_dir().join(format!("prism_render_graph_{}.dot", std::process::id()));
    compiled.dump(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), dot);
    let _ = std::fs::remove_file(&path);
}
