//! 导出资源
//!
//! 把 graph 内的资源在帧末拷贝到外部持有的 GPU 对象中（例如下一帧使用的历史缓冲）。

use prism_gfx::buffer::GfxBufferDesc;
use prism_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use prism_gfx::texture::GfxTextureDesc;

use super::frame_graph::RenderGraph;
use super::handle::{RgBufferCopyDstId, RgBufferCopySrcId, RgTextureCopyDstId, RgTextureCopySrcId};
use super::pass::{RgPassFlags, RgPassType};
use super::resource_name::RgResourceName;

#[derive(Clone, Copy, Default)]
struct RgExportTextureData {
    src: RgTextureCopySrcId,
    dst: RgTextureCopyDstId,
}

#[derive(Clone, Copy, Default)]
struct RgExportBufferData {
    src: RgBufferCopySrcId,
    dst: RgBufferCopyDstId,
}

impl<'a> RenderGraph<'a> {
    /// 在当前位置添加一个拷贝 Pass，把 `name` 的内容拷贝到外部纹理 `target`
    ///
    /// 目标以 `"<name>::Export"` 的名字导入，拷贝 Pass 不会被剔除。
    pub fn export_texture(&mut self, name: RgResourceName, target: GfxTextureHandle, target_desc: GfxTextureDesc) {
        let export_name = RgResourceName::new(&format!("{name}::Export"));
        self.import_texture(export_name, target, target_desc);

        self.add_pass::<RgExportTextureData, _, _>(
            &format!("Export {name}"),
            RgPassType::Copy,
            RgPassFlags::FORCE_NO_CULL,
            |data, builder| {
                data.src = builder.read_copy_src_texture(name);
                data.dst = builder.write_copy_dst_texture(export_name);
            },
            |data, ctx, cmd| {
                cmd.copy_texture(ctx.copy_dst_texture(data.dst), ctx.copy_src_texture(data.src));
            },
        );
    }

    pub fn export_buffer(&mut self, name: RgResourceName, target: GfxBufferHandle, target_desc: GfxBufferDesc) {
        let export_name = RgResourceName::new(&format!("{name}::Export"));
        self.import_buffer(export_name, target, target_desc);

        self.add_pass::<RgExportBufferData, _, _>(
            &format!("Export {name}"),
            RgPassType::Copy,
            RgPassFlags::FORCE_NO_CULL,
            |data, builder| {
                data.src = builder.read_copy_src_buffer(name);
                data.dst = builder.write_copy_dst_buffer(export_name);
            },
            |data, ctx, cmd| {
                cmd.copy_buffer(ctx.copy_dst_buffer(data.dst), ctx.copy_src_buffer(data.src));
            },
        );
    }
}
