//! graphviz 导出
//!
//! Pass 为方框、资源为椭圆；写入边从 Pass 指向资源，读取边从资源指向 Pass。
//! 被剔除的 Pass 为灰色，导入的资源使用单独的颜色。

use std::fmt::Write;
use std::path::Path;

use anyhow::Context;

use super::executor::RgCompiledGraph;

impl RgCompiledGraph<'_> {
    /// 生成 graphviz dot 文本
    pub fn to_graphviz(&self) -> String {
        let mut dot = String::new();
        // 写入 String 不会失败
        let _ = self.write_graphviz(&mut dot);
        dot
    }

    /// 把 graphviz dot 文本写入文件
    pub fn dump(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_graphviz()).with_context(|| format!("failed to write render graph dump: {:?}", path))?;
        log::info!("RenderGraph dumped to {:?}", path);
        Ok(())
    }

    fn write_graphviz(&self, dot: &mut String) -> std::fmt::Result {
        writeln!(dot, "digraph RenderGraph {{")?;
        writeln!(dot, "  rankdir=LR;")?;
        writeln!(dot, "  node [fontname=\"Consolas\"];")?;

        for (index, pass) in self.passes.iter().enumerate() {
            let (color, style) = if pass.is_culled() { ("gray", "dashed") } else { ("orange", "filled") };
            let level = self.dependency_graph.level(index).map(|level| format!("\\nlevel {level}")).unwrap_or_default();
            writeln!(
                dot,
                "  \"pass_{index}\" [label=\"{}\\n{:?}{level}\", shape=\"rectangle\", style=\"{style}\", fillcolor=\"{color}\", color=\"{color}\"];",
                pass.name, pass.pass_type
            )?;
        }

        for (id, texture) in self.registry.iter_textures() {
            let color = if texture.is_imported() { "lightblue" } else { "lightyellow" };
            writeln!(
                dot,
                "  \"texture_{:?}\" [label=\"{}\\n{}x{} {:?}\", shape=\"ellipse\", style=\"filled\", fillcolor=\"{color}\"];",
                id,
                texture.name(),
                texture.desc.width,
                texture.desc.height,
                texture.desc.format
            )?;
        }
        for (id, buffer) in self.registry.iter_buffers() {
            let color = if buffer.is_imported() { "lightblue" } else { "palegreen" };
            writeln!(
                dot,
                "  \"buffer_{:?}\" [label=\"{}\\n{} bytes\", shape=\"ellipse\", style=\"filled\", fillcolor=\"{color}\"];",
                id,
                buffer.name(),
                buffer.desc.size
            )?;
        }

        for (index, pass) in self.passes.iter().enumerate() {
            for id in &pass.texture_writes {
                writeln!(dot, "  \"pass_{index}\" -> \"texture_{:?}\" [color=\"red\"];", id)?;
            }
            for id in pass.texture_reads.iter().filter(|id| !pass.implicit_texture_reads.contains(*id)) {
                writeln!(dot, "  \"texture_{:?}\" -> \"pass_{index}\" [color=\"blue\"];", id)?;
            }
            for id in &pass.buffer_writes {
                writeln!(dot, "  \"pass_{index}\" -> \"buffer_{:?}\" [color=\"red\"];", id)?;
            }
            for id in pass.buffer_reads.iter().filter(|id| !pass.implicit_buffer_reads.contains(*id)) {
                writeln!(dot, "  \"buffer_{:?}\" -> \"pass_{index}\" [color=\"blue\"];", id)?;
            }
        }

        writeln!(dot, "}}")
    }
}
