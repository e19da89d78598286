//! Prism RenderGraph
//!
//! 每帧重新构建的 pass DAG：声明资源意图、分析生命周期、剔除无用 pass、
//! 自动推导资源状态转换，然后按声明顺序在命令列表上执行。

pub mod render_graph;
