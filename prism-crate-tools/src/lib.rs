//! Prism 工具集
//!
//! 提供日志初始化、性能分析 scope、TOML 配置加载等通用工具。
//!
//! # 配置加载
//! 任何实现了 `serde::Deserialize` 的配置结构都可以通过 [`config::load_toml`] 从文件加载。

pub mod config;
pub mod init_log;
pub mod profiling;
