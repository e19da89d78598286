//! TOML 配置加载

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// 从 TOML 文件加载配置
pub fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("failed to read config file: {:?}", path))?;

    parse_toml(&content).with_context(|| format!("failed to parse config file: {:?}", path))
}

/// 从 TOML 字符串解析配置
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config = toml::from_str(content).context("invalid TOML")?;
    Ok(config)
}

/// 如果文件存在则加载，否则返回默认配置
pub fn load_toml_or_default<T: DeserializeOwned + Default, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("config file {:?} not found, using defaults", path);
        return Ok(T::default());
    }
    load_toml(path)
}
