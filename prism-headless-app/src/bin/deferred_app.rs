//! 延迟渲染 headless 应用入口
//!
//! 配置从当前目录的 `prism-headless.toml` 读取，文件不存在时使用默认配置。

use prism_crate_tools::config::load_toml_or_default;
use prism_headless_app::app_config::HeadlessAppConfig;
use prism_headless_app::deferred::DeferredApp;

fn main() -> anyhow::Result<()> {
    prism_crate_tools::init_log::init_log();

    let config: HeadlessAppConfig = load_toml_or_default("prism-headless.toml")?;
    log::info!("{:#?}", config);
    if config.profiler {
        prism_crate_tools::profiling::start_profiler();
    }

    let mut app = DeferredApp::new(config)?;
    app.run()?;
    app.destroy();

    log::info!("end run.");
    Ok(())
}
