//! Tracy 性能分析辅助
//!
//! `tracy_client::span!` 在没有运行中的 `Client` 时会 panic，
//! 这里的宏只在 `Client` 已经启动时才创建 span，单元测试和 headless 运行不受影响。

/// 在当前作用域内打开一个 tracy span
///
/// 返回值需要绑定到变量上，离开作用域时 span 结束。
///
/// ```ignore
/// let _span = prism_crate_tools::profile_scope!("RenderGraph::compile");
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        $crate::profiling::tracy_client::Client::running()
            .map(|client| client.span($crate::profiling::tracy_client::span_location!($name), 0))
    };
}

#[doc(hidden)]
pub use tracy_client;

/// 启动 tracy client，之后 `profile_scope!` 才会真正记录数据
pub fn start_profiler() {
    let _client = tracy_client::Client::start();
    log::info!("tracy profiler started");
}
