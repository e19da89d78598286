use std::io::Write;

/// 初始化全局 logger
///
/// 默认过滤级别为 Info，可以通过 `RUST_LOG` 环境变量覆盖。
pub fn init_log() {
    init_log_with_level(log::LevelFilter::Info);
}

/// 以指定的默认级别初始化全局 logger
pub fn init_log_with_level(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            let info_style = buf
                .default_level_style(log::Level::Info)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green)));
            let warn_style = buf
                .default_level_style(log::Level::Warn)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
            let error_style = buf
                .default_level_style(log::Level::Error)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

            let level_style = match record.level() {
                log::Level::Info => info_style,
                log::Level::Warn => warn_style,
                log::Level::Error => error_style,
                _ => buf.default_level_style(record.level()),
            };
            let grey_style = info_style.fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));
            let text_style = info_style.fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(75, 75, 75))));

            let line = record.line().unwrap_or(!0);
            // 兼容 windows 与 unix 的路径分隔符
            let file = record.file().unwrap_or("").rsplit(['\\', '/']).next().unwrap_or("");
            let time = chrono::Local::now().format("%H:%M:%S%.3f");
            let level = record.level();

            writeln!(
                buf,
                "{level_style}[{time}] {level:<5}{level_style:#} {grey_style}[{file}:{line}]{grey_style:#} \
                 {text_style}{}{text_style:#}",
                record.args()
            )
        })
        .filter(None, level)
        .parse_env("RUST_LOG")
        .try_init();

    if let Err(e) = result {
        log::warn!("logger already initialized: {e}");
    }
}
