use std::io::Write;

/// 初始化全局 logger，默认级别为 Info
///
/// 重复调用是安全的，只有第一次调用会生效，方便测试中在每个用例开头调用。
pub fn init_log() {
    init_log_with_level(log::LevelFilter::Info);
}

/// 以指定的默认级别初始化全局 logger，`RUST_LOG` 可以覆盖
///
/// 每条日志的格式为 `[time] LEVEL crate [file:line] message`
pub fn init_log_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            let level_style = match record.level() {
                log::Level::Error => anstyle::AnsiColor::Red.on_default().bold(),
                log::Level::Warn => anstyle::AnsiColor::Yellow.on_default(),
                log::Level::Info => anstyle::AnsiColor::Green.on_default(),
                _ => buf.default_level_style(record.level()),
            };
            let crate_style = anstyle::AnsiColor::Cyan.on_default();
            let grey_style = anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

            let time = chrono::Local::now().format("%H:%M:%S%.3f");
            let file = short_file_name(record.file().unwrap_or(""));
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{time}] {level_style}{:<5}{level_style:#} {crate_style}{}{crate_style:#} {grey_style}[{file}:{line}]{grey_style:#} {}",
                record.level(),
                crate_name(record.target()),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .is_test(cfg!(test))
        .try_init();
}

/// `a/b/compiler.rs` -> `compiler.rs`，同时处理 Windows 路径
fn short_file_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// log target 的第一段，即产生日志的 crate
fn crate_name(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_file_name() {
        assert_eq!(short_file_name("engine/crates/garden-gsl/src/compiler.rs"), "compiler.rs");
        assert_eq!(short_file_name("src\\loader.rs"), "loader.rs");
        assert_eq!(short_file_name("lib.rs"), "lib.rs");
        assert_eq!(short_file_name(""), "");
    }

    #[test]
    fn test_crate_name() {
        assert_eq!(crate_name("garden_gsl::compiler"), "garden_gsl");
        assert_eq!(crate_name("garden_gslh"), "garden_gslh");
    }

    #[test]
    fn test_init_log_twice() {
        init_log_with_level(log::LevelFilter::Debug);
        init_log();
        log::info!("logger initialized");
    }
}
