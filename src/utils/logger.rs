// ============================================================================
// Lara - 日志工具
// ============================================================================
//
// 文件: src/utils/logger.rs
// 职责: 面向用户的控制台输出和 tracing 初始化
// 边界:
//   - ✅ 带级别前缀的用户输出
//   - ✅ tracing 订阅器初始化（RUST_LOG / --verbose）
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应包含文件日志写入
//
// ============================================================================

use tracing_subscriber::EnvFilter;

use super::colors::Colors;
use super::constants::APP_NAME;

/// 简单的日志工具
pub struct Logger;

impl Logger {
    /// 初始化诊断日志，RUST_LOG 优先
    pub fn init(verbose: bool) {
        let default_level = if verbose { "lara=debug" } else { "lara=warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn info<S: AsRef<str>>(msg: S) {
        println!("{} {}", Colors::info(&format!("[{}]", APP_NAME)), msg.as_ref());
    }

    pub fn warn<S: AsRef<str>>(msg: S) {
        println!("{} {}", Colors::warn("[WARN]"), msg.as_ref());
    }

    pub fn error<S: AsRef<str>>(msg: S) {
        eprintln!("{} {}", Colors::error("[ERROR]"), msg.as_ref());
    }

    pub fn success<S: AsRef<str>>(msg: S) {
        println!("{} {}", Colors::success(&format!("[{}]", APP_NAME)), msg.as_ref());
    }
}
