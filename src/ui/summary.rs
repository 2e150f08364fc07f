// ============================================================================
// Lara - 运行结果汇总
// ============================================================================
//
// 文件: src/ui/summary.rs
// 职责: 翻译运行结果汇总显示
// 边界:
//   - ✅ 文件数和键数统计输出
//   - ✅ 失败文件逐条列出
//   - ✅ 国际化文本支持
//   - ❌ 不应包含翻译逻辑
//   - ❌ 不应决定退出码
//
// ============================================================================

use std::io::{self, Write};

use crate::core::engine::{OutcomeStatus, RunReport};
use crate::utils::colors::Colors;
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 渲染运行汇总
pub fn render_run_summary(report: &RunReport) {
    let totals = report.totals();
    let failed = report.failures().count();

    let summary_lines = vec![
        "".to_string(),
        Colors::bold(&t!("summary.title")),
        "═══════════════════════════════════════".to_string(),
        format!("{} {}", icons::FILE, tf!("summary.files_written", report.written())),
        format!("{} {}", icons::SKIP, tf!("summary.files_unchanged", report.unchanged())),
        format!("{} {}", icons::ERROR, tf!("summary.files_failed", failed)),
        format!(
            "{} {}",
            icons::ARROW,
            tf!(
                "summary.keys",
                totals.translated,
                totals.copied,
                totals.kept,
                totals.removed
            )
        ),
        format!(
            "{} {}",
            icons::TIME,
            tf!("summary.duration", format!("{:.2}", report.elapsed.as_secs_f64()))
        ),
    ];

    for line in summary_lines {
        Logger::info(line);
    }

    let _ = io::stdout().flush();
}

/// 逐条输出失败的文件
pub fn print_failures(report: &RunReport) {
    for outcome in report.failures() {
        if let OutcomeStatus::Failed(message) = &outcome.status {
            Logger::error(tf!(
                "translate.file_error",
                Colors::bold(outcome.display_path()),
                message
            ));
        }
    }
}
