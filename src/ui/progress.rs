// ============================================================================
// Lara - 翻译进度显示
// ============================================================================
//
// 文件: src/ui/progress.rs
// 职责: 每个文件 / 语言组合一个 spinner
// 边界:
//   - ✅ spinner 创建和结束状态
//   - ✅ --no-progress 时完全隐藏
//   - ❌ 不应包含翻译逻辑
//
// ============================================================================

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::utils::colors::Colors;
use crate::utils::constants::{icons, spinner_chars};

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(spinner_chars::BASE)
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("{wide_msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// 翻译进度
#[derive(Debug, Clone)]
pub struct TranslateProgress {
    multi: MultiProgress,
    enabled: bool,
}

impl Default for TranslateProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

impl TranslateProgress {
    pub fn new(enabled: bool) -> Self {
        let multi = MultiProgress::new();
        if !enabled {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { multi, enabled }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 开始一个文件 / 语言组合
    pub fn start(&self, label: &str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(label.to_string());
        if self.enabled {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        bar
    }

    pub fn finish_ok(&self, bar: &ProgressBar, label: &str) {
        bar.set_style(done_style());
        bar.finish_with_message(format!("{} {}", Colors::success(icons::SUCCESS), label));
    }

    pub fn finish_unchanged(&self, bar: &ProgressBar, label: &str) {
        bar.set_style(done_style());
        bar.finish_with_message(format!("{} {}", Colors::dim(icons::SKIP), Colors::dim(label)));
    }

    pub fn finish_failed(&self, bar: &ProgressBar, label: &str) {
        bar.set_style(done_style());
        bar.finish_with_message(format!("{} {}", Colors::error(icons::ERROR), label));
    }
}
