// ============================================================================
// Lara - English Translation Table
// ============================================================================
//
// 文件: src/i18n/en_us.rs
// 职责: English interface strings
// 边界:
//   - ✅ English translation strings definition
//   - ❌ Should not contain translation logic
//   - ❌ Should not contain other language translations
//
// ============================================================================

/// English translation table
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // Init command
    ("init.start", "Scanning project for translation files..."),
    ("init.config_exists", "Config file already exists: {}"),
    ("init.use_force_hint", "Use --force to overwrite the existing config file"),
    ("init.found_locales", "Found locales: {}"),
    ("init.found_files", "Found {} files: {}"),
    (
        "init.no_targets",
        "No target locales found, pass them with --targets it,fr",
    ),
    (
        "init.no_files",
        "No translation files for source locale '{}' found, add include paths to the config by hand",
    ),
    ("init.invalid_config", "Generated config is invalid"),
    ("init.create_failed", "Failed to write config file: {}"),
    ("init.config_created", "Config file created: {}"),
    (
        "init.next_steps",
        "Next: set provider.endpoint in the config, export your API key and run `lara translate`",
    ),
    // Translate command
    ("translate.no_config", "Config file not found: {} (run `lara init` first)"),
    ("translate.config_error", "Failed to load config file: {}"),
    ("translate.unknown_locale", "Locale '{}' is not a configured target locale"),
    ("translate.provider_error", "Failed to set up the translation provider"),
    ("translate.start", "Translating from {} into {}"),
    ("translate.file_error", "Error translating {}: {}"),
    ("translate.fatal", "Translation provider failure: {}"),
    (
        "translate.fatal_hint",
        "Check the API key in the environment variable {} and the provider endpoint, then run again",
    ),
    ("translate.aborted", "Translation aborted"),
    ("translate.failed", "{} file(s) failed to translate"),
    ("translate.done", "All files are up to date"),
    // Summary
    ("summary.title", "Translation summary"),
    ("summary.files_written", "Files written: {}"),
    ("summary.files_unchanged", "Files unchanged: {}"),
    ("summary.files_failed", "Files failed: {}"),
    (
        "summary.keys",
        "Keys: {} translated, {} copied, {} kept, {} removed",
    ),
    ("summary.duration", "Duration: {}s"),
];
