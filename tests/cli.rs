use std::fs;
use std::path::Path;

use lara::cli::init::{handle_init, InitArgs};
use lara::cli::translate::{handle_translate, TranslateArgs};
use lara::models::config::{
    ProjectConfig, ProviderKind, RuntimeArgs, CONFIG_FILE_NAME, LEDGER_FILE_NAME,
};

fn runtime(root: &Path) -> RuntimeArgs {
    RuntimeArgs {
        workspace_root: Some(root.to_string_lossy().to_string()),
        ..Default::default()
    }
}

fn translate_args() -> TranslateArgs {
    TranslateArgs {
        force: false,
        locales: Vec::new(),
        paths: Vec::new(),
    }
}

#[tokio::test]
async fn init_then_translate_with_pseudo_provider() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("locales")).unwrap();
    fs::write(root.join("locales/en.json"), "{\n  \"hello\": \"Hello\"\n}\n").unwrap();
    fs::write(root.join("locales/de.json"), "{}\n").unwrap();

    handle_init(
        InitArgs {
            source: None,
            targets: Vec::new(),
            force: false,
        },
        &runtime(root),
    )
    .unwrap();

    let config_path = root.join(CONFIG_FILE_NAME);
    let mut config = ProjectConfig::load(&config_path).unwrap();
    config.provider.kind = ProviderKind::Pseudo;
    config.save_to_file(&config_path).unwrap();

    handle_translate(translate_args(), &runtime(root)).await.unwrap();

    assert_eq!(
        fs::read_to_string(root.join("locales/de.json")).unwrap(),
        "{\n  \"hello\": \"[de] Hello\"\n}\n"
    );
    let ledger = fs::read_to_string(root.join(LEDGER_FILE_NAME)).unwrap();
    assert!(ledger.contains("1.0.0"));

    // 第二次运行不改动目标文件
    let before = fs::read_to_string(root.join("locales/de.json")).unwrap();
    handle_translate(translate_args(), &runtime(root)).await.unwrap();
    assert_eq!(fs::read_to_string(root.join("locales/de.json")).unwrap(), before);
}

#[tokio::test]
async fn translate_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = handle_translate(translate_args(), &runtime(dir.path())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_api_key_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("locales")).unwrap();
    fs::write(root.join("locales/en.json"), r#"{"hello":"Hello"}"#).unwrap();
    fs::write(
        root.join(CONFIG_FILE_NAME),
        r#"
locales:
  source: en
  target: [it]
files:
  json:
    include: ["locales/[locale].json"]
provider:
  kind: http
  endpoint: "http://127.0.0.1:9/translate"
  apiKeyEnv: LARA_TEST_KEY_THAT_IS_NEVER_SET
"#,
    )
    .unwrap();

    let result = handle_translate(translate_args(), &runtime(root)).await;
    assert!(result.is_err());
    assert!(!root.join("locales/it.json").exists());
}

#[tokio::test]
async fn failed_files_give_an_error_exit() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("po")).unwrap();
    fs::write(root.join("po/en.po"), "garbage line\n").unwrap();
    fs::write(
        root.join(CONFIG_FILE_NAME),
        "locales:\n  source: en\n  target: [it]\nfiles:\n  po:\n    include: [\"po/[locale].po\"]\nprovider:\n  kind: pseudo\n",
    )
    .unwrap();

    let result = handle_translate(translate_args(), &runtime(root)).await;
    assert!(result.is_err());
}
