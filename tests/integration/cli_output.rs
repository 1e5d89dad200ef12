use markdesk::config::AppConfig;
use markdesk::tooling::cli::{CliContext, Commands, SettingsCommands};
use tempfile::TempDir;

async fn context(temp_dir: &TempDir) -> CliContext {
    CliContext::open(temp_dir.path().join("data"), &AppConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn status_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let mut cli = context(&temp_dir).await;

    let output = cli
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(parsed.get("data_dir").and_then(|v| v.as_str()).is_some());
    assert_eq!(parsed.get("files").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(parsed.get("folders").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        parsed.get("current_file").and_then(|v| v.as_str()),
        Some("/README.md")
    );
    assert!(parsed
        .get("integrity_issues")
        .and_then(|v| v.as_array())
        .map(|issues| issues.is_empty())
        .unwrap_or(false));
}

#[tokio::test]
async fn unknown_status_format_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut cli = context(&temp_dir).await;
    let result = cli
        .execute(&Commands::Status {
            format: "yaml".to_string(),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn commands_persist_across_invocations() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut cli = context(&temp_dir).await;
        cli.execute(&Commands::NewFolder {
            name: "ideas".to_string(),
            parent: None,
        })
        .await
        .unwrap();
        cli.execute(&Commands::NewFile {
            name: "rust".to_string(),
            parent: Some("ideas".to_string()),
        })
        .await
        .unwrap();
        cli.execute(&Commands::Mv {
            node: "ideas/rust.md".to_string(),
            dest: "/".to_string(),
        })
        .await
        .unwrap();
    }

    let mut cli = context(&temp_dir).await;
    let tree = cli.execute(&Commands::Tree).await.unwrap();
    assert!(tree.contains("ideas"));
    assert!(tree.contains("rust.md"));

    let listing = cli
        .execute(&Commands::Ls {
            folder: Some("ideas".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(listing, "(empty)\n");
}

#[tokio::test]
async fn settings_show_lists_overridden_shortcut() {
    let temp_dir = TempDir::new().unwrap();
    let mut cli = context(&temp_dir).await;
    cli.execute(&Commands::Settings {
        command: Some(SettingsCommands::Shortcut {
            action: "fmt.bold".to_string(),
            binding: Some("Mod+Shift+B".to_string()),
            reset: false,
        }),
    })
    .await
    .unwrap();

    let shown = cli.execute(&Commands::Settings { command: None }).await.unwrap();
    assert!(shown.contains("Mod+Shift+B"));
    assert!(shown.contains("custom"));
}

#[tokio::test]
async fn import_directory_then_cat_imported_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("vault");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("todo.md"), "- [ ] test").unwrap();

    let mut cli = context(&temp_dir).await;
    let out = cli
        .execute(&Commands::Import {
            path: source,
            parent: None,
            no_link: true,
        })
        .await
        .unwrap();
    assert_eq!(out, "Imported 1 file(s)\n");

    let text = cli
        .execute(&Commands::Cat {
            node: Some("vault/todo.md".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(text, "- [ ] test");
}
