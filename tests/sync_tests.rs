//! End-to-end pull / push flows against the file-backed template store.
//!
//! Every test gets its own temp directory holding the store document and the
//! `configs/` tree, so no network or shared state is involved.

use remote_config_sync::assembler::{Assembler, increase_local_version, local_version_number};
use remote_config_sync::config::{BackendConfig, BackendKind};
use remote_config_sync::error::{ErrorCode, SyncError, SyncPhase};
use remote_config_sync::store::{FileTemplateStore, TemplateStore, open_store};
use remote_config_sync::tree::ConfigLayout;
use remote_config_sync::types::{Parameter, REMOTE_CONFIG_INFO, Template};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A template as the backend would return it: every value is text.
fn sample_template() -> Value {
    json!({
        "conditions": [
            {
                "name": "development",
                "expression": "app.userProperty['appEnv'].exactlyMatches(['dev'])",
                "tagColor": "GREEN"
            },
            {
                "name": "beta",
                "expression": "percent <= 10"
            }
        ],
        "parameters": {
            "remoteConfigInfo": {
                "defaultValue": {"value": "{\"versionNumber\":3}"},
                "valueType": "JSON"
            },
            "greeting": {
                "defaultValue": {"value": "hello"},
                "conditionalValues": {"development": {"value": "hi"}},
                "valueType": "STRING"
            },
            "maxItems": {
                "defaultValue": {"value": "10"},
                "conditionalValues": {"beta": {"value": "25"}},
                "valueType": "NUMBER"
            },
            "newCheckout": {
                "defaultValue": {"value": "false"},
                "conditionalValues": {"beta": {"value": "true"}},
                "valueType": "BOOLEAN",
                "description": "Roll out the new checkout flow"
            }
        },
        "parameterGroups": {
            "checkout": {
                "description": "Checkout tuning",
                "parameters": {
                    "retryLimit": {
                        "defaultValue": {"value": "3"},
                        "valueType": "NUMBER"
                    }
                }
            }
        },
        "etag": "etag-7",
        "version": {
            "versionNumber": "7",
            "updateTime": "2024-05-01T10:00:00Z",
            "updateUser": {"email": "release@example.com"}
        }
    })
}

struct Fixture {
    _temp: TempDir,
    store_path: PathBuf,
    configs: PathBuf,
    store: FileTemplateStore,
}

impl Fixture {
    fn new(template: Value) -> Self {
        let temp = TempDir::new().unwrap();
        let store_path = temp.path().join("remote-template.json");
        fs::write(&store_path, serde_json::to_string_pretty(&template).unwrap()).unwrap();
        let configs = temp.path().join("configs");
        let store = FileTemplateStore::new(&store_path);
        Self {
            _temp: temp,
            store_path,
            configs,
            store,
        }
    }

    fn assembler(&self) -> Assembler<'_> {
        Assembler::new(&self.store, ConfigLayout::new(&self.configs))
    }

    fn layout(&self) -> ConfigLayout {
        ConfigLayout::new(&self.configs)
    }

    fn stored(&self) -> Template {
        serde_json::from_str(&fs::read_to_string(&self.store_path).unwrap()).unwrap()
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.configs.join(rel)).unwrap()
    }
}

fn original() -> Template {
    serde_json::from_value(sample_template()).unwrap()
}

#[tokio::test]
async fn test_pull_writes_tree() {
    let fixture = Fixture::new(sample_template());
    let summary = fixture.assembler().pull().await.unwrap();

    assert_eq!(summary.etag, "etag-7");
    assert_eq!(summary.version_number, Some(7));
    assert_eq!(summary.parameters, 4);
    assert_eq!(summary.groups, 1);

    assert_eq!(fixture.read("eTag.json"), "\"etag-7\"");
    assert_eq!(fixture.read("parameters/greeting/defaultValue.json"), "\"hello\"");
    assert_eq!(fixture.read("parameters/greeting/development.json"), "\"hi\"");
    assert_eq!(fixture.read("parameters/maxItems/beta.json"), "25");
    assert_eq!(fixture.read("parameters/newCheckout/beta.json"), "true");
    assert_eq!(
        fixture.read("parameters/newCheckout/description.txt"),
        "Roll out the new checkout flow"
    );
    assert_eq!(
        fixture.read("parameterGroups/checkout/description.txt"),
        "Checkout tuning"
    );
    assert_eq!(
        fixture.read("parameterGroups/checkout/retryLimit/valueType.txt"),
        "NUMBER"
    );

    let conditions: Value = serde_json::from_str(&fixture.read("conditions.json")).unwrap();
    assert_eq!(conditions[0]["name"], json!("development"));
    assert_eq!(conditions[1]["name"], json!("beta"));
}

#[tokio::test]
async fn test_pull_expands_stringified_json() {
    let fixture = Fixture::new(sample_template());
    fixture.assembler().pull().await.unwrap();

    assert_eq!(
        fixture.read("parameters/remoteConfigInfo/defaultValue.json"),
        "{\n    \"versionNumber\": 3\n}"
    );
    assert_eq!(fixture.read("parameters/remoteConfigInfo/valueType.txt"), "JSON");
}

#[tokio::test]
async fn test_pull_then_assemble_round_trips() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    let assembled = assembler.assemble().unwrap();
    let template = assembled.template;
    let original = original();

    assert_eq!(assembled.remote_config_version, Some(4));
    assert_eq!(template.conditions, original.conditions);
    assert_eq!(template.parameter_groups, original.parameter_groups);
    assert_eq!(template.etag, original.etag);
    assert_eq!(template.version, original.version);

    for (name, parameter) in &original.parameters {
        if name == REMOTE_CONFIG_INFO {
            continue;
        }
        assert_eq!(&template.parameters[name], parameter, "parameter {}", name);
    }

    let info = Parameter::from_remote(&template.parameters[REMOTE_CONFIG_INFO]);
    assert_eq!(info.default_value, json!({"versionNumber": 4}));
}

#[tokio::test]
async fn test_assemble_without_remote_config_info_skips_bump() {
    let mut template = sample_template();
    template["parameters"]
        .as_object_mut()
        .unwrap()
        .remove(REMOTE_CONFIG_INFO);
    let fixture = Fixture::new(template);
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    let assembled = assembler.assemble().unwrap();
    assert_eq!(assembled.remote_config_version, None);
    assert_eq!(assembled.template.parameters.len(), 3);
}

#[tokio::test]
async fn test_assemble_starts_counter_at_zero() {
    let mut template = sample_template();
    template["parameters"][REMOTE_CONFIG_INFO]["defaultValue"]["value"] =
        json!("{\"versionCheckHttpMethod\":\"GET\"}");
    let fixture = Fixture::new(template);
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    let assembled = assembler.assemble().unwrap();
    assert_eq!(assembled.remote_config_version, Some(0));
}

#[tokio::test]
async fn test_publish_updates_store_and_tree() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    let summary = assembler.publish().await.unwrap();
    assert_eq!(summary.etag, "etag-8");
    assert_eq!(summary.template_version, Some(8));
    assert_eq!(summary.remote_config_version, Some(4));

    let stored = fixture.stored();
    assert_eq!(stored.etag, "etag-8");
    let info = Parameter::from_remote(&stored.parameters[REMOTE_CONFIG_INFO]);
    assert_eq!(info.default_value, json!({"versionNumber": 4}));

    // the tree was refreshed from the published template
    assert_eq!(fixture.read("eTag.json"), "\"etag-8\"");
    assert_eq!(local_version_number(&fixture.layout()).unwrap(), Some(4));
}

#[tokio::test]
async fn test_push_twice_bumps_twice() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    assembler.publish().await.unwrap();
    let second = assembler.publish().await.unwrap();
    assert_eq!(second.etag, "etag-9");
    assert_eq!(second.remote_config_version, Some(5));
}

#[tokio::test]
async fn test_unknown_condition_fails_validation() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();
    fs::write(
        fixture.configs.join("parameters/greeting/staging.json"),
        "\"yo\"",
    )
    .unwrap();

    let err = assembler.assemble_and_validate().await.unwrap_err();
    assert_eq!(err.phase(), Some(SyncPhase::Validate));
    assert_eq!(err.code(), ErrorCode::StoreError);
    assert!(err.to_string().contains("staging"));

    // nothing was published
    assert_eq!(fixture.stored().etag, "etag-7");
}

#[tokio::test]
async fn test_stale_etag_is_rejected() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();

    let mut moved = sample_template();
    moved["etag"] = json!("etag-99");
    fs::write(&fixture.store_path, moved.to_string()).unwrap();

    let err = assembler.publish().await.unwrap_err();
    match err {
        SyncError::Store { phase, code, .. } => {
            assert_eq!(phase, SyncPhase::Validate);
            assert_eq!(code.as_deref(), Some("FAILED_PRECONDITION"));
        }
        other => panic!("expected a store error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_etag_file_is_a_read_error() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();
    fs::remove_file(fixture.configs.join("eTag.json")).unwrap();

    let err = assembler.assemble().unwrap_err();
    assert!(matches!(err, SyncError::Read { .. }));
}

#[tokio::test]
async fn test_pull_removes_stale_groups() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();
    assert!(fixture.configs.join("parameterGroups/checkout").exists());

    let mut template = sample_template();
    template["parameterGroups"] = json!({});
    fs::write(&fixture.store_path, template.to_string()).unwrap();
    assembler.pull().await.unwrap();

    assert!(!fixture.configs.join("parameterGroups/checkout").exists());
}

#[tokio::test]
async fn test_pull_rejects_condition_names_with_separators() {
    let mut template = sample_template();
    template["conditions"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "iOS/Android", "expression": "device.os in ['ios', 'android']"}));
    template["parameters"]["greeting"]["conditionalValues"]["iOS/Android"] =
        json!({"value": "hey"});
    let fixture = Fixture::new(template);

    let err = fixture.assembler().pull().await.unwrap_err();
    assert!(matches!(err, SyncError::Write { .. }));
    assert!(!fixture.configs.join("parameters/greeting/iOS").exists());
}

#[tokio::test]
async fn test_pull_rejects_group_names_outside_groups_dir() {
    let mut template = sample_template();
    template["parameterGroups"]["../escaped"] = json!({"parameters": {}});
    let fixture = Fixture::new(template);

    let err = fixture.assembler().pull().await.unwrap_err();
    assert!(matches!(err, SyncError::Write { .. }));
    assert!(!fixture.configs.join("escaped").exists());
}

#[tokio::test]
async fn test_pull_meta_expands_embedded_json() {
    let fixture = Fixture::new(sample_template());
    let output = fixture.configs.join("meta.json");
    let etag = fixture.assembler().pull_meta(&output).await.unwrap();
    assert_eq!(etag, "etag-7");

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("\n    \"conditions\""));
    let document: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        document["parameters"][REMOTE_CONFIG_INFO]["defaultValue"]["value"],
        json!({"versionNumber": 3})
    );
    assert_eq!(
        document["parameters"]["greeting"]["defaultValue"]["value"],
        json!("hello")
    );
    assert_eq!(
        document["parameters"]["maxItems"]["defaultValue"]["value"],
        json!(10)
    );
}

#[tokio::test]
async fn test_increase_local_version() {
    let fixture = Fixture::new(sample_template());
    fixture.assembler().pull().await.unwrap();

    assert_eq!(increase_local_version(&fixture.layout()).unwrap(), 4);
    assert_eq!(increase_local_version(&fixture.layout()).unwrap(), 5);
    assert_eq!(
        fixture.read("parameters/remoteConfigInfo/defaultValue.json"),
        "{\n    \"versionNumber\": 5\n}"
    );
}

#[tokio::test]
async fn test_version_info_and_check() {
    let fixture = Fixture::new(sample_template());
    let assembler = fixture.assembler();
    assembler.pull().await.unwrap();
    increase_local_version(&fixture.layout()).unwrap();

    let info = assembler.version_info().await.unwrap();
    assert_eq!(info.local, Some(4));
    assert_eq!(info.remote, Some(3));
    assert_eq!(info.template_version, Some(7));
    assert_eq!(info.etag, "etag-7");

    let latest = assembler.check().await.unwrap();
    assert_eq!(latest.and_then(|v| v.number()), Some(7));
}

#[tokio::test]
async fn test_fetch_from_missing_store_names_fetch_phase() {
    let temp = TempDir::new().unwrap();
    let store = FileTemplateStore::new(temp.path().join("absent.json"));
    let err = store.fetch_template().await.unwrap_err();
    assert_eq!(err.phase(), Some(SyncPhase::Fetch));
}

#[test]
fn test_open_store_requires_credentials_for_firebase() {
    let temp = TempDir::new().unwrap();
    let backend = BackendConfig {
        access_token: Some("token".to_string()),
        ..Default::default()
    };
    let err = open_store(&backend, temp.path(), Path::new("serviceAccountKey.json"))
        .err()
        .unwrap();
    assert_eq!(err.code(), ErrorCode::CredentialsError);

    let file_backend = BackendConfig {
        kind: BackendKind::File,
        ..Default::default()
    };
    assert!(open_store(&file_backend, temp.path(), Path::new("serviceAccountKey.json")).is_ok());
}
