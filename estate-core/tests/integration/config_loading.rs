use estate_core::domain::SignerPolicy;
use estate_core::foundation::EstateError;
use estate_core::infrastructure::config::{load_app_config_from_path, CONFIG_FILE_NAME};
use tempfile::tempdir;

const CONFIG: &str = r#"
[node]
party = "O=PartyA,L=London,C=GB"
notary = "O=Notary,L=Zurich,C=CH"

[coordination]
signature_timeout_ms = 2000

[devnet]
parties = ["O=PartyA,L=London,C=GB", "O=PartyB,L=New York,C=US", "O=PartyC,L=Paris,C=FR"]

[profiles.strict.coordination]
signer_policy = "owners_only"
finality_timeout_ms = 500

[profiles.broken.coordination]
signature_timeout_ms = 0
"#;

#[test]
fn profile_overrides_apply_on_top_of_the_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, CONFIG).expect("write config");

    let base = load_app_config_from_path(&path, None).expect("base");
    assert_eq!(base.coordination.signer_policy, SignerPolicy::OwnersAndTenants);
    assert_eq!(base.coordination.signature_timeout_ms, 2000);
    assert_eq!(base.node.notary_id().as_str(), "O=Notary,L=Zurich,C=CH");

    let strict = load_app_config_from_path(&path, Some("strict")).expect("strict");
    assert_eq!(strict.coordination.signer_policy, SignerPolicy::OwnersOnly);
    assert_eq!(strict.coordination.finality_timeout_ms, 500);
    assert_eq!(strict.coordination.signature_timeout_ms, 2000);
}

#[test]
fn invalid_profile_fails_validation() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, CONFIG).expect("write config");

    let err = load_app_config_from_path(&path, Some("broken")).expect_err("zero timeout");
    match err {
        EstateError::ConfigError(message) => assert!(message.contains("signature_timeout_ms")),
        other => panic!("expected config error, got {other:?}"),
    }
}
