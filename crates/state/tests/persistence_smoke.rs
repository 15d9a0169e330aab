use playbook_state::{InstallMode, Scope, Settings, StateEntry, StateStore, Target};
use tempfile::tempdir;

#[test]
fn state_survives_reload_at_default_location() {
    let tmp = tempdir().unwrap();
    let settings = Settings::for_home(tmp.path(), tmp.path(), None);

    let mut store = StateStore::load(&settings.state_path).unwrap();
    store.document_mut().upsert(StateEntry::new(
        "alpha",
        Scope::Global,
        Target::Claude,
        tmp.path().join("catalog/alpha"),
        InstallMode::Copy,
    ));
    store.save().unwrap();

    assert!(settings
        .state_path
        .ends_with(".claude/agent-playbook/state.json"));

    let reloaded = StateStore::load(&settings.state_path).unwrap();
    let entry = reloaded
        .document()
        .find("alpha", Scope::Global, Target::Claude)
        .expect("entry persisted");
    assert_eq!(entry.mode, InstallMode::Copy);
    assert!(!entry.disabled);
    assert!(!entry.installed_at.is_empty());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&settings.state_path).unwrap()).unwrap();
    assert_eq!(raw["skills"][0]["scope"], "global");
    assert_eq!(raw["skills"][0]["target"], "claude");
    assert_eq!(raw["skills"][0]["mode"], "copy");
}
