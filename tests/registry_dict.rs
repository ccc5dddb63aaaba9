use anyhow::Result;
use regdict::prelude::*;

const ROOT: RootKey = RootKey::CurrentUser;

fn dict(store: &MemoryStore, branch: &str) -> RegistryDict<MemoryStore> {
    RegistryDict::with_store(store.clone(), ROOT, branch)
}

fn branches(
    walk: impl Iterator<Item = regdict::Result<RegistryDict<MemoryStore>>>,
) -> Vec<String> {
    walk.map(|d| d.map(|d| d.branch().to_string()))
        .collect::<regdict::Result<_>>()
        .unwrap()
}

/// a
/// ├── b
/// │   ├── d
/// │   └── e
/// └── c
///     └── f
fn build_tree(store: &MemoryStore) -> Result<()> {
    for path in [r"a\b\d", r"a\b\e", r"a\c\f"] {
        assert!(dict(store, path).create()?);
    }
    dict(store, r"a\b").set("depth", 2u32)?;
    Ok(())
}

#[test]
fn screen_saver_settings_round_trip() -> Result<()> {
    let store = MemoryStore::new();
    let desktop = dict(&store, r"Control Panel\Desktop");

    assert!(!desktop.exists()?);
    assert!(desktop.create()?);
    assert!(desktop.exists()?);

    desktop.set("ScreenSaveActive", "1")?;
    assert_eq!(desktop.get_or("ScreenSaveActive", "")?, Variant::from("1"));

    desktop.set("ScreenSaveActive", "")?;
    assert_eq!(desktop.get_or("ScreenSaveActive", "")?, Variant::from(""));
    assert!(desktop.contains("ScreenSaveActive")?);

    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn create_reports_false_when_branch_cannot_be_created() -> Result<()> {
    let store = MemoryStore::new();
    store.forbid_create(ROOT, r"Software\Policies\Blocked");
    let blocked = dict(&store, r"Software\Policies\Blocked");

    assert!(!blocked.create()?);
    assert!(!blocked.exists()?);
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn hive_root_exists_on_a_fresh_store() -> Result<()> {
    let store = MemoryStore::new();
    let hive = dict(&store, "");

    assert!(hive.exists()?);
    assert!(hive.subkeys()?.is_empty());
    assert!(hive.items()?.is_empty());
    Ok(())
}

#[test]
fn absent_branch_reads_as_default() -> Result<()> {
    let store = MemoryStore::new();
    let missing = dict(&store, r"Software\Nobody\Home");

    assert!(!missing.exists()?);
    assert_eq!(missing.get("anything")?, None);
    assert_eq!(missing.get_or("anything", 7u32)?, Variant::Integer(7));
    assert!(!missing.contains("anything")?);
    // Reading never creates the branch.
    assert!(!missing.exists()?);
    Ok(())
}

#[test]
fn set_infers_kind_and_round_trips() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, r"Software\Vendor\App");

    app.set("Count", 5u32)?;
    app.set("Paths", ["a", "b"])?;
    app.set("Title", "x")?;
    app.set("Blob", Variant::Binary(vec![0xde, 0xad]))?;

    assert_eq!(app.get("Count")?, Some(Variant::Integer(5)));
    assert_eq!(app.get("Paths")?, Some(Variant::from(["a", "b"])));
    assert_eq!(app.get("Title")?, Some(Variant::String("x".into())));
    assert_eq!(app.get("Blob")?.map(|v| v.kind()), Some(ValueKind::Binary));
    Ok(())
}

#[test]
fn explicit_kind_overrides_inference() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, "App");

    app.set_typed("Port", "8080", ValueKind::Integer)?;
    app.set_typed("Version", 3u32, ValueKind::String)?;
    app.set_typed("Single", "only", ValueKind::StringList)?;

    assert_eq!(app.get("Port")?, Some(Variant::Integer(8080)));
    assert_eq!(app.get("Version")?, Some(Variant::from("3")));
    assert_eq!(app.get("Single")?, Some(Variant::from(["only"])));
    Ok(())
}

#[test]
fn repeated_set_is_idempotent() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, "App");

    app.set("Mode", "fast")?;
    let before = app.items()?;
    app.set("Mode", "fast")?;
    assert_eq!(app.items()?, before);
    assert_eq!(app.info()?.values, 1);
    Ok(())
}

#[test]
fn items_lists_each_name_once_with_latest_value() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, "App");

    app.set("b", "first")?;
    app.set("a", 1u32)?;
    app.set("b", "second")?;

    let items = app.items()?;
    assert_eq!(items.len(), 2);
    assert!(items.contains(&("a".to_string(), Variant::Integer(1))));
    assert!(items.contains(&("b".to_string(), Variant::from("second"))));
    assert_eq!(app.items()?, items);
    Ok(())
}

#[test]
fn items_of_missing_branch_is_not_found() {
    let store = MemoryStore::new();
    let err = dict(&store, "Missing").items().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn subkeys_are_direct_children_only() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;

    let children = dict(&store, "a").subkeys()?;
    let names: Vec<_> = children.iter().map(|d| d.branch().to_string()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&r"a\b".to_string()));
    assert!(names.contains(&r"a\c".to_string()));
    assert!(children.iter().all(|d| d.root() == ROOT));

    assert!(dict(&store, r"a\b\d").subkeys()?.is_empty());
    Ok(())
}

#[test]
fn all_subkeys_is_depth_first_pre_order() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;

    let walk = branches(dict(&store, "a").all_subkeys());
    assert_eq!(walk, [r"a\b", r"a\b\d", r"a\b\e", r"a\c", r"a\c\f"]);
    Ok(())
}

#[test]
fn all_subkeys_rescans_on_each_call() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;
    let a = dict(&store, "a");

    assert_eq!(a.all_subkeys().count(), 5);
    dict(&store, r"a\c\f\g").create()?;
    assert_eq!(a.all_subkeys().count(), 6);
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn wipe_removes_subtree_and_spares_siblings() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;
    dict(&store, "z").set("keep", 1u32)?;

    let b = dict(&store, r"a\b");
    b.wipe()?;

    for gone in [r"a\b", r"a\b\d", r"a\b\e"] {
        assert!(!dict(&store, gone).exists()?, "{gone} survived");
    }
    for kept in ["a", r"a\c", r"a\c\f", "z"] {
        assert!(dict(&store, kept).exists()?, "{kept} was removed");
    }
    assert_eq!(dict(&store, "z").get("keep")?, Some(Variant::Integer(1)));
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn wipe_of_leaf_deletes_directly() -> Result<()> {
    let store = MemoryStore::new();
    let leaf = dict(&store, r"Software\Leaf");
    leaf.set("v", "x")?;
    leaf.wipe()?;
    assert!(!leaf.exists()?);
    assert!(dict(&store, "Software").exists()?);
    Ok(())
}

#[test]
fn wipe_is_not_atomic() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;
    store.deny(ROOT, r"a\c\f");

    assert!(dict(&store, "a").wipe().is_err());
    // Whatever was reached before the failure stays deleted.
    assert!(!dict(&store, r"a\b").exists()?);
    assert!(dict(&store, "a").exists()?);
    assert!(dict(&store, r"a\c").exists()?);
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn enumeration_failures_are_not_mistaken_for_end_of_range() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, "App");
    app.set("one", 1u32)?;
    app.set("two", 2u32)?;
    app.child("c1").create()?;
    app.child("c2").create()?;
    store.break_scan_at(ROOT, "App", 1);

    assert!(matches!(app.items(), Err(RegistryError::OsFailure(_))));
    assert!(app.subkeys().is_err());
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn scans_query_each_index_once() -> Result<()> {
    let store = MemoryStore::new();
    let app = dict(&store, "App");
    for i in 0..20u32 {
        app.set(&format!("v{i}"), i)?;
        app.child(&format!("k{i}")).create()?;
    }

    let before = store.enum_calls();
    assert_eq!(app.items()?.len(), 20);
    assert_eq!(store.enum_calls() - before, 21);

    let before = store.enum_calls();
    assert_eq!(app.subkeys()?.len(), 20);
    assert_eq!(store.enum_calls() - before, 21);
    Ok(())
}

#[test]
fn every_operation_releases_its_handle() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;
    let a = dict(&store, "a");

    a.exists()?;
    a.create()?;
    a.set("x", "y")?;
    a.get("x")?;
    a.items()?;
    a.subkeys()?;
    a.all_subkeys().for_each(drop);
    a.info()?;
    dict(&store, r"a\c").wipe()?;

    assert!(store.total_opens() > 0);
    assert_eq!(store.open_handles(), 0);
    Ok(())
}

#[test]
fn info_counts_children_and_values() -> Result<()> {
    let store = MemoryStore::new();
    build_tree(&store)?;
    let info = dict(&store, r"a\b").info()?;
    assert_eq!(info.subkeys, 2);
    assert_eq!(info.values, 1);
    assert!(info.last_write.is_some());
    Ok(())
}
