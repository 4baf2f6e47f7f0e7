use modfile_common::DiagnosticList;
use modfile_editor::{MetadataModel, SourceSyntax};

const SAMPLE: &str = r#"{
  "name": "alice/demo",
  "version": "1.0.0",
  "dependencies": [
    {
      "name": "puppetlabs/stdlib",
      "version_requirement": ">= 4.0.0"
    }
  ]
}"#;

fn load(text: &str) -> MetadataModel {
    let mut model = MetadataModel::new(SourceSyntax::MetadataJson);
    let mut diags = DiagnosticList::new();
    model.set_document(text, &mut diags);
    model
}

fn assert_well_formed(model: &MetadataModel) {
    serde_json::from_str::<serde_json::Value>(model.text()).expect("text must stay valid JSON");
}

#[test]
fn test_load_exposes_values() {
    let model = load(SAMPLE);
    assert_eq!(model.module_name(), "alice/demo");
    assert_eq!(model.version(), "1.0.0");
    let deps = model.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name, "puppetlabs/stdlib");
    assert_eq!(deps[0].version_requirement, ">= 4.0.0");
    assert_eq!(deps[0].line, 5);
}

#[test]
fn test_first_dependency_builds_the_whole_structure() {
    let mut model = load("{}");
    model.add_dependency("puppetlabs/stdlib", ">= 4.0.0").unwrap();
    assert_eq!(
        model.text(),
        r#"{
  "dependencies": [
    {
      "name": "puppetlabs/stdlib",
      "version_requirement": ">= 4.0.0"
    }
  ]
}"#
    );
    assert_well_formed(&model);
}

#[test]
fn test_second_dependency_gets_a_separating_comma() {
    let mut model = load("{}");
    model.add_dependency("puppetlabs/stdlib", ">= 4.0.0").unwrap();
    model.add_dependency("bob/concat", ">= 1.0.0").unwrap();
    assert_eq!(
        model.text(),
        r#"{
  "dependencies": [
    {
      "name": "puppetlabs/stdlib",
      "version_requirement": ">= 4.0.0"
    },
    {
      "name": "bob/concat",
      "version_requirement": ">= 1.0.0"
    }
  ]
}"#
    );
    assert_well_formed(&model);
    assert_eq!(model.dependencies().len(), 2);
}

#[test]
fn test_removing_last_dependency_takes_its_comma() {
    let mut model = load("{}");
    model.add_dependency("puppetlabs/stdlib", ">= 4.0.0").unwrap();
    let after_first = model.text().to_string();
    model.add_dependency("bob/concat", ">= 1.0.0").unwrap();
    assert!(model.remove_dependency("bob/concat").unwrap());
    assert_eq!(model.text(), after_first);
}

#[test]
fn test_removing_first_dependency_keeps_valid_json() {
    let mut model = load(SAMPLE);
    model.add_dependency("bob/concat", ">= 1.0.0").unwrap();
    assert!(model.remove_dependency("puppetlabs/stdlib").unwrap());
    assert_well_formed(&model);
    let deps = model.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name, "bob/concat");
}

#[test]
fn test_upsert_rewrites_the_dependency_object_in_place() {
    let mut model = load(SAMPLE);
    model.add_dependency("puppetlabs/stdlib", ">= 5.0.0").unwrap();
    assert_eq!(
        model.text(),
        r#"{
  "name": "alice/demo",
  "version": "1.0.0",
  "dependencies": [
    {
      "name": "puppetlabs/stdlib",
      "version_requirement": ">= 5.0.0"
    }
  ]
}"#
    );
    assert_eq!(model.dependencies().len(), 1);
}

#[test]
fn test_upsert_can_drop_the_version_requirement() {
    let mut model = load(SAMPLE);
    model.add_dependency("puppetlabs/stdlib", "").unwrap();
    assert_well_formed(&model);
    let deps = model.dependencies();
    assert_eq!(deps[0].version_requirement, "");
    assert!(!model.text().contains("version_requirement"));
}

#[test]
fn test_set_missing_scalar_appends_a_member() {
    let mut model = load("{\n  \"name\": \"alice/demo\"\n}");
    model.set_version("1.0.0").unwrap();
    assert_eq!(
        model.text(),
        "{\n  \"name\": \"alice/demo\",\n  \"version\": \"1.0.0\"\n}"
    );
}

#[test]
fn test_empty_value_removes_the_member_and_its_comma() {
    let original = "{\n  \"name\": \"alice/demo\"\n}";
    let mut model = load(original);
    model.set_version("1.0.0").unwrap();
    model.set_version("").unwrap();
    assert_eq!(model.text(), original);
}

#[test]
fn test_scalar_rewrite_is_minimal() {
    let mut model = load(SAMPLE);
    model.set_version("2.0.0").unwrap();
    assert!(model.text().contains("\"version\": \"2.0.0\""));
    assert_eq!(model.module_name(), "alice/demo");
    assert_well_formed(&model);

    let before = model.text().to_string();
    model.set_version("2.0.0").unwrap();
    assert_eq!(model.text(), before);
}

#[test]
fn test_tags_are_created_inline() {
    let mut model = load("{\n  \"name\": \"alice/demo\"\n}");
    model.set_tags(&["web".into(), "proxy".into()]).unwrap();
    assert_eq!(
        model.text(),
        "{\n  \"name\": \"alice/demo\",\n  \"tags\": [\"web\", \"proxy\"]\n}"
    );
    assert_eq!(model.tags(), vec!["web", "proxy"]);
}

#[test]
fn test_single_tag_still_gets_its_brackets() {
    let mut model = load("{\n  \"name\": \"alice/demo\"\n}");
    model.set_tags(&["solo".into()]).unwrap();
    assert_eq!(
        model.text(),
        "{\n  \"name\": \"alice/demo\",\n  \"tags\": [\"solo\"]\n}"
    );
    assert_eq!(model.tags(), vec!["solo"]);

    model.set_tags(&["solo".into(), "duo".into()]).unwrap();
    assert_eq!(
        model.text(),
        "{\n  \"name\": \"alice/demo\",\n  \"tags\": [\"solo\", \"duo\"]\n}"
    );
}

#[test]
fn test_tags_update_append_and_shrink() {
    let mut model = load("{\n  \"tags\": [\"web\", \"proxy\"]\n}");
    model.set_tags(&["web".into(), "db".into()]).unwrap();
    assert_eq!(model.text(), "{\n  \"tags\": [\"web\", \"db\"]\n}");

    model
        .set_tags(&["web".into(), "db".into(), "cache".into()])
        .unwrap();
    assert_eq!(model.text(), "{\n  \"tags\": [\"web\", \"db\", \"cache\"]\n}");

    model.set_tags(&["web".into()]).unwrap();
    assert_eq!(model.text(), "{\n  \"tags\": [\"web\"]\n}");

    model.set_tags(&[]).unwrap();
    assert_eq!(model.text(), "{\n  \"tags\": []\n}");
}

#[test]
fn test_removing_a_middle_tag_leaves_one_comma() {
    let mut model = load("{\n  \"tags\": [\"a\", \"b\", \"c\"]\n}");
    model.set_tags(&["a".into(), "c".into()]).unwrap();
    assert_eq!(model.text(), "{\n  \"tags\": [\"a\", \"c\"]\n}");
    assert_eq!(model.tags(), vec!["a", "c"]);
}

#[test]
fn test_os_support_round_trip() {
    let mut model = load("{}");
    model
        .add_os_support("RedHat", &["6".into(), "7".into()])
        .unwrap();
    assert_eq!(
        model.text(),
        r#"{
  "operatingsystem_support": [
    {
      "operatingsystem": "RedHat",
      "operatingsystemrelease": ["6", "7"]
    }
  ]
}"#
    );

    model.add_os_support("RedHat", &["8".into()]).unwrap();
    let os = model.os_supports();
    assert_eq!(os.len(), 1);
    assert_eq!(os[0].releases, vec!["8"]);
    assert_well_formed(&model);

    assert!(model.remove_os_support("RedHat").unwrap());
    assert!(model.os_supports().is_empty());
    assert_well_formed(&model);
}

#[test]
fn test_unknown_members_are_left_untouched() {
    let source = "{\n  \"name\": \"alice/demo\",\n  \"checksums\": {\"README.md\": \"abc123\"}\n}";
    let mut model = load(source);
    model.set_version("1.0.0").unwrap();
    assert!(model.text().contains("\"checksums\": {\"README.md\": \"abc123\"}"));
    assert_well_formed(&model);
}

#[test]
fn test_load_without_edits_preserves_text_exactly() {
    let model = load(SAMPLE);
    assert_eq!(model.text(), SAMPLE);
}

#[test]
fn test_bad_dependency_name_changes_nothing() {
    let mut model = load(SAMPLE);
    assert!(model.add_dependency("Totally Wrong", ">= 1.0.0").is_err());
    assert_eq!(model.text(), SAMPLE);
}
