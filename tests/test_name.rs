use std::collections::HashSet;

use sqlscript::Config;
use sqlscript::name::{Name, Resolution};
use sqlscript::scope::Component;
use sqlscript::test_utils::{NAMING_TESTS_FILE, TestNamingData};

fn config(desc_is_simple: bool) -> Config {
    let mut config = Config::default();
    config.sql.desc_is_simple = desc_is_simple;
    config
}

#[test]
fn test_naming() {
    let file_content = std::fs::read_to_string(NAMING_TESTS_FILE).unwrap();
    let test_data: TestNamingData = toml::from_str(&file_content).unwrap();

    for test in test_data.tests {
        let config = config(test.desc_is_simple.unwrap_or(true));
        let name = Name::new(&test.sql, &test.tag, test.index, &config);
        assert_eq!(test.generated, name.generated(), "generated name of: {}", test.sql);
        if let Some(provided) = &test.provided {
            assert_eq!(*provided, *name.provided(), "provided name of: {}", test.tag);
        }
    }
}

#[test]
fn test_provided_takes_precedence() {
    let sql = "select * from sample_table";
    let tag = "select all~sample_table";

    let name = Name::new(sql, tag, 2, &Config::default());
    assert_eq!(name.anchor(), "select all");
    assert_eq!(name.desc(), "sample_table");
    assert_eq!(name.nm(), "select all~sample_table");
    assert_eq!(name.resolved().full, name.provided().full);

    let mut config = Config::default();
    config.sql.provided_over_generated = false;
    let name = Name::new(sql, tag, 2, &config);
    assert_eq!(name.nm(), "select data~s2");
    assert_eq!(name.resolved().full, name.generated().full);
}

#[test]
fn test_resolve_with_overrides() {
    let name = Name::new("select * from sample_table", "select all~sample_table", 2, &Config::default());
    assert_eq!(
        name.resolve_with(Component::Anchor, Resolution::Generated),
        "select data"
    );
    assert_eq!(
        name.resolve_with(Component::Description, Resolution::Generated),
        "s2"
    );
    assert_eq!(
        name.resolve_with(Component::Anchor, Resolution::Provided),
        "select all"
    );
    assert_eq!(
        name.resolve_with(Component::Anchor, Resolution::Default),
        "select all"
    );

    let untagged = Name::new("select 1", "", 1, &Config::default());
    assert_eq!(untagged.resolve_with(Component::Full, Resolution::Provided), "");
    assert_eq!(untagged.nm(), "select data~s1");
}

#[test]
fn test_partially_provided_name_falls_back() {
    // Nothing after the delimiter: only the full name is provided
    let name = Name::new("create table t1 (col1 int)", "create table~", 1, &Config::default());
    assert_eq!(name.provided().anchor, "");
    assert_eq!(name.provided().description, "");
    assert_eq!(name.anchor(), "create table");
    assert_eq!(name.desc(), "s1");
    assert_eq!(name.nm(), "create table~");
}

#[test]
fn test_description_without_index() {
    let mut simple = Name::new("create table sample_table as select 1", "", 3, &config(true));
    simple.include_index_in_description(false);
    assert_eq!(simple.generated().description, "statement");
    assert_eq!(simple.nm(), "create table~statement");

    // Non-simple descriptions without an index are the bare identifier string
    let mut detailed = Name::new("create table sample_table as select 1", "", 3, &config(false));
    detailed.include_index_in_description(false);
    assert_eq!(detailed.generated().description, "sample_table");
    assert_eq!(detailed.nm(), "create table~sample_table");

    let mut clone = Name::new("create table t2 clone t1", "", 3, &config(false));
    clone.include_index_in_description(false);
    assert_eq!(clone.generated().description, "t2 clone t1");
}

#[test]
fn test_description_identifier_gaps() {
    // Unterminated string on the first line: no identifier, not an error
    let name = Name::new("select 'multi\nline' as col1 from t1", "", 4, &config(false));
    assert_eq!(name.generated().description, "s4");

    let short_clone = Name::new("create table clone", "", 2, &config(false));
    assert_eq!(short_clone.generated().description, "s2");
}

#[test]
fn test_named_object_priority_follows_config() {
    let mut config = Config::default();
    config.sql.named_objects = vec!["view".to_owned(), "table".to_owned()];
    let name = Name::new("create view v1 as select * from table t1", "", 1, &config);
    assert_eq!(name.generated().object, "view");

    config.sql.named_objects = vec!["table".to_owned(), "view".to_owned()];
    let name = Name::new("create view v1 as select * from table t1", "", 1, &config);
    assert_eq!(name.generated().object, "table");
}

#[test]
fn test_custom_delimiter_and_prefix() {
    let config = Config::from_toml_str(
        r#"
        [script.patterns.core]
        description-delimiter = "|"
        description-index-prefix = "stmt-"
        "#,
    )
    .unwrap();
    let name = Name::new("create table t1 (col1 int)", "", 4, &config);
    assert_eq!(name.nm(), "create table|stmt-4");

    let tagged = Name::new("select 1", "select one|check", 1, &config);
    assert_eq!(tagged.anchor(), "select one");
    assert_eq!(tagged.desc(), "check");
}

#[test]
fn test_generated_names_are_distinct() {
    let sqls = [
        "create table t1 (col1 int)",
        "insert into t1 values (1)",
        "insert into t1 values (2)",
        "select * from t1",
        "select count(*) from t1",
        "drop table t1",
    ];
    let names: HashSet<String> = sqls
        .iter()
        .enumerate()
        .map(|(i, sql)| Name::new(sql, "", i + 1, &Config::default()).nm())
        .collect();
    assert_eq!(names.len(), sqls.len());
}

#[test]
fn test_full_name_never_empty() {
    let name = Name::new("", "", 1, &Config::default());
    assert_eq!(name.nm(), "~s1");
}
