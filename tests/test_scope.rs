use sqlscript::name::Name;
use sqlscript::scope::{Component, Direction, Filter, Pattern, Scope, ScopeArgs, ScopeKey};
use sqlscript::{Config, ScriptError};

fn args(filter: Filter) -> ScopeArgs {
    filter.compile().unwrap()
}

#[test]
fn test_scope_defaults() {
    let mut scope = Scope::new(Component::Keyword, "SELECT");
    assert_eq!(scope.base, "select");
    assert!(scope.is_included());
    assert!(scope.evaluate(&ScopeArgs::new()));
}

#[test]
fn test_scope_key_names() {
    assert_eq!(
        ScopeKey::new(Direction::Include, Component::Keyword).to_string(),
        "incl_kw"
    );
    assert_eq!(
        ScopeKey::new(Direction::Exclude, Component::Full).to_string(),
        "excl_nm"
    );
    assert_eq!(
        ScopeKey::new(Direction::Include, Component::Description).to_string(),
        "incl_desc"
    );
}

#[test]
fn test_scope_include_and_exclude() {
    let mut scope = Scope::new(Component::Keyword, "select");

    assert!(scope.evaluate(&args(Filter::new().include(Component::Keyword, ["select"]))));
    assert!(!scope.evaluate(&args(Filter::new().include(Component::Keyword, ["create"]))));
    assert!(!scope.evaluate(&args(Filter::new().exclude(Component::Keyword, ["select"]))));
    assert!(scope.evaluate(&args(Filter::new().exclude(Component::Keyword, ["drop"]))));
    assert!(!scope.evaluate(&args(
        Filter::new()
            .include(Component::Keyword, ["select"])
            .exclude(Component::Keyword, ["sel.*"])
    )));

    // Patterns for other components leave this one untouched
    assert!(scope.evaluate(&args(Filter::new().exclude(Component::Object, ["select"]))));
}

#[test]
fn test_scope_pattern_matching() {
    let mut scope = Scope::new(Component::Anchor, "create transient table");
    assert!(scope.evaluate(&args(Filter::new().include(Component::Anchor, ["^create"]))));
    assert!(scope.evaluate(&args(Filter::new().include(Component::Anchor, ["transient"]))));
    assert!(!scope.evaluate(&args(Filter::new().include(Component::Anchor, ["^drop"]))));

    // The base is also looked up literally within the pattern
    let mut scope = Scope::new(Component::Keyword, "drop");
    assert!(!scope.evaluate(&args(
        Filter::new().exclude(Component::Keyword, ["select|drop"])
    )));
    let pattern = Pattern::new("drop table(s)?").unwrap();
    assert!(pattern.matches("drop"));
    assert!(!pattern.matches("select"));
}

#[test]
fn test_scope_empty_base() {
    let mut scope = Scope::new(Component::Object, "");
    assert!(scope.evaluate(&ScopeArgs::new()));
    assert!(Pattern::new("table").unwrap().matches(""));
    assert!(scope.evaluate(&args(Filter::new().include(Component::Object, ["table"]))));
    assert!(!scope.evaluate(&args(Filter::new().exclude(Component::Object, ["table"]))));
}

#[test]
fn test_scope_reset() {
    let mut scope = Scope::new(Component::Keyword, "select");
    assert!(!scope.evaluate(&args(Filter::new().exclude(Component::Keyword, ["select"]))));
    assert!(!scope.is_included());
    scope.reset();
    assert!(scope.is_included());
}

#[test]
fn test_invalid_pattern() {
    let err = Filter::new()
        .include(Component::Keyword, ["(unclosed"])
        .compile()
        .unwrap_err();
    assert!(matches!(err, ScriptError::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
}

#[test]
fn test_scope_args_union() {
    let mut stored = args(Filter::new().exclude(Component::Keyword, ["select"]));
    let added = args(
        Filter::new()
            .exclude(Component::Keyword, ["select", "drop"])
            .include(Component::Object, ["table"]),
    );
    stored.union(&added);

    let excl_kw: Vec<&str> = stored
        .get(&ScopeKey::new(Direction::Exclude, Component::Keyword))
        .unwrap()
        .iter()
        .map(Pattern::source)
        .collect();
    assert_eq!(excl_kw, vec!["select", "drop"]);
    assert_eq!(
        stored
            .get(&ScopeKey::new(Direction::Include, Component::Object))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        serde_json::to_string(&stored).unwrap(),
        r#"{"excl_kw":["select","drop"],"incl_obj":["table"]}"#
    );
}

#[test]
fn test_name_scope_is_conjunction() {
    let mut name = Name::new("select * from sample_table", "", 1, &Config::default());
    assert!(name.scope(&ScopeArgs::new()));
    assert!(name.scopes().iter().all(|scope| scope.is_included()));

    // Every other component includes the statement; excluding the keyword still wins
    let filter = Filter::new()
        .include(Component::Object, ["data"])
        .include(Component::Anchor, ["select"])
        .include(Component::Description, ["s1"])
        .include(Component::Full, ["select data"])
        .exclude(Component::Keyword, ["select"]);
    assert!(!name.scope(&args(filter)));
    assert!(!name.is_included());
    let excluded: Vec<Component> = name
        .scopes()
        .iter()
        .filter(|scope| !scope.is_included())
        .map(|scope| scope.component)
        .collect();
    assert_eq!(excluded, vec![Component::Keyword]);
}

#[test]
fn test_name_scope_uses_resolved_components() {
    let mut name = Name::new("select * from sample_table", "select all~sample_table", 2, &Config::default());
    assert!(!name.scope(&args(Filter::new().include(Component::Anchor, ["select data"]))));
    assert!(name.scope(&args(Filter::new().include(Component::Anchor, ["select all"]))));
    assert!(name.scope(&args(Filter::new().include(Component::Description, ["^sample"]))));
}
