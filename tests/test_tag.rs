use sqlscript::config::CoreTags;
use sqlscript::tag::{self, AttrValue};
use sqlscript::{Config, ScriptError};

#[test]
fn test_split_args() {
    let raw = "my-name\n__description: first line\nsecond line\n__tags: a, b\n\n__";
    assert_eq!(
        tag::split_args(raw),
        vec!["my-name", "description: first line\nsecond line", "tags: a, b"]
    );
}

#[test]
fn test_single_line_tag_is_name() {
    let parsed = tag::parse_tag("create table~sample: with colon", &Config::default()).unwrap();
    assert!(!parsed.is_multiline);
    assert_eq!(parsed.name, "create table~sample: with colon");
    assert!(parsed.attrs.is_empty());
}

#[test]
fn test_multiline_tag_attributes() {
    let raw = r#"
__name: create table~sample
__description: builds the "sample" table
__tags: ['one', "two" , three]
__relative-tolerance: '0.05'
__include-sql: TRUE
__results*_h3: shown as a heading
__empty:
"#;
    let parsed = tag::parse_tag(raw, &Config::default()).unwrap();
    assert!(parsed.is_multiline);
    assert_eq!(parsed.name, "create table~sample");
    assert!(!parsed.attrs.contains("name"));
    assert!(!parsed.attrs.contains("empty"));
    assert_eq!(
        parsed.attrs.get("description"),
        Some(&AttrValue::String("builds the \"sample\" table".to_owned()))
    );
    assert_eq!(
        parsed.attrs.get("tags"),
        Some(&AttrValue::List(vec![
            "one".to_owned(),
            "two".to_owned(),
            "three".to_owned()
        ]))
    );
    assert_eq!(
        parsed.attrs.get("relative-tolerance"),
        Some(&AttrValue::Float(0.05))
    );
    assert_eq!(parsed.attrs.get("include-sql"), Some(&AttrValue::Bool(true)));
    assert_eq!(
        parsed.attrs.get("results*_h3"),
        Some(&AttrValue::String("shown as a heading".to_owned()))
    );
}

#[test]
fn test_multiline_tag_name_from_first_line() {
    let raw = "\ncreate table~sample\n__description: foo\n";
    let parsed = tag::parse_tag(raw, &Config::default()).unwrap();
    assert_eq!(parsed.name, "create table~sample");
    assert_eq!(
        parsed.attrs.get("description"),
        Some(&AttrValue::String("foo".to_owned()))
    );
}

#[test]
fn test_multiline_tag_without_name_fails() {
    let raw = "\n__description: foo\n";
    let err = tag::parse_tag(raw, &Config::default()).unwrap_err();
    assert!(matches!(err, ScriptError::InvalidTags { .. }));
}

#[test]
fn test_attribute_coercion_errors() {
    let config = Config::default();
    let err = tag::parse_tag("name\n__include-sql: maybe", &config).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::InvalidAttribute { key, .. } if key == "include-sql"
    ));

    let err = tag::parse_tag("name\n__absolute-tolerance: small", &config).unwrap_err();
    assert!(matches!(err, ScriptError::InvalidAttribute { .. }));
}

#[test]
fn test_wildcard_keys_use_base_type() {
    let config = Config::default();
    let parsed = tag::parse_tag("name\n__include-sql*_h2: false", &config).unwrap();
    assert_eq!(parsed.attrs.get("include-sql*_h2"), Some(&AttrValue::Bool(false)));
}

#[test]
fn test_configured_types() {
    let config = Config::from_toml_str(
        r#"
        [script.tag-to-type-xref]
        list = ["owners"]
        float = []
        bool = ["flagged"]
        "#,
    )
    .unwrap();
    let parsed = tag::parse_tag(
        "name\n__owners: ann, bo\n__flagged: False\n__relative-tolerance: 0.1",
        &config,
    )
    .unwrap();
    assert_eq!(
        parsed.attrs.get("owners"),
        Some(&AttrValue::List(vec!["ann".to_owned(), "bo".to_owned()]))
    );
    assert_eq!(parsed.attrs.get("flagged"), Some(&AttrValue::Bool(false)));
    assert_eq!(
        parsed.attrs.get("relative-tolerance"),
        Some(&AttrValue::String("0.1".to_owned()))
    );
}

#[test]
fn test_is_marker() {
    assert!(tag::is_marker("__appendix__"));
    assert!(tag::is_marker("\n  __appendix__\n__name: x"));
    assert!(!tag::is_marker("__description: foo"));
    assert!(!tag::is_marker("create table~sample"));
    assert!(tag::is_marker("Appendix A: __appendix__"));
    assert!(!tag::is_marker("__appendix"));
    assert_eq!(tag::name_from_marker("Appendix A: __appendix__"), "appendix");
    assert_eq!(tag::name_from_marker("\n__appendix__\n__name: x"), "appendix");
}

#[test]
fn test_parse_name_offsets() {
    let raw = "__appendix__\nAppendix A\n__tags: a";
    assert_eq!(tag::parse_name(raw, 1, true).unwrap(), Some("Appendix A".to_owned()));
    assert_eq!(tag::parse_name("__appendix__\n__tags: a", 1, true).unwrap(), None);
    assert_eq!(tag::parse_name("__appendix__", 1, true).unwrap(), None);
    assert!(tag::parse_name("__appendix__", 0, false).is_err());
}

#[test]
fn test_find_tags() {
    let text = "/*-first-*/\nselect 1;\n/*-\n__second__\n-*/";
    let blocks = tag::find_tags(text, &CoreTags::default()).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].content, "first");
    assert_eq!(&text[blocks[0].start..blocks[0].end], "/*-first-*/");
    assert_eq!(blocks[1].content.trim(), "__second__");
}

#[test]
fn test_mismatched_tags() {
    let err = tag::find_spans("/*-first-*/ /*-second", &CoreTags::default()).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::MismatchedTags {
            opens: 2,
            closes: 1,
            ..
        }
    ));
}

#[test]
fn test_split_sub_blocks() {
    let tags = CoreTags::default();

    let leading = "\n/*-__intro__-*/\n/*-create table~sample-*/\n";
    let (markers, statement_tag) = tag::split_sub_blocks(leading, &tags).unwrap();
    assert_eq!(markers, vec!["__intro__"]);
    assert_eq!(statement_tag.as_deref(), Some("create table~sample"));

    // A blank line between tag and sql detaches the tag
    let leading = "/*-create table~sample-*/\n\n";
    let (_, statement_tag) = tag::split_sub_blocks(leading, &tags).unwrap();
    assert_eq!(statement_tag, None);

    // Comments between tag and sql detach it as well
    let leading = "/*-create table~sample-*/\n-- builds the table\n";
    let (_, statement_tag) = tag::split_sub_blocks(leading, &tags).unwrap();
    assert_eq!(statement_tag, None);

    let leading = "/*-create table~sample-*/\n/*-__intro__-*/\n";
    let (markers, statement_tag) = tag::split_sub_blocks(leading, &tags).unwrap();
    assert_eq!(markers, vec!["__intro__"]);
    assert_eq!(statement_tag, None);
}

#[test]
fn test_as_parsable() {
    let tags = CoreTags::default();
    assert_eq!(tag::as_parsable("select all~x", false, &tags), "/*-select all~x-*/");
    assert_eq!(
        tag::as_parsable("__appendix__\n__name: x", true, &tags),
        "/*-\n__appendix__\n__name: x\n-*/"
    );
}
