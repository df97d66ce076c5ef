use sqlscript::marker::MarkerPosition;
use sqlscript::scope::{Component, Filter};
use sqlscript::script::Content;
use sqlscript::tag::AttrValue;
use sqlscript::{Config, Script};

const MARKED_SQL: &str = r#"/*-__setup__-*/
/*-create table~sample-*/
create table sample_table (col1 int);

/*-
__appendix__
__name: Appendix
__tags: a, b
-*/
insert into sample_table values (1);

/*-__setup__-*/
select * from sample_table;

/*-__done__-*/
"#;

fn position(statement: usize, ordinal: usize) -> MarkerPosition {
    MarkerPosition { statement, ordinal }
}

fn labels(contents: Vec<Content<'_>>) -> Vec<String> {
    contents
        .iter()
        .map(|content| match content {
            Content::Statement(statement) => statement.nm(),
            Content::Marker(marker) => format!("[{}]", marker.name),
        })
        .collect()
}

#[test]
fn test_markers_are_positioned() {
    let script = Script::new(MARKED_SQL, Config::default()).unwrap();
    assert_eq!(script.depth(), 3);
    assert_eq!(
        script.markers().keys().copied().collect::<Vec<_>>(),
        vec![position(1, 1), position(2, 1), position(4, 1)]
    );

    let setup = &script.markers()[&position(1, 1)];
    assert_eq!(setup.name, "setup");
    assert_eq!(setup.marker_name, "setup");
    assert_eq!(setup.position.to_string(), "1.1");

    let appendix = &script.markers()[&position(2, 1)];
    assert_eq!(appendix.name, "Appendix");
    assert_eq!(appendix.marker_name, "appendix");
    assert!(!appendix.attrs.contains("name"));
    assert_eq!(
        appendix.attrs.get("tags"),
        Some(&AttrValue::List(vec!["a".to_owned(), "b".to_owned()]))
    );

    let done = &script.markers()[&position(4, 1)];
    assert_eq!(done.name, "done");
}

#[test]
fn test_markers_do_not_name_statements() {
    let script = Script::new(MARKED_SQL, Config::default()).unwrap();
    assert_eq!(
        script.names(),
        vec!["create table~sample", "insert into~s2", "select data~s3"]
    );
    assert!(!script.statement(2).unwrap().is_tagged());
    assert!(!script.statement(3).unwrap().is_tagged());
}

#[test]
fn test_contents_interleave_markers() {
    let script = Script::new(MARKED_SQL, Config::default()).unwrap();

    let contents = script.contents(true);
    assert_eq!(contents.keys().copied().collect::<Vec<_>>(), (1..=6).collect::<Vec<_>>());
    assert_eq!(
        labels(contents.into_values().collect()),
        vec![
            "[setup]",
            "create table~sample",
            "[Appendix]",
            "insert into~s2",
            "select data~s3",
            "[done]",
        ]
    );

    let statements_only = script.contents(false);
    assert_eq!(statements_only.len(), 3);
    assert!(statements_only.values().all(|content| !content.is_marker()));

    let by_name = script.contents_by_name(true).unwrap();
    assert_eq!(
        by_name.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "setup",
            "create table~sample",
            "Appendix",
            "insert into~s2",
            "select data~s3",
            "done",
        ]
    );
}

#[test]
fn test_filtered_contents_keep_markers() {
    let mut script = Script::new(MARKED_SQL, Config::default()).unwrap();
    let view = script
        .filter(Filter::new().exclude(Component::Keyword, ["select"]))
        .unwrap();
    assert_eq!(
        labels(view.contents(true).into_values().collect()),
        vec![
            "[setup]",
            "create table~sample",
            "[Appendix]",
            "insert into~s2",
            "[done]",
        ]
    );
}

#[test]
fn test_marker_templates() {
    let config = Config::from_toml_str(
        r#"
        [script.markers."__done__"]
        name = "The End"

        [script.markers."__done__".attrs]
        format = "md"
        include-sql = false

        [script.markers."__appendix__".attrs]
        tags = ["default"]
        format = "html"
        "#,
    )
    .unwrap();
    let script = Script::new(MARKED_SQL, config).unwrap();

    let done = &script.markers()[&position(4, 1)];
    assert_eq!(done.name, "The End");
    assert_eq!(done.attrs.get("format"), Some(&AttrValue::String("md".to_owned())));
    assert_eq!(done.attrs.get("include-sql"), Some(&AttrValue::Bool(false)));

    // Parsed attributes override template defaults
    let appendix = &script.markers()[&position(2, 1)];
    assert_eq!(appendix.name, "Appendix");
    assert_eq!(
        appendix.attrs.get("tags"),
        Some(&AttrValue::List(vec!["a".to_owned(), "b".to_owned()]))
    );
    assert_eq!(
        appendix.attrs.get("format"),
        Some(&AttrValue::String("html".to_owned()))
    );
}

#[test]
fn test_marker_name_on_second_line() {
    let sql = "/*-\n__section__\nFirst Section\n__description: intro\n-*/\nselect 1;";
    let script = Script::new(sql, Config::default()).unwrap();
    let marker = &script.markers()[&position(1, 1)];
    assert_eq!(marker.name, "First Section");
    assert_eq!(
        marker.attrs.get("description"),
        Some(&AttrValue::String("intro".to_owned()))
    );
    assert_eq!(
        marker.trim(script.config()),
        "/*-\n__section__\nFirst Section\n__description: intro\n-*/"
    );
}

#[test]
fn test_trailing_markers_follow_pushed_statements() {
    let mut script = Script::new(MARKED_SQL, Config::default()).unwrap();
    script.push_statement("drop table sample_table", None).unwrap();
    assert!(script.markers().contains_key(&position(5, 1)));
    let contents = script.contents(true);
    assert_eq!(contents.values().last().map(|content| content.name()), Some("done".to_owned()));
}
