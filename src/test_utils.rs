use std::fmt::Display;

use serde::Deserialize;

use crate::name::NameParts;

pub const NAMING_TESTS_FILE: &str = "tests/naming_tests.toml";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TestNameParts {
    pub kw: String,
    pub obj: String,
    pub desc: String,
    pub anchor: String,
    pub nm: String,
}

impl PartialEq<NameParts> for TestNameParts {
    fn eq(&self, other: &NameParts) -> bool {
        self.kw == other.keyword
            && self.obj == other.object
            && self.desc == other.description
            && self.anchor == other.anchor
            && self.nm == other.full
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestNaming {
    pub sql: String,
    pub index: usize,
    #[serde(default)]
    pub tag: String,
    pub desc_is_simple: Option<bool>,
    pub generated: TestNameParts,
    pub provided: Option<TestNameParts>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestNamingData {
    pub tests: Vec<TestNaming>,
}

impl Display for TestNamingData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
