use indexmap::IndexMap;

use crate::error::{CiUnitError, Result};

/// A parsed JUnit suite. Suites nest arbitrarily deep; a `testsuites`
/// document root is treated as a transparent wrapper whose suites become
/// children of a synthetic empty root.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    pub testcases: Vec<TestCase>,
    pub children: Vec<TestSuite>,
}

/// A single `testcase` element.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub classname: Option<String>,
    pub class: Option<String>,
    pub time: Option<f64>,
}

impl TestCase {
    /// Normalized key identifying this test across reports.
    ///
    /// `classname` wins over `class`; without either the bare name is used.
    /// Extraction passes being diffed rely on this being stable.
    pub fn fingerprint(&self) -> String {
        match self.classname.as_deref().or(self.class.as_deref()) {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

/// Parses JUnit XML content into a suite tree.
///
/// Both document shapes are accepted: a `testsuites` wrapper around one or
/// more suites, or a bare `testsuite` root. A well-formed document whose
/// root is neither yields an empty suite rather than an error.
///
/// # Errors
///
/// Returns `MalformedDocument` when the content is not well-formed XML.
pub fn parse(xml: &str) -> Result<TestSuite> {
    let document =
        roxmltree::Document::parse(xml).map_err(|e| CiUnitError::MalformedDocument(e.to_string()))?;

    let root = document.root_element();
    if root.has_tag_name("testsuite") {
        return Ok(parse_suite(root));
    }

    if root.has_tag_name("testsuites") {
        return Ok(TestSuite {
            testcases: Vec::new(),
            children: root
                .children()
                .filter(|node| node.has_tag_name("testsuite"))
                .map(parse_suite)
                .collect(),
        });
    }

    Ok(TestSuite::default())
}

fn parse_suite(node: roxmltree::Node<'_, '_>) -> TestSuite {
    let mut suite = TestSuite::default();

    for child in node.children() {
        if child.has_tag_name("testcase") {
            suite.testcases.push(parse_case(child));
        } else if child.has_tag_name("testsuite") {
            suite.children.push(parse_suite(child));
        }
    }

    suite
}

fn parse_case(node: roxmltree::Node<'_, '_>) -> TestCase {
    TestCase {
        name: node.attribute("name").unwrap_or_default().to_string(),
        classname: node.attribute("classname").map(str::to_string),
        class: node.attribute("class").map(str::to_string),
        time: node.attribute("time").and_then(|t| t.parse::<f64>().ok()),
    }
}

/// Collects one fingerprint per test case at every depth, in document
/// order. Duplicates are kept so callers can detect repeated executions.
pub fn extract_fingerprints(suite: &TestSuite) -> Vec<String> {
    let mut fingerprints = Vec::new();
    collect_fingerprints(suite, &mut fingerprints);
    fingerprints
}

fn collect_fingerprints(suite: &TestSuite, accumulator: &mut Vec<String>) {
    for case in &suite.testcases {
        accumulator.push(case.fingerprint());
    }

    for child in &suite.children {
        collect_fingerprints(child, accumulator);
    }
}

/// Extracts per-test durations in whole seconds (`time` truncated).
///
/// Shallow on purpose: only direct `testcase` children of the first
/// `testsuite` element below the document root are scanned (the root
/// itself when the document root is a bare `testsuite`). Nested suites
/// are ignored. The last-seen value wins when a fingerprint repeats.
///
/// # Errors
///
/// Returns `MalformedDocument` when the content is not well-formed XML.
pub fn extract_timings(xml: &str) -> Result<IndexMap<String, u64>> {
    let document =
        roxmltree::Document::parse(xml).map_err(|e| CiUnitError::MalformedDocument(e.to_string()))?;

    let root = document.root_element();
    let suite = if root.has_tag_name("testsuite") {
        Some(root)
    } else {
        root.children().find(|node| node.has_tag_name("testsuite"))
    };

    let mut timings = IndexMap::new();
    if let Some(suite) = suite {
        for node in suite.children().filter(|node| node.has_tag_name("testcase")) {
            let case = parse_case(node);
            timings.insert(case.fingerprint(), case.time.unwrap_or(0.0) as u64);
        }
    }

    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED_REPORT: &str = r#"<?xml version="1.0"?>
<testsuites>
  <testsuite name="outer">
    <testcase classname="App\FooTest" name="test_foo" time="1.5"/>
    <testsuite name="inner">
      <testcase class="App\BarTest" name="test_bar" time="0.2"/>
      <testcase name="test_baz" time="3.9"/>
    </testsuite>
  </testsuite>
</testsuites>"#;

    #[test]
    fn test_extract_fingerprints_walks_nested_suites() {
        let suite = parse(NESTED_REPORT).unwrap();
        let fingerprints = extract_fingerprints(&suite);

        assert_eq!(
            fingerprints,
            vec![
                "App\\FooTest:test_foo".to_string(),
                "App\\BarTest:test_bar".to_string(),
                "test_baz".to_string(),
            ]
        );
    }

    #[test]
    fn test_classname_wins_over_class() {
        let xml = r#"<testsuite>
            <testcase classname="New" class="Old" name="test_it"/>
        </testsuite>"#;

        let suite = parse(xml).unwrap();
        assert_eq!(extract_fingerprints(&suite), vec!["New:test_it".to_string()]);
    }

    #[test]
    fn test_bare_testsuite_root() {
        let xml = r#"<testsuite>
            <testcase classname="A" name="one"/>
            <testcase classname="A" name="two"/>
        </testsuite>"#;

        let suite = parse(xml).unwrap();
        assert_eq!(extract_fingerprints(&suite).len(), 2);
    }

    #[test]
    fn test_unknown_root_yields_empty_suite() {
        let suite = parse("<report></report>").unwrap();
        assert!(extract_fingerprints(&suite).is_empty());
    }

    #[test]
    fn test_unparsable_content_is_malformed() {
        let result = parse("not xml at all <<<");
        assert!(matches!(result, Err(CiUnitError::MalformedDocument(_))));
    }

    #[test]
    fn test_duplicates_are_preserved_in_order() {
        let xml = r#"<testsuite>
            <testcase classname="A" name="same"/>
            <testcase classname="A" name="same"/>
        </testsuite>"#;

        let suite = parse(xml).unwrap();
        let fingerprints = extract_fingerprints(&suite);
        assert_eq!(fingerprints.len(), 2);
        assert_eq!(fingerprints[0], fingerprints[1]);
    }

    #[test]
    fn test_timings_are_shallow_and_truncated() {
        let timings = extract_timings(NESTED_REPORT).unwrap();

        // Only the outer suite's direct test case is scanned.
        assert_eq!(timings.len(), 1);
        assert_eq!(timings.get("App\\FooTest:test_foo"), Some(&1));
    }

    #[test]
    fn test_timings_from_bare_root() {
        let xml = r#"<testsuite>
            <testcase classname="A" name="slow" time="12.9"/>
            <testcase classname="A" name="fast" time="0.01"/>
        </testsuite>"#;

        let timings = extract_timings(xml).unwrap();
        assert_eq!(timings.get("A:slow"), Some(&12));
        assert_eq!(timings.get("A:fast"), Some(&0));
    }

    #[test]
    fn test_timings_last_seen_wins() {
        let xml = r#"<testsuite>
            <testcase classname="A" name="repeat" time="1.0"/>
            <testcase classname="A" name="repeat" time="7.0"/>
        </testsuite>"#;

        let timings = extract_timings(xml).unwrap();
        assert_eq!(timings.len(), 1);
        assert_eq!(timings.get("A:repeat"), Some(&7));
    }

    #[test]
    fn test_timings_missing_time_defaults_to_zero() {
        let xml = r#"<testsuite><testcase classname="A" name="untimed"/></testsuite>"#;

        let timings = extract_timings(xml).unwrap();
        assert_eq!(timings.get("A:untimed"), Some(&0));
    }
}
