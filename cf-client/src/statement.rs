//! Problem statement parsing
//!
//! The parser only relies on the [`DocumentQuery`] capability, so the
//! algorithm does not depend on a particular HTML library. [`HtmlDocument`]
//! provides it on top of `scraper`.

use crate::client::CfClient;
use crate::error::ParseError;
use crate::model::{Contest, IoDescriptor, Task, Test, problem_index};
use crate::session::Session;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Read-only CSS-selector access to a parsed document
pub trait DocumentQuery {
    type Node<'a>: Copy
    where
        Self: 'a;

    /// All nodes of the document matching `selector`, in document order
    fn find_all<'a>(&'a self, selector: &str) -> Result<Vec<Self::Node<'a>>, ParseError>;

    /// All descendants of `scope` matching `selector`, in document order
    fn find_within<'a>(
        &'a self,
        scope: Self::Node<'a>,
        selector: &str,
    ) -> Result<Vec<Self::Node<'a>>, ParseError>;

    /// Concatenated text of a node and its descendants
    fn text<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Text carried by each direct child of a node
    ///
    /// Text nodes yield their text, line breaks yield an empty string and
    /// other elements yield their full text.
    fn children<'a>(&'a self, node: Self::Node<'a>) -> Vec<String>;
}

/// A `scraper` document implementing [`DocumentQuery`]
#[derive(Debug)]
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|_| ParseError::Selector(selector.to_string()))
}

impl DocumentQuery for HtmlDocument {
    type Node<'a> = ElementRef<'a>;

    fn find_all<'a>(&'a self, selector: &str) -> Result<Vec<ElementRef<'a>>, ParseError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    fn find_within<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
    ) -> Result<Vec<ElementRef<'a>>, ParseError> {
        let selector = compile(selector)?;
        Ok(scope.select(&selector).collect())
    }

    fn text<'a>(&'a self, node: ElementRef<'a>) -> String {
        node.text().collect()
    }

    fn children<'a>(&'a self, node: ElementRef<'a>) -> Vec<String> {
        node.children()
            .map(|child| match child.value() {
                Node::Text(text) => (**text).to_string(),
                Node::Element(element) if element.name() == "br" => String::new(),
                Node::Element(_) => ElementRef::wrap(child)
                    .map(|element| element.text().collect())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .collect()
    }
}

/// Collapse every run of newlines into a single newline
pub fn collapse_newlines(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\n' && collapsed.ends_with('\n') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

/// Turns a contest's problems page into [`Task`]s
#[derive(Debug, Default)]
pub struct StatementParser {
    time_limit_regex: OnceLock<Regex>,
    memory_limit_regex: OnceLock<Regex>,
}

impl StatementParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn time_limit_regex(&self) -> &Regex {
        self.time_limit_regex
            .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*seconds?").unwrap())
    }

    fn memory_limit_regex(&self) -> &Regex {
        self.memory_limit_regex
            .get_or_init(|| Regex::new(r"(\d+)\s*megabytes?").unwrap())
    }

    /// Fetch `/contest/{id}/problems` and parse it
    ///
    /// # Errors
    ///
    /// * `ParseError::Fetch` - The page could not be fetched
    /// * `ParseError::Structure` - The page is not a problems page
    pub fn fetch(
        &self,
        client: &CfClient,
        contest: &Contest,
        session: &Session,
    ) -> Result<Vec<Task>, ParseError> {
        let path = format!("/contest/{}/problems", contest.id);
        let html = client
            .get_html(&path, session)
            .map_err(|source| ParseError::Fetch {
                url: path.clone(),
                source: Box::new(source),
            })?;

        let document = HtmlDocument::parse(&html);
        self.parse(&document, contest, &client.host())
    }

    /// Parse every `.problem-statement` of a document, in document order
    pub fn parse<D: DocumentQuery>(
        &self,
        document: &D,
        contest: &Contest,
        host: &str,
    ) -> Result<Vec<Task>, ParseError> {
        let statements = document.find_all(".problem-statement")?;
        if statements.is_empty() {
            return Err(ParseError::Structure(
                "no problem statements found".to_string(),
            ));
        }
        info!(contest = contest.id, count = statements.len(), "Found problems");

        statements
            .into_iter()
            .map(|statement| self.parse_statement(document, statement, contest, host))
            .collect()
    }

    fn parse_statement<'a, D: DocumentQuery>(
        &self,
        document: &'a D,
        statement: D::Node<'a>,
        contest: &Contest,
        host: &str,
    ) -> Result<Task, ParseError> {
        let name = first_text(document, statement, ".header .title")?
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| {
                ParseError::Structure("problem statement without title".to_string())
            })?;

        let input = descriptor_text(document, statement, ".input-file")?
            .map(|text| io_descriptor(&text, "standard input", IoDescriptor::stdin))
            .unwrap_or_else(IoDescriptor::stdin);
        let output = descriptor_text(document, statement, ".output-file")?
            .map(|text| io_descriptor(&text, "standard output", IoDescriptor::stdout))
            .unwrap_or_else(IoDescriptor::stdout);

        let time_limit = first_text(document, statement, ".time-limit")?
            .and_then(|text| self.parse_time_limit(&text));
        let memory_limit = first_text(document, statement, ".memory-limit")?
            .and_then(|text| self.parse_memory_limit(&text));

        let inputs = document.find_within(statement, ".sample-test .input pre")?;
        let outputs = document.find_within(statement, ".sample-test .output pre")?;
        if inputs.len() != outputs.len() {
            warn!(
                problem = %name,
                inputs = inputs.len(),
                outputs = outputs.len(),
                "Unrecognized sample tests format, extra blocks dropped"
            );
        }

        let tests = inputs
            .into_iter()
            .zip(outputs)
            .enumerate()
            .map(|(i, (input, output))| Test {
                id: (i + 1).to_string(),
                input: sample_text(document, input),
                output: sample_text(document, output),
            })
            .collect();

        let url = format!(
            "{}/contest/{}/problem/{}",
            host.trim_end_matches('/'),
            contest.id,
            problem_index(&name)
        );

        Ok(Task {
            name,
            group: contest.name.clone(),
            url,
            input,
            output,
            time_limit,
            memory_limit,
            tests,
        })
    }

    /// Time limit in milliseconds from e.g. `time limit per test2.5 seconds`
    fn parse_time_limit(&self, text: &str) -> Option<u64> {
        let captures = self.time_limit_regex().captures(text)?;
        let seconds: f64 = captures.get(1)?.as_str().parse().ok()?;
        Some((seconds * 1000.0).round() as u64)
    }

    /// Memory limit in megabytes from e.g. `memory limit per test256 megabytes`
    fn parse_memory_limit(&self, text: &str) -> Option<u64> {
        let captures = self.memory_limit_regex().captures(text)?;
        captures.get(1)?.as_str().parse().ok()
    }
}

fn first_text<'a, D: DocumentQuery>(
    document: &'a D,
    scope: D::Node<'a>,
    selector: &str,
) -> Result<Option<String>, ParseError> {
    Ok(document
        .find_within(scope, selector)?
        .into_iter()
        .next()
        .map(|node| document.text(node)))
}

/// Text of a header property without its `.property-title` label
fn descriptor_text<'a, D: DocumentQuery>(
    document: &'a D,
    scope: D::Node<'a>,
    selector: &str,
) -> Result<Option<String>, ParseError> {
    let Some(node) = document.find_within(scope, selector)?.into_iter().next() else {
        return Ok(None);
    };
    let text = document.text(node);
    let label = first_text(document, node, ".property-title")?.unwrap_or_default();
    Ok(Some(text.strip_prefix(label.as_str()).unwrap_or(&text).to_string()))
}

fn io_descriptor(text: &str, standard: &str, sentinel: fn() -> IoDescriptor) -> IoDescriptor {
    if text.contains(standard) {
        sentinel()
    } else {
        IoDescriptor {
            kind: text.trim().to_string(),
        }
    }
}

fn sample_text<'a, D: DocumentQuery>(document: &'a D, block: D::Node<'a>) -> String {
    collapse_newlines(&document.children(block).join("\n"))
}
