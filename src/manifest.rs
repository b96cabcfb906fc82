// src/manifest.rs

//! Package manifest (package.xml) parsing and field extraction
//!
//! Upstream manifests are loose about shape: the maintainer field may be a
//! single record, a list, or a record without a display name; the url field
//! may be plain text or typed. Rather than sniffing shapes at every use
//! site, the parser classifies each field into a [`FieldShape`] once and
//! extraction handles each variant explicitly.

use crate::error::{Error, Result};
use crate::recipe::DependencyKind;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Placeholder for maintainer records that omit a display name
pub const UNKNOWN_MAINTAINER: &str = "UNKNOWN";

/// Build type assumed when the manifest export section does not declare one
const DEFAULT_BUILD_TYPE: &str = "catkin";

/// A maintainer extracted from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maintainer {
    pub name: String,
    pub email: Option<String>,
}

/// A raw repeatable-field record before classification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub text: Option<String>,
    pub email: Option<String>,
}

/// Classified shape of a manifest field, decided once at parse time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    Absent,
    PlainText(String),
    SingleRecord(Record),
    RecordList(Vec<Record>),
    TypedRecord { kind: String, text: Option<String> },
}

/// Parsed package manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    pub description: Option<String>,
    pub licenses: Vec<String>,
    pub homepage: Option<String>,
    pub maintainer: Option<Maintainer>,
    pub build_type: String,
    depends: BTreeMap<DependencyKind, BTreeSet<String>>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            description: None,
            licenses: Vec::new(),
            homepage: None,
            maintainer: None,
            build_type: DEFAULT_BUILD_TYPE.to_string(),
            depends: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Parse manifest bytes into typed fields
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw = RawManifest::parse(bytes)?;

        let maintainer = match classify_records(raw.maintainers) {
            FieldShape::SingleRecord(record) => Some(record_to_maintainer(&record)),
            FieldShape::RecordList(records) => records.first().map(record_to_maintainer),
            _ => None,
        };

        let homepage = match classify_urls(raw.urls) {
            FieldShape::PlainText(url) => Some(url),
            FieldShape::TypedRecord { kind, text } if kind == "website" => {
                if text.is_none() {
                    warn!("manifest website url carries no text");
                }
                text
            }
            FieldShape::Absent => {
                warn!("manifest has no website url field");
                None
            }
            other => {
                warn!("failed to interpret manifest url field ({other:?})");
                None
            }
        };

        Ok(Self {
            description: raw.description,
            licenses: raw.licenses,
            homepage,
            maintainer,
            build_type: raw.build_type.unwrap_or_else(|| DEFAULT_BUILD_TYPE.to_string()),
            depends: raw.depends,
        })
    }

    /// Dependency identifiers declared for one category
    pub fn depends(&self, kind: DependencyKind) -> BTreeSet<String> {
        self.depends.get(&kind).cloned().unwrap_or_default()
    }
}

fn record_to_maintainer(record: &Record) -> Maintainer {
    Maintainer {
        name: record
            .text
            .clone()
            .unwrap_or_else(|| UNKNOWN_MAINTAINER.to_string()),
        email: record.email.clone(),
    }
}

/// Classify a repeatable record field by cardinality
fn classify_records(records: Vec<Record>) -> FieldShape {
    let mut records = records;
    match records.len() {
        0 => FieldShape::Absent,
        1 => FieldShape::SingleRecord(records.remove(0)),
        _ => FieldShape::RecordList(records),
    }
}

/// Classify the url field: plain text, typed, absent, or unusable
fn classify_urls(nodes: Vec<UrlNode>) -> FieldShape {
    let mut nodes = nodes;
    match nodes.len() {
        0 => FieldShape::Absent,
        1 => {
            let node = nodes.remove(0);
            match (node.kind, node.text) {
                (None, Some(text)) => FieldShape::PlainText(text),
                (Some(kind), text) => FieldShape::TypedRecord { kind, text },
                (None, None) => FieldShape::Absent,
            }
        }
        _ => FieldShape::RecordList(
            nodes
                .into_iter()
                .map(|n| Record {
                    text: n.text,
                    email: None,
                })
                .collect(),
        ),
    }
}

/// A url element before classification
#[derive(Debug)]
struct UrlNode {
    kind: Option<String>,
    text: Option<String>,
}

/// Accumulator for the event-driven parse pass
#[derive(Default)]
struct RawManifest {
    description: Option<String>,
    licenses: Vec<String>,
    maintainers: Vec<Record>,
    urls: Vec<UrlNode>,
    build_type: Option<String>,
    depends: BTreeMap<DependencyKind, BTreeSet<String>>,
}

impl RawManifest {
    fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();

        let mut raw = RawManifest::default();
        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut current_email: Option<String> = None;
        let mut current_url_kind: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if stack.len() == 1 {
                        text.clear();
                        match name.as_str() {
                            "maintainer" => current_email = attr_value(&e, "email")?,
                            "url" => current_url_kind = attr_value(&e, "type")?,
                            _ => {}
                        }
                    } else if stack.len() == 2 && stack[1] == "export" && name == "build_type" {
                        text.clear();
                    }
                    stack.push(name);
                }
                Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if stack.len() == 1 {
                        match name.as_str() {
                            "maintainer" => raw.maintainers.push(Record {
                                text: None,
                                email: attr_value(&e, "email")?,
                            }),
                            "url" => raw.urls.push(UrlNode {
                                kind: attr_value(&e, "type")?,
                                text: None,
                            }),
                            _ => {}
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    let chunk = t.unescape().map_err(|e| {
                        Error::ParseError(format!("Invalid manifest text: {e}"))
                    })?;
                    text.push_str(&chunk);
                }
                Ok(Event::CData(t)) => {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
                Ok(Event::End(_)) => {
                    let popped = stack.pop().unwrap_or_default();
                    if stack.len() == 1 {
                        raw.dispatch(&popped, &text, &mut current_email, &mut current_url_kind);
                        text.clear();
                    } else if popped == "build_type"
                        && stack.len() == 2
                        && stack[1] == "export"
                    {
                        raw.build_type = non_empty(text.trim());
                        text.clear();
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::ParseError(format!("Invalid manifest XML: {e}")));
                }
            }
            buf.clear();
        }

        Ok(raw)
    }

    /// Record a completed top-level manifest field
    fn dispatch(
        &mut self,
        field: &str,
        text: &str,
        current_email: &mut Option<String>,
        current_url_kind: &mut Option<String>,
    ) {
        let value = text.trim();
        match field {
            "description" => {
                if !value.is_empty() {
                    self.description = Some(normalize_whitespace(value));
                }
            }
            "license" => {
                if !value.is_empty() {
                    self.licenses.push(value.to_string());
                }
            }
            "maintainer" => self.maintainers.push(Record {
                text: non_empty(value),
                email: current_email.take(),
            }),
            "url" => self.urls.push(UrlNode {
                kind: current_url_kind.take(),
                text: non_empty(value),
            }),
            _ => {
                if value.is_empty() {
                    return;
                }
                for kind in dependency_kinds(field) {
                    self.depends
                        .entry(*kind)
                        .or_default()
                        .insert(value.to_string());
                }
            }
        }
    }
}

/// Manifest dependency tags mapped to upstream categories
///
/// The composite `depend` tag expands to build, build-export, and exec; the
/// legacy `run_depend` tag expands to build-export and exec.
fn dependency_kinds(tag: &str) -> &'static [DependencyKind] {
    use DependencyKind::*;
    match tag {
        "buildtool_depend" => &[Buildtool],
        "buildtool_export_depend" => &[BuildtoolExport],
        "build_depend" => &[Build],
        "build_export_depend" => &[BuildExport],
        "exec_depend" => &[Exec],
        "test_depend" => &[Test],
        "depend" => &[Build, BuildExport, Exec],
        "run_depend" => &[BuildExport, Exec],
        _ => &[],
    }
}

fn attr_value(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr =
            attr.map_err(|e| Error::ParseError(format!("Invalid manifest attribute: {e}")))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(|e| {
                Error::ParseError(format!("Invalid manifest attribute value: {e}"))
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
