/// Decoder for Cobertura XML reports.
///
/// Structure:
///   <coverage>
///     <sources><source>...</source></sources>
///     <packages><package><classes>
///       <class filename="...">
///         <methods><method><lines><line .../></lines></method></methods>
///         <lines>
///           <line number="..." hits="..." branch="true|false"
///                 condition-coverage="50% (1/2)" />
///         </lines>
///       </class>
///     </classes></package></packages>
///   </coverage>
///
/// Lines can appear under both `<method>` and `<class>`; duplicates keep the
/// larger hit count and their branch counts are taken once.
use std::collections::HashMap;
use std::path::Path;
use std::str;
use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use super::{sniff_head, CoverageParser, Format, ParsedReport};
use crate::error::{CovtreeError, Result};
use crate::model::{FileCoverage, LineMetrics};

/// Condition-coverage attributes like "75% (3/4)".
static BRANCH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)/(\d+)\)").unwrap());

pub struct CoberturaParser;

impl CoverageParser for CoberturaParser {
    fn format(&self) -> Format {
        Format::Cobertura
    }

    fn can_parse(&self, _path: &Path, content: &[u8]) -> bool {
        let head = sniff_head(content);
        (head.contains("<?xml") || head.trim_start().starts_with('<')) && head.contains("<coverage")
    }

    fn parse(&self, input: &[u8]) -> Result<ParsedReport> {
        parse_cobertura(input)
    }
}

fn parse_cobertura(input: &[u8]) -> Result<ParsedReport> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut report = ParsedReport::default();
    let mut buf = Vec::new();

    let mut current_file: Option<FileCoverage> = None;
    let mut in_source = false;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => return Err(CovtreeError::Xml(e)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                // A self-closing <source/> has no text and no End event.
                b"source" => in_source = is_start_event,
                b"class" => {
                    let attrs = attr_map(e);
                    if let Some(filename) = attrs.get("filename") {
                        if let Some(file) = current_file.replace(FileCoverage::new(filename.clone())) {
                            report.files.push(file);
                        }
                    }
                }
                b"line" => {
                    if let Some(file) = current_file.as_mut() {
                        record_line(file, &attr_map(e));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_source {
                    if let Ok(text) = e.unescape() {
                        let text = text.trim();
                        if report.source_hint.is_none() && !text.is_empty() {
                            report.source_hint = Some(text.to_string());
                        }
                    }
                    in_source = false;
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"source" => in_source = false,
                b"class" => {
                    if let Some(file) = current_file.take() {
                        report.files.push(file);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    if let Some(file) = current_file.take() {
        report.files.push(file);
    }

    Ok(report)
}

fn record_line(file: &mut FileCoverage, attrs: &HashMap<String, String>) {
    let Some(line_number) = attrs.get("number").and_then(|n| n.parse::<u32>().ok()) else {
        return;
    };
    let hits = attrs
        .get("hits")
        .and_then(|h| h.parse::<i64>().ok())
        .map_or(0, |h| h.max(LineMetrics::NOT_COVERABLE));

    let branches = attrs
        .get("branch")
        .filter(|v| v.as_str() == "true")
        .and_then(|_| attrs.get("condition-coverage"))
        .and_then(|cond| BRANCH_RE.captures(cond))
        .map(|caps| {
            (
                caps[1].parse::<u32>().unwrap_or(0),
                caps[2].parse::<u32>().unwrap_or(0),
            )
        });

    match file.lines.get_mut(&line_number) {
        Some(existing) => {
            existing.hits = existing.hits.max(hits);
            if existing.total_branches == 0 {
                if let Some((covered, total)) = branches {
                    existing.covered_branches = covered;
                    existing.total_branches = total;
                }
            }
        }
        None => {
            let (covered, total) = branches.unwrap_or((0, 0));
            file.lines
                .insert(line_number, LineMetrics::with_branches(hits, covered, total));
        }
    }
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &quick_xml::events::BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}
