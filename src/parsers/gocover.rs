/// Decoder for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each block covers a range of lines. Blocks are expanded into per-line
/// entries; a line touched by several blocks keeps the largest count.
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;

use super::{sniff_head, CoverageParser, Format, ParsedReport};
use crate::error::{CovtreeError, Result};
use crate::model::{FileCoverage, LineMetrics};

pub struct GocoverParser;

impl CoverageParser for GocoverParser {
    fn format(&self) -> Format {
        Format::Gocover
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "coverprofile" || ext == "gocov" {
                return true;
            }
        }

        // Profiles produced by merge tools may lack the mode header.
        let head = sniff_head(content);
        if head.lines().next().is_some_and(|first| first.starts_with("mode: ")) {
            return true;
        }
        head.lines().any(looks_like_go_block)
    }

    fn parse(&self, input: &[u8]) -> Result<ParsedReport> {
        let mut report = ParsedReport::default();
        parse_reader(&mut &*input, &mut |file| report.files.push(file))?;
        Ok(report)
    }
}

struct Block {
    start_line: u32,
    end_line: u32,
    count: i64,
}

/// e.g. "github.com/user/repo/file.go:10.1,20.5 3 1"
fn looks_like_go_block(line: &str) -> bool {
    let Some(colon_pos) = line.rfind(".go:") else {
        return false;
    };
    let after = &line[colon_pos + 4..];
    after.contains(',') && after.split_whitespace().count() >= 2
}

/// `<file>:<startLine>.<startCol>,<endLine>.<endCol> <numStmt> <count>`
fn parse_block_line(line: &str) -> Option<(&str, Block)> {
    // The last ".go:" separates the path from the range, so paths may
    // contain colons.
    let colon_pos = line.rfind(".go:")? + 3;

    let file = &line[..colon_pos];
    let rest = &line[colon_pos + 1..];

    let (range, tail) = rest.split_once(' ')?;
    let (start, end) = range.split_once(',')?;

    let start_line: u32 = start.split_once('.')?.0.parse().ok()?;
    let end_line: u32 = end.split_once('.')?.0.parse().ok()?;

    let mut parts = tail.split_whitespace();
    let _num_stmt = parts.next()?;
    let count: i64 = parts.next()?.parse().ok()?;

    Some((
        file,
        Block {
            start_line,
            end_line,
            count,
        },
    ))
}

/// Collect blocks per file, then emit one record per file in first-seen
/// order.
fn parse_reader(reader: &mut dyn BufRead, emit: &mut dyn FnMut(FileCoverage)) -> Result<()> {
    let mut file_order: Vec<String> = Vec::new();
    let mut file_blocks: HashMap<String, Vec<Block>> = HashMap::new();

    let mut raw_line = String::new();
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| CovtreeError::Parse(format!("Invalid Go coverage data: {}", e)))?;
        if n == 0 {
            break;
        }

        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("mode:") {
            continue;
        }

        if let Some((file, block)) = parse_block_line(line) {
            if !file_blocks.contains_key(file) {
                file_order.push(file.to_string());
            }
            file_blocks.entry(file.to_string()).or_default().push(block);
        }
    }

    for path in file_order {
        if let Some(blocks) = file_blocks.remove(&path) {
            emit(blocks_to_file_coverage(path, &blocks));
        }
    }

    Ok(())
}

fn blocks_to_file_coverage(path: String, blocks: &[Block]) -> FileCoverage {
    let mut lines: BTreeMap<u32, LineMetrics> = BTreeMap::new();
    for block in blocks {
        // The end line is included even when the block stops at column 1.
        for line_number in block.start_line..=block.end_line {
            let entry = lines.entry(line_number).or_insert(LineMetrics::new(0));
            entry.hits = entry.hits.max(block.count);
        }
    }
    FileCoverage { path, lines }
}
