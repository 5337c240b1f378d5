/// Decoder for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Records used:
///   SF:<path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means not taken)
///   end_of_record
///
/// Summary records (LF, LH, BRF, BRH, FNF, FNH) are ignored; everything is
/// derived from the line data.
use std::io::BufRead;
use std::path::Path;

use super::{sniff_head, CoverageParser, Format, ParsedReport};
use crate::error::{CovtreeError, Result};
use crate::model::{FileCoverage, LineMetrics};

pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "info" || ext == "lcov" {
                return true;
            }
        }

        let head = sniff_head(content);
        let has_sf = head.lines().any(|l| l.starts_with("SF:"));
        let has_da_or_fn = head
            .lines()
            .any(|l| l.starts_with("DA:") || l.starts_with("FN:"));
        has_sf && has_da_or_fn
    }

    fn parse(&self, input: &[u8]) -> Result<ParsedReport> {
        let mut report = ParsedReport::default();
        parse_streaming(&mut &*input, &mut |file| report.files.push(file))?;
        Ok(report)
    }
}

/// Calls `emit` once per `end_of_record`, reading line by line.
pub fn parse_streaming(reader: &mut dyn BufRead, emit: &mut dyn FnMut(FileCoverage)) -> Result<()> {
    let mut current_file: Option<FileCoverage> = None;

    let mut raw_line = String::new();
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| CovtreeError::Parse(format!("Invalid LCOV data: {}", e)))?;
        if n == 0 {
            break;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(file) = current_file.take() {
                emit(file);
            }
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };

        match tag {
            "SF" => {
                if let Some(file) = current_file.replace(FileCoverage::new(value.to_string())) {
                    emit(file);
                }
            }
            "DA" => {
                let Some(file) = current_file.as_mut() else {
                    continue;
                };
                let mut parts = value.splitn(3, ',');
                let (Some(number), Some(count)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let (Ok(line_number), Ok(count)) = (number.parse::<u32>(), count.parse::<i64>())
                else {
                    continue;
                };
                // Negative counts mark non-instrumentable lines.
                let hits = if count < 0 { LineMetrics::NOT_COVERABLE } else { count };
                let entry = file
                    .lines
                    .entry(line_number)
                    .or_insert_with(LineMetrics::not_coverable);
                entry.hits = entry.hits.max(hits);
            }
            "BRDA" => {
                let Some(file) = current_file.as_mut() else {
                    continue;
                };
                let parts: Vec<&str> = value.splitn(4, ',').collect();
                if parts.len() != 4 {
                    continue;
                }
                let Ok(line_number) = parts[0].parse::<u32>() else {
                    continue;
                };
                let taken = if parts[3] == "-" {
                    0
                } else {
                    parts[3].parse::<u64>().unwrap_or(0)
                };
                let entry = file
                    .lines
                    .entry(line_number)
                    .or_insert_with(LineMetrics::not_coverable);
                entry.total_branches += 1;
                if taken > 0 {
                    entry.covered_branches += 1;
                }
            }
            _ => {}
        }
    }

    // Tolerate a missing final end_of_record.
    if let Some(file) = current_file.take() {
        emit(file);
    }

    Ok(())
}
