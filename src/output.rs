/*!
 * Rendering of alignment results.
 *
 * - `json`: The full report with run statistics
 * - `srt`: Bilingual subtitles, source line above target line
 * - `tsv`: One row per pair
 */

use anyhow::{Context, Result};

use crate::alignment::{AlignedPair, AlignmentReport};
use crate::app_config::OutputFormat;
use crate::subtitle_processor::{format_timestamp, Caption};

/// Header row of the TSV format
pub const TSV_HEADER: &str = "start\tend\tconfidence\tsource\ttarget";

/// Render a report in the requested format
pub fn render(report: &AlignmentReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Srt => Ok(to_srt(&report.pairs)),
        OutputFormat::Tsv => Ok(to_tsv(&report.pairs)),
    }
}

/// Pretty-printed JSON report
pub fn to_json(report: &AlignmentReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize alignment report")
}

/// Bilingual SRT, numbered from 1, on the source timing
pub fn to_srt(pairs: &[AlignedPair]) -> String {
    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            Caption::new(
                (i + 1).to_string(),
                pair.start,
                pair.end,
                format!("{}\n{}", pair.source_text, pair.target_text),
            )
            .to_string()
        })
        .collect()
}

/// Tab-separated rows under a header line
pub fn to_tsv(pairs: &[AlignedPair]) -> String {
    let mut output = String::from(TSV_HEADER);
    output.push('\n');

    for pair in pairs {
        output.push_str(&format!(
            "{}\t{}\t{:.1}\t{}\t{}\n",
            format_timestamp(pair.start),
            format_timestamp(pair.end),
            pair.confidence,
            tsv_field(&pair.source_text),
            tsv_field(&pair.target_text)
        ));
    }

    output
}

fn tsv_field(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}
