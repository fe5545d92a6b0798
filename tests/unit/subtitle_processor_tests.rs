/*!
 * Tests for SRT parsing
 */

use anyhow::Result;
use chrono::NaiveTime;
use subalign::errors::SubtitleError;
use subalign::subtitle_processor::{parse_srt, parse_srt_file, Caption};
use crate::common;

fn t(h: u32, m: u32, s: u32, ms: u32) -> NaiveTime {
    NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap()
}

/// N well-formed blocks give N captions in order
#[test]
fn test_parse_srt_withValidBlocks_shouldKeepOrder() {
    let content: String = (1..=5)
        .map(|i| common::srt_block(i, &format!("00:00:0{},000", i), &format!("00:00:0{},500", i), &format!("Line {}", i)))
        .collect();

    let captions = parse_srt(&content).unwrap();
    assert_eq!(captions.len(), 5);
    for (i, caption) in captions.iter().enumerate() {
        assert_eq!(caption.index, (i + 1).to_string());
        assert_eq!(caption.text, format!("Line {}", i + 1));
        assert_eq!(caption.start, t(0, 0, i as u32 + 1, 0));
        assert_eq!(caption.end, t(0, 0, i as u32 + 1, 500));
    }
}

/// A two-line block among valid blocks is skipped silently
#[test]
fn test_parse_srt_withTwoLineBlock_shouldSkipIt() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 --> 00:00:04,000\n\n3\n00:00:05,000 --> 00:00:06,000\nThird\n";

    let captions = parse_srt(content).unwrap();
    let texts: Vec<&str> = captions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["First", "Third"]);
}

/// A three-line block without the arrow fails the whole track
#[test]
fn test_parse_srt_withMissingArrow_shouldFailWithBlockNumber() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 00:00:04,000\nSecond\n";

    let error = parse_srt(content).unwrap_err();
    let SubtitleError::InvalidTimestamp { block, line, .. } = error;
    assert_eq!(block, 2);
    assert_eq!(line, "00:00:03,000 00:00:04,000");
}

/// Malformed timestamps inside an arrowed timing line are fatal too
#[test]
fn test_parse_srt_withBadTimestamp_shouldFail() {
    assert!(parse_srt("1\n00:00:01 --> 00:00:02,000\nText\n").is_err());
    assert!(parse_srt("1\n00:00:01,00 --> 00:00:02,000\nText\n").is_err());
    assert!(parse_srt("1\naa:00:01,000 --> 00:00:02,000\nText\n").is_err());
}

/// Empty and whitespace-only tracks give no captions
#[test]
fn test_parse_srt_withEmptyTrack_shouldReturnEmpty() {
    assert!(parse_srt("").unwrap().is_empty());
    assert!(parse_srt("\n\n  \n").unwrap().is_empty());
}

/// Extra blank lines between blocks do not produce captions or errors
#[test]
fn test_parse_srt_withExtraBlankLines_shouldIgnoreThem() {
    let content = "\n\n1\n00:00:01,000 --> 00:00:02,000\nA\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n\n\n";
    assert_eq!(parse_srt(content).unwrap().len(), 2);
}

/// Separator lines holding only spaces or tabs still split blocks
#[test]
fn test_parse_srt_withWhitespaceSeparatorLines_shouldSplitBlocks() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nA\n \n2\n00:00:03,000 --> 00:00:04,000\nB\n\t\n  \n3\n00:00:05,000 --> 00:00:06,000\nC\n   ";

    let captions = parse_srt(content).unwrap();
    let texts: Vec<&str> = captions.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
    assert_eq!(captions[1].index, "2");
    assert_eq!(captions[2].format_start_time(), "00:00:05,000");
}

/// Block numbers in errors count real blocks, whatever the blank lines between them
#[test]
fn test_parse_srt_withWhitespaceSeparatorBeforeBadBlock_shouldReportBlockNumber() {
    let content = " \n1\n00:00:01,000 --> 00:00:02,000\nA\n \n \n2\n00:00:03,000 -> 00:00:04,000\nB\n";

    let SubtitleError::InvalidTimestamp { block, .. } = parse_srt(content).unwrap_err();
    assert_eq!(block, 2);
}

/// A byte-order mark before the first block is ignored
#[test]
fn test_parse_srt_withBom_shouldParseFirstBlock() {
    let content = "\u{feff}1\n00:00:01,000 --> 00:00:02,000\nHello\n";
    let captions = parse_srt(content).unwrap();
    assert_eq!(captions[0].index, "1");
}

/// Non-numeric index lines are kept as written
#[test]
fn test_parse_srt_withNonNumericIndex_shouldKeepIt() {
    let content = "intro\n00:00:01,000 --> 00:00:02,000\nHello\n";
    assert_eq!(parse_srt(content).unwrap()[0].index, "intro");
}

/// Index lines keep their surrounding spaces
#[test]
fn test_parse_srt_withPaddedIndex_shouldKeepItUnchanged() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n 2 \n00:00:03,000 --> 00:00:04,000\nB\n";
    let captions = parse_srt(content).unwrap();
    assert_eq!(captions[1].index, " 2 ");
}

/// Parsing an SRT file from disk
#[test]
fn test_parse_srt_file_withValidFile_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_TRACK)?;

    let captions = parse_srt_file(&path)?;
    assert_eq!(captions.len(), 3);
    assert_eq!(captions[1], Caption::new("2", t(0, 0, 5, 0), t(0, 0, 7, 0), "Where is Paris?"));
    Ok(())
}

/// Missing files are reported with their path
#[test]
fn test_parse_srt_file_withMissingFile_shouldFail() {
    let error = parse_srt_file("/nonexistent/movie.srt").unwrap_err();
    assert!(format!("{:#}", error).contains("movie.srt"));
}
