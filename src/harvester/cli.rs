//! Command-line surface
//!
//! Either a single keyword or a batch input file of keyword/reference-date
//! pairs. The adult-content filter is deliberately absent from this surface:
//! it is a compile-time invariant, not a user option.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bing_harvester",
    version,
    about = "Concurrent Bing image harvester with content-hash dedup and resumable sessions"
)]
pub struct Cli {
    /// Search keyword for a single-keyword run
    #[arg(long, conflicts_with = "batch_file")]
    pub keyword: Option<String>,

    /// Subject reference date (RFC 3339), e.g. 2006-02-17T00:00:00Z
    #[arg(long, default_value = "1970-01-01T00:00:00Z")]
    pub reference_date: String,

    /// Batch input file: one `keyword<TAB>reference-date` pair per line
    #[arg(long)]
    pub batch_file: Option<PathBuf>,

    /// Global cap on downloads per output directory
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of concurrent download slots
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output directory (batch mode adds one subdirectory per keyword)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Search-filter string forwarded to the backend (`qft` parameter)
    #[arg(long)]
    pub filter: Option<String>,

    /// Path to the TOML config file
    #[arg(long, default_value = "harvester.toml")]
    pub config: PathBuf,
}

/// Parse one batch-file line into `(keyword, reference_date)`.
///
/// The separator is a tab; lines without one are split at the last run of
/// whitespace so keywords may contain spaces. Blank lines and `#` comments
/// yield `None`.
pub fn parse_batch_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (keyword, date) = match line.split_once('\t') {
        Some((keyword, date)) => (keyword, date),
        None => line.rsplit_once(char::is_whitespace)?,
    };

    let keyword = keyword.trim();
    let date = date.trim();
    if keyword.is_empty() || date.is_empty() {
        return None;
    }
    Some((keyword.to_string(), date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_separated_line_parses() {
        assert_eq!(
            parse_batch_line("Jane Q Public\t2006-02-17T00:00:00Z"),
            Some((
                "Jane Q Public".to_string(),
                "2006-02-17T00:00:00Z".to_string()
            ))
        );
    }

    #[test]
    fn space_separated_line_splits_at_last_whitespace() {
        assert_eq!(
            parse_batch_line("Jane Q Public 2006-02-17T00:00:00Z"),
            Some((
                "Jane Q Public".to_string(),
                "2006-02-17T00:00:00Z".to_string()
            ))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_batch_line(""), None);
        assert_eq!(parse_batch_line("   "), None);
        assert_eq!(parse_batch_line("# a comment"), None);
    }

    #[test]
    fn lone_keyword_is_rejected() {
        assert_eq!(parse_batch_line("keyword-only"), None);
    }

    #[test]
    fn cli_parses_a_typical_invocation() {
        let cli = Cli::parse_from([
            "bing_harvester",
            "--keyword",
            "test person",
            "--limit",
            "50",
            "--concurrency",
            "10",
            "--output-dir",
            "./images",
        ]);
        assert_eq!(cli.keyword.as_deref(), Some("test person"));
        assert_eq!(cli.limit, Some(50));
        assert_eq!(cli.concurrency, Some(10));
    }
}
