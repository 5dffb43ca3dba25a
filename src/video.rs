use crate::db::models::AnalysisRecord;
use once_cell::sync::Lazy;
use regex::Regex;

// Handles standard watch URLs, youtu.be short links, embed/v, shorts and
// live URLs, with or without extra query parameters. A video id is always
// exactly 11 characters.
static YOUTUBE_ID_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(
            r"(?:https?://)?(?:www\.)?youtube\.com/(?:watch\?v=|embed/|v/|shorts/|live/)([a-zA-Z0-9_-]{11})",
        )
        .unwrap(),
        Regex::new(r"(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]{11})").unwrap(),
    ]
});

pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|captures| captures[1].to_string())
}

/// Normalize any accepted YouTube URL form to the stable `watch?v=` key.
pub fn canonical_video_url(url: &str) -> Option<String> {
    extract_video_id(url).map(|id| format!("https://www.youtube.com/watch?v={}", id))
}

/// Title for the history list: the report's first `# ` heading, else its
/// first non-blank line.
pub fn extract_report_title(report: &str) -> String {
    let lines: Vec<&str> = report.lines().collect();
    if let Some(h1) = lines.iter().find(|line| line.trim().starts_with("# ")) {
        let h1 = h1.trim();
        return h1[2..].trim().to_string();
    }
    lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "Untitled Analysis".to_string())
}

/// Turn a completed model response into a history record. An empty or
/// all-whitespace report is a failure, never a blank success.
pub fn finalize_report(canonical_url: &str, report: &str) -> Result<AnalysisRecord, String> {
    if report.trim().is_empty() {
        return Err(
            "The model returned an empty analysis. This can happen if the video is private, age-restricted, or its content could not be processed."
                .to_string(),
        );
    }

    let now = chrono::Utc::now();
    Ok(AnalysisRecord {
        id: now.to_rfc3339(),
        video_url: canonical_url.to_string(),
        title: extract_report_title(report),
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        report: report.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_all_accepted_url_forms() {
        let expected = "https://www.youtube.com/watch?v=abc12345678";
        let inputs = [
            "https://youtu.be/abc12345678",
            "https://www.youtube.com/watch?v=abc12345678&t=5s",
            "https://www.youtube.com/shorts/abc12345678",
            "https://www.youtube.com/embed/abc12345678",
            "https://www.youtube.com/live/abc12345678",
            "youtube.com/watch?v=abc12345678",
        ];
        for input in inputs {
            assert_eq!(canonical_video_url(input).as_deref(), Some(expected), "{}", input);
        }
    }

    #[test]
    fn rejects_urls_without_an_eleven_char_id() {
        for input in [
            "https://www.youtube.com/watch?v=short",
            "https://example.com/watch?v=abc12345678",
            "not a url",
            "",
        ] {
            assert_eq!(canonical_video_url(input), None, "{}", input);
        }
    }

    #[test]
    fn title_comes_from_first_h1() {
        let report = "intro line\n# Market Outlook 2026\nbody";
        assert_eq!(extract_report_title(report), "Market Outlook 2026");
    }

    #[test]
    fn title_falls_back_to_first_non_blank_line() {
        let report = "\n\n  A report without a heading\nmore";
        assert_eq!(extract_report_title(report), "A report without a heading");
    }

    #[test]
    fn title_defaults_when_report_is_blank() {
        assert_eq!(extract_report_title("\n \n"), "Untitled Analysis");
    }

    #[test]
    fn empty_report_is_an_error_not_a_blank_record() {
        for report in ["", "   \n\t"] {
            let err = finalize_report("https://www.youtube.com/watch?v=abc12345678", report)
                .unwrap_err();
            assert!(err.contains("empty analysis"));
        }
    }

    #[test]
    fn finalize_builds_a_complete_record() {
        let record =
            finalize_report("https://www.youtube.com/watch?v=abc12345678", "# Title\nBody")
                .unwrap();
        assert_eq!(record.video_url, "https://www.youtube.com/watch?v=abc12345678");
        assert_eq!(record.title, "Title");
        assert_eq!(record.report, "# Title\nBody");
        assert!(!record.id.is_empty());
        assert!(!record.timestamp.is_empty());
    }
}
