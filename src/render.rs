use crate::core::VideoRecord;
use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Cuts `text` so it occupies at most `width` terminal columns.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

/// Left-aligns `text` in a column of `width` terminal cells.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let cut = truncate_to_width(text, width);
    let fill = width.saturating_sub(cut.width());
    format!("{cut}{}", " ".repeat(fill))
}

pub fn seconds_label(seconds: Option<u64>) -> String {
    seconds.map_or_else(|| "-".to_string(), |s| s.to_string())
}

pub fn published_label(video: &VideoRecord) -> String {
    video.published_at.format("%Y-%m-%d").to_string()
}

pub fn results_header() -> String {
    format!(
        "{} {} {} {:>12} {:>10} {}",
        pad_to_width("Title", 48),
        pad_to_width("Published At", 20),
        pad_to_width("Duration", 10),
        "Views",
        "Likes",
        "Caption"
    )
}

pub fn results_row(video: &VideoRecord) -> String {
    format!(
        "{} {} {} {:>12} {:>10} {}",
        pad_to_width(&video.title, 48),
        pad_to_width(&video.published_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(), 20),
        pad_to_width(&video.duration, 10),
        video.views,
        video.likes,
        if video.caption { "☑" } else { "☐" }
    )
}

/// Text lines of one video card.
pub fn card_lines(video: &VideoRecord, now: DateTime<Utc>) -> Vec<String> {
    vec![
        video.title.clone(),
        video.link(),
        format!(
            "Published At {} ({} days ago)",
            published_label(video),
            video.days_since_publish(now)
        ),
        format!(
            "Views {}   Likes {}   Duration (sec) {}",
            video.views,
            video.likes,
            seconds_label(video.seconds)
        ),
        format!("Thumbnail {}", video.thumbnail),
    ]
}

pub fn wrap_text(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                textwrap::fill(line, width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::search::tests::record;
    use chrono::TimeZone;

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // Each CJK character is two columns wide.
        assert_eq!(truncate_to_width("東京大学ランキング", 7), "東京大…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn padding_fills_the_column() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("東京", 6).width(), 6);
    }

    #[test]
    fn card_shows_metrics() {
        let video = record("xyz", 1234, true, 1);
        let now = Utc.with_ymd_and_hms(2024, 9, 4, 12, 0, 0).unwrap();
        let lines = card_lines(&video, now);

        assert_eq!(lines[1], "https://www.youtube.com/watch?v=xyz");
        assert_eq!(lines[2], "Published At 2024-09-01 (3 days ago)");
        assert_eq!(lines[3], "Views 1234   Likes 123   Duration (sec) 60");
    }

    #[test]
    fn unknown_duration_is_a_dash() {
        assert_eq!(seconds_label(None), "-");
        assert_eq!(seconds_label(Some(1691)), "1691");
    }

    #[test]
    fn wrapping_keeps_blank_lines() {
        let wrapped = wrap_text("one two three\n\nfour", 7);
        assert_eq!(wrapped, "one two\nthree\n\nfour");
    }
}
