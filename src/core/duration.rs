use regex::Regex;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("valid duration regex")
});

/// Converts a `PT#H#M#S` duration (as reported in `contentDetails.duration`)
/// into seconds. Returns `None` when the value does not start with `PT`.
pub fn parse_iso_duration(raw: &str) -> Option<u64> {
    let captures = ISO_DURATION.captures(raw)?;

    let component = |idx: usize| -> Option<u64> {
        match captures.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };

    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
