//! Cleanup of raw OCR lines before fuzzy matching.
//!
//! The rules target the failure modes Tesseract shows on relic cards
//! (icon glyphs read as punctuation, `l`/`I`/`|` confusion, digits standing in
//! for letters, spaces dropped into words). They are applied in a fixed order
//! because later rules depend on the output of earlier ones.

use regex::Regex;
use std::sync::LazyLock;

pub use relic_data::normalize_name;

static LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^a-zA-Z]{1,4}").expect("static regex"));
static PIPE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|lI]{2,}").expect("static regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Whole-word fixes, applied top to bottom
static CORRECTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bI-IP\b", "HP"),
        (r"(?i)\bI-{1,2}P\b", "HP"),
        // "IIP" reaches this point as "IlP" after the pipe-run rule
        (r"(?i)\bI[il]+P\b", "HP"),
        (r"\b[oO0]wn\b", "own"),
        (r"(?i)\batt ack\b", "attack"),
        (r"(?i)\bdam age\b", "damage"),
        (r"(?i)\bres tores?\b", "restore"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex"), replacement))
    .collect()
});

/// Clean one raw OCR line.
///
/// The rule chain is re-run until the line stops changing, so
/// `clean_line(clean_line(s)) == clean_line(s)` holds even when one rule
/// exposes work for an earlier one (e.g. bracket removal making a `0`
/// adjacent to a letter, or a long leader of dots needing several rounds of
/// junk stripping). A pass that changes the line either shortens it, swaps a
/// digit or pipe for a letter, or settles an `l`/`I` run into `Il`, so the
/// loop ends.
pub fn clean_line(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(line: &str) -> String {
    // 1. Icon glyphs in front of the effect text
    let s = LEADING_JUNK.replace(line, "");

    // 2. Runs of |, l and I collapse to "Il"; a lone pipe is an I
    let s = PIPE_RUN.replace_all(&s, |caps: &regex::Captures| {
        let len = caps[0].chars().count();
        "Il".chars().take(len).collect::<String>()
    });
    let s = s.replace('|', "I");

    // 3. Digits sitting next to letters
    let s = replace_next_to_letter(&s, '0', 'O');
    let s = replace_next_to_letter(&s, '1', 'l');

    // 4. Domain corrections
    let mut s = s;
    for (pattern, replacement) in CORRECTIONS.iter() {
        s = pattern.replace_all(&s, *replacement).into_owned();
    }

    // 5. Brackets, non-printable bytes, whitespace
    let s: String = s
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
        .filter(|c| (' '..='~').contains(c))
        .collect();
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

/// Replace `from` with `to` wherever an ASCII letter sits on either side.
/// Neighbors are read from the input, so a run like "00a" changes only the
/// digit touching the letter.
fn replace_next_to_letter(s: &str, from: char, to: char) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if c != from {
                return c;
            }
            let before = i > 0 && chars[i - 1].is_ascii_alphabetic();
            let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic());
            if before || after {
                to
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_icon_glyphs() {
        assert_eq!(clean_line("@ Attack Power +5"), "Attack Power +5");
        assert_eq!(clean_line("»» Improved Guard"), "Improved Guard");
        assert_eq!(clean_line("Attack Power"), "Attack Power");
    }

    #[test]
    fn test_pipe_runs() {
        assert_eq!(clean_line("Ski|| Cooldown"), "SkiIl Cooldown");
        assert_eq!(clean_line("Max |ncrease"), "Max Increase");
    }

    #[test]
    fn test_digit_letter_confusion() {
        assert_eq!(clean_line("P0ison Resist"), "POison Resist");
        assert_eq!(clean_line("Ho1y Damage"), "Holy Damage");
        assert_eq!(clean_line("Attack Power +10"), "Attack Power +10");
        assert_eq!(clean_line("Lv1 Weapon"), "Lvl Weapon");
    }

    #[test]
    fn test_hp_corrections() {
        assert_eq!(clean_line("Max I-IP up"), "Max HP up");
        assert_eq!(clean_line("Max I-P up"), "Max HP up");
        assert_eq!(clean_line("Max IIP up"), "Max HP up");
        assert_eq!(clean_line("Max FP up"), "Max FP up");
    }

    #[test]
    fn test_split_word_corrections() {
        assert_eq!(clean_line("Improved att ack Power"), "Improved attack Power");
        assert_eq!(clean_line("Fire Dam age Negation"), "Fire damage Negation");
        assert_eq!(clean_line("Res tores HP"), "restore HP");
        assert_eq!(clean_line("Your 0wn Attack"), "Your own Attack");
    }

    #[test]
    fn test_brackets_and_whitespace() {
        assert_eq!(clean_line("  Holy   {Attack}  Power\t"), "Holy Attack Power");
        assert_eq!(clean_line("Magic [Damage] \u{00e9}up"), "Magic Damage up");
    }

    #[test]
    fn test_spacing_artifact_kept_for_matcher() {
        assert_eq!(clean_line("Attac k Power +5"), "Attac k Power +5");
    }

    #[test]
    fn test_clean_line_idempotent() {
        for raw in [
            "12345Attack",
            "a[0]b",
            "»» Improved Guard Counters +1",
            "|||| ||l Sk1ll 0wn",
            "~ Res tores 50 I-IP",
            "00a 1l|I 0",
            "",
            "   ",
            "\u{2022} Character\u{2019}s Skill Cooldown",
            "........................................",
            "---------------------------------------- 12 Attack Power",
        ] {
            let once = clean_line(raw);
            assert_eq!(clean_line(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_long_leader_fully_stripped() {
        assert_eq!(clean_line(&".".repeat(40)), "");
        assert_eq!(clean_line(&format!("{}Attack Power +5", ".".repeat(40))), "Attack Power +5");
        assert_eq!(clean_line(&format!("{} Max HP", "-".repeat(100))), "Max HP");
    }

    #[test]
    fn test_replace_next_to_letter_uses_original_neighbors() {
        assert_eq!(replace_next_to_letter("00a", '0', 'O'), "0Oa");
        assert_eq!(replace_next_to_letter("a0 1", '0', 'O'), "aO 1");
    }
}
