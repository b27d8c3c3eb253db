//! Edit-distance scoring between an OCR line and a table key.
//!
//! Comparison is case-insensitive. When the line is at least as long as the
//! key, the key may sit anywhere inside it and the surrounding text costs
//! nothing; a shorter line is compared whole, so every missing character
//! counts. Both cases divide by the key length, which gives a distance in
//! [0, 1] after clamping.

/// A lowercased match key, kept as chars for the alignment tables
#[derive(Debug, Clone)]
pub struct FuzzyKey {
    text: String,
    chars: Vec<char>,
}

impl FuzzyKey {
    pub fn new(key: &str) -> Self {
        let text = key.to_lowercase();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Normalized distance in [0, 1]; 0 is an exact (sub)match
pub fn distance(line: &FuzzyKey, key: &FuzzyKey) -> f64 {
    if key.is_empty() {
        return if line.is_empty() { 0.0 } else { 1.0 };
    }
    let edits = if line.len() >= key.len() {
        substring_edits(&key.chars, &line.chars)
    } else {
        strsim::levenshtein(line.as_str(), key.as_str())
    };
    (edits as f64 / key.len() as f64).min(1.0)
}

/// Similarity in [0, 1], `1 - distance`
pub fn score(line: &FuzzyKey, key: &FuzzyKey) -> f64 {
    1.0 - distance(line, key)
}

/// Fewest edits turning `pattern` into some substring of `text`
/// (free leading and trailing text).
fn substring_edits(pattern: &[char], text: &[char]) -> usize {
    // prev[j]: edits for pattern[..i] ending at text[..j]
    let mut prev = vec![0usize; text.len() + 1];
    let mut cur = vec![0usize; text.len() + 1];

    for (i, &pc) in pattern.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &tc) in text.iter().enumerate() {
            let substitute = prev[j] + usize::from(pc != tc);
            let delete = prev[j + 1] + 1;
            let insert = cur[j] + 1;
            cur[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev.into_iter().min().unwrap_or(pattern.len())
}
