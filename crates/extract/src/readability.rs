//! Flesch reading ease, computed natively: 206.835 − 1.015 × (words /
//! sentences) − 84.6 × (syllables / words). Syllables use a vowel-group
//! heuristic with a silent-e adjustment; close enough for ranking prose.

fn count_syllables(word: &str) -> usize {
    let letters: String = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if letters.is_empty() {
        return 0;
    }

    let mut syllables = 0;
    let mut in_vowel_group = false;
    for c in letters.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !in_vowel_group {
            syllables += 1;
        }
        in_vowel_group = is_vowel;
    }

    if letters.ends_with('e') && !letters.ends_with("le") && syllables > 1 {
        syllables -= 1;
    }

    syllables.max(1)
}

pub fn flesch_reading_ease(text: &str) -> Option<f64> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let sentences = text
        .split(|c| matches!(c, '.' | '!' | '?'))
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let word_count = words.len() as f64;
    Some(
        206.835
            - 1.015 * (word_count / sentences as f64)
            - 84.6 * (syllables as f64 / word_count),
    )
}
