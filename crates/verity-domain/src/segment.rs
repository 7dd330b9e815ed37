//! Sentence segmentation for content items and source documents

/// Tokens that end with a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "inc", "ltd", "co", "corp", "vs",
    "gen", "gov", "sen", "rep", "lt", "col", "sgt", "capt", "no", "fig", "approx", "jan", "feb",
    "aug", "sept", "sep", "oct", "nov", "dec",
];

const TERMINATORS: [char; 3] = ['.', '?', '!'];

const CLOSERS: [char; 6] = ['"', '\'', ')', ']', '\u{201D}', '\u{2019}'];

/// Split text into sentences
///
/// Line breaks always end a sentence. Within a line, a sentence ends at `.`,
/// `?` or `!` (plus any closing quotes or brackets) when followed by
/// whitespace and a token that can start a sentence. Periods after common
/// abbreviations, initials and dotted acronyms do not split.
///
/// # Examples
///
/// ```
/// use verity_domain::split_sentences;
///
/// let sentences = split_sentences("Dr. Jones arrived at 9 a.m. sharp. She left at noon!");
/// assert_eq!(sentences, vec!["Dr. Jones arrived at 9 a.m. sharp.", "She left at noon!"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if !line.is_empty() {
            split_line(line, &mut sentences);
        }
    }

    sentences
}

fn split_line(line: &str, out: &mut Vec<String>) {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !TERMINATORS.contains(&c) {
            i += 1;
            continue;
        }

        // Absorb "?!", "..." and closing quotes into the current sentence
        let mut j = i + 1;
        while j < chars.len() && (TERMINATORS.contains(&chars[j].1) || CLOSERS.contains(&chars[j].1)) {
            j += 1;
        }

        let boundary = if j >= chars.len() {
            true
        } else {
            chars[j].1.is_whitespace()
                && starts_sentence(&chars[j..])
                && !(c == '.' && ends_with_abbreviation(&line[start..pos]))
        };

        if boundary {
            let end = chars.get(j).map_or(line.len(), |(p, _)| *p);
            push_trimmed(out, &line[start..end]);
            start = end;
        }
        i = j;
    }

    if start < line.len() {
        push_trimmed(out, &line[start..]);
    }
}

fn starts_sentence(rest: &[(usize, char)]) -> bool {
    match rest.iter().map(|(_, c)| *c).find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => {
            c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{2018}')
        }
    }
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let Some(word) = segment.split_whitespace().last() else {
        return false;
    };
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());

    // Initials ("J.") and dotted acronyms ("U.S", "a.m")
    let is_initial = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
    if is_initial || word.contains('.') {
        return true;
    }

    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

fn push_trimmed(out: &mut Vec<String>, sentence: &str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sentence_without_terminator() {
        assert_eq!(
            split_sentences("Apple Inc. released the iPhone 15 on September 22, 2023"),
            vec!["Apple Inc. released the iPhone 15 on September 22, 2023"]
        );
    }

    #[test]
    fn test_basic_split() {
        let sentences = split_sentences("The sky is blue. Grass is green? Water is wet!");
        assert_eq!(sentences, vec!["The sky is blue.", "Grass is green?", "Water is wet!"]);
    }

    #[test]
    fn test_lowercase_continuation_does_not_split() {
        let sentences = split_sentences("Prices rose 3.5 percent in 2022. economists were surprised.");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_abbreviations_and_acronyms() {
        let sentences = split_sentences("Mr. Smith moved to the U.S. Army base. It was 1998.");
        assert_eq!(sentences, vec!["Mr. Smith moved to the U.S. Army base.", "It was 1998."]);
    }

    #[test]
    fn test_initials_do_not_split() {
        let sentences = split_sentences("J. K. Rowling wrote it. Then it sold.");
        assert_eq!(sentences, vec!["J. K. Rowling wrote it.", "Then it sold."]);
    }

    #[test]
    fn test_single_digit_ends_sentence() {
        let sentences = split_sentences("Chapter 1. Then chapter 2.");
        assert_eq!(sentences, vec!["Chapter 1.", "Then chapter 2."]);
    }

    #[test]
    fn test_closing_quotes_stay_with_sentence() {
        let sentences = split_sentences("He said \"we won.\" Then he left.");
        assert_eq!(sentences, vec!["He said \"we won.\"", "Then he left."]);
    }

    #[test]
    fn test_line_breaks_split() {
        let sentences = split_sentences("First line\n\nSecond line\n  \nThird line.");
        assert_eq!(sentences, vec!["First line", "Second line", "Third line."]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\n ").is_empty());
    }

    #[test]
    fn test_ellipsis_and_mixed_terminators() {
        let sentences = split_sentences("Really?! Yes... Absolutely.");
        assert_eq!(sentences, vec!["Really?!", "Yes...", "Absolutely."]);
    }
}
