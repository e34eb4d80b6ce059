//! Phrase and fragment text normalization
//!
//! The matcher compares caller phrases against renderer fragment text, and
//! both sides carry typographic noise: curly quotes, Unicode dashes, soft
//! hyphens from line breaking, zero-width characters, and uneven whitespace.
//! Both sides are normalized identically before any comparison.
//!
//! Two folds are index-preserving by construction (one char in, one char
//! out) so match offsets survive them: the case fold used by the default
//! insensitive comparison, and the diacritic fold used only by the fallback
//! passes. The exact pass keeps diacritics.

/// Canonicalize text for matching
///
/// Curly quotes and Unicode dashes become their ASCII forms, soft hyphens
/// and zero-width characters are dropped, whitespace runs collapse to a
/// single space, and the result is trimmed.
pub fn canonicalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars() {
        let c = match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            '\u{00A0}' => ' ',
            // Soft hyphen and zero-width characters vanish entirely.
            '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => continue,
            other => other,
        };
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Lowercase a single character, index-preserving
///
/// Multi-character lowercase expansions (a handful of exotic cases) keep
/// their first character so offsets stay aligned.
pub fn fold_case(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_lowercase()
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

/// Strip the diacritic from a Latin character and lowercase it
///
/// Covers the Latin-1 Supplement and Latin Extended-A ranges that appear in
/// the documents this engine targets; anything else passes through the case
/// fold unchanged.
pub fn fold_char(c: char) -> char {
    let c = fold_case(c);
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Case-insensitive canonical equality, used for keyword deduplication
pub fn normalized_eq(a: &str, b: &str) -> bool {
    let a = canonicalize(a);
    let b = canonicalize(b);
    a.chars().map(fold_case).eq(b.chars().map(fold_case))
}

/// Check whether a canonicalized phrase is worth searching for
///
/// Phrases under three characters or without any alphanumeric content only
/// produce noise matches and are rejected up front.
pub fn is_searchable(normalized: &str) -> bool {
    normalized.chars().count() >= 3 && normalized.chars().any(|c| c.is_alphanumeric())
}

/// Check whether a phrase qualifies for the flexible-regex fallback
///
/// The fallback pattern only models word characters separated by
/// whitespace/hyphen runs, so phrases with other punctuation stay on the
/// exact pass.
pub fn is_flex_eligible(normalized: &str) -> bool {
    let mut alnum = 0usize;
    for c in normalized.chars() {
        if c.is_alphanumeric() {
            alnum += 1;
        } else if c != ' ' && c != '-' && c != '\'' {
            return false;
        }
    }
    alnum >= 3
}

/// Sentence terminator test for boundary expansion
pub fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ';')
}

/// Check whether text ends in two or more sentence terminators
///
/// Table cells never do; trailing prose sometimes does ("etc.." or "?!").
pub fn ends_with_multiple_terminators(text: &str) -> bool {
    text.chars()
        .rev()
        .take_while(|c| is_sentence_terminator(*c))
        .count()
        >= 2
}

/// Expand a character span outward to the enclosing sentence
///
/// Walks backward to the previous terminator (exclusive) and forward to the
/// next one (inclusive), trimming leading spaces. Used to grow a semantic
/// match into the sentence the narration is speaking.
pub fn sentence_bounds(chars: &[char], start: usize, end: usize) -> (usize, usize) {
    let mut s = start.min(chars.len());
    while s > 0 && !is_sentence_terminator(chars[s - 1]) {
        s -= 1;
    }
    while s < chars.len() && chars[s] == ' ' {
        s += 1;
    }

    let mut e = end.min(chars.len());
    while e < chars.len() && !is_sentence_terminator(chars[e]) {
        e += 1;
    }
    if e < chars.len() {
        e += 1; // Include the terminator
    }
    (s, e.max(s))
}

/// Split a character range into words with their sub-ranges
pub fn words_in_range(chars: &[char], start: usize, end: usize) -> Vec<(String, usize, usize)> {
    let mut words = Vec::new();
    let mut word_start = None;
    for i in start..end.min(chars.len()) {
        if chars[i] == ' ' {
            if let Some(ws) = word_start.take() {
                words.push((chars[ws..i].iter().collect(), ws, i));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(ws) = word_start {
        let e = end.min(chars.len());
        words.push((chars[ws..e].iter().collect(), ws, e));
    }
    words
}
