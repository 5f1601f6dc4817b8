//! ISBN parsing, validation, and ISBN-10 → ISBN-13 canonicalization.
//!
//! Used by the cache key factory (§4.4, hyphen-stripping + lowercasing),
//! the edition model's ISBN set (I-2: no two elements may canonicalize to
//! the same number), and the `/v1/search/isbn` entry validation (S-2).

/// Strip hyphens/whitespace and uppercase the trailing check character.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Is `raw` a syntactically valid ISBN-10 or ISBN-13 (checksum included)?
pub fn is_valid(raw: &str) -> bool {
    let normalized = normalize(raw);
    match normalized.len() {
        10 => is_valid_isbn10(&normalized),
        13 => is_valid_isbn13(&normalized),
        _ => false,
    }
}

fn is_valid_isbn10(isbn: &str) -> bool {
    let chars: Vec<char> = isbn.chars().collect();
    if chars[..9].iter().any(|c| !c.is_ascii_digit()) {
        return false;
    }
    let last = chars[9];
    if !last.is_ascii_digit() && last != 'X' {
        return false;
    }
    let mut sum: u32 = 0;
    for (i, c) in chars[..9].iter().enumerate() {
        sum += (10 - i as u32) * c.to_digit(10).unwrap();
    }
    sum += if last == 'X' { 10 } else { last.to_digit(10).unwrap() };
    sum % 11 == 0
}

fn is_valid_isbn13(isbn: &str) -> bool {
    if !isbn.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = isbn.chars().map(|c| c.to_digit(10).unwrap()).collect();
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    sum % 10 == 0
}

/// Canonicalize an ISBN to its ISBN-13 form. ISBN-13 input is returned
/// normalized (hyphens stripped); ISBN-10 is converted per the standard
/// 978-prefix + recomputed check digit algorithm. Invalid input is returned
/// normalized but unconverted — callers that need validity should call
/// [`is_valid`] first.
pub fn canonicalize(raw: &str) -> String {
    let normalized = normalize(raw);
    if normalized.len() != 10 || !is_valid_isbn10(&normalized) {
        return normalized;
    }
    let core_digits = &normalized[..9];
    let with_prefix = format!("978{}", core_digits);
    let digits: Vec<u32> = with_prefix.chars().map(|c| c.to_digit(10).unwrap()).collect();
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    let check = (10 - (sum % 10)) % 10;
    format!("{}{}", with_prefix, check)
}
