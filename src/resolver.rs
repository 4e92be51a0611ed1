use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::books::{self, BookDefinition};

/// Scholarly abbreviations that end in a period without ending a sentence.
const GENERAL_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "dr", "prof", "rev", "st", "sts", "vs", "etc", "cf", "viz", "vol", "vols", "ch",
    "chap", "ver", "vv", "no", "fig", "ms", "mss", "op", "cit", "pp", "ib", "ibid", "ed", "lib",
];

/// Abbreviation words longer than this are ordinary words ("wisdom", "canticles")
/// and may legitimately end a sentence.
const MAX_ABBREVIATION_WORD_LEN: usize = 5;

/// Short alias words that are also everyday English and often end sentences.
const COMMON_WORDS: &[&str] = &["act", "bar", "let", "man", "pro", "songs", "three"];

/// How a book name is written at the citation site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BookForm {
    SaintPrefixed,
    FullName,
    Abbreviation,
}

impl BookForm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SaintPrefixed => "saint_prefixed",
            Self::FullName => "full_name",
            Self::Abbreviation => "abbreviation",
        }
    }
}

/// Exact-token alias lookup over the reference table.
///
/// Built once before scanning starts and shared read-only between workers.
#[derive(Debug)]
pub struct Resolver {
    aliases: HashMap<String, &'static BookDefinition>,
    full_names: Vec<String>,
    abbreviations: Vec<String>,
    abbreviation_words: HashSet<String>,
}

impl Resolver {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();
        let mut full_names = Vec::new();
        let mut abbreviations = Vec::new();

        for book in books::iter() {
            let full_name = book.name.to_lowercase();
            if aliases.insert(full_name.clone(), book).is_none() {
                full_names.push(full_name);
            }
            for alias in book.aliases {
                if aliases.contains_key(*alias) {
                    continue;
                }
                aliases.insert((*alias).to_string(), book);
                abbreviations.push((*alias).to_string());
            }
        }

        // Longest first so that alternations prefer "1 cor" over "co".
        full_names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        abbreviations.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let full_name_words: HashSet<&str> = full_names
            .iter()
            .filter_map(|name| name.split_whitespace().last())
            .collect();

        let mut abbreviation_words: HashSet<String> = GENERAL_ABBREVIATIONS
            .iter()
            .map(|word| (*word).to_string())
            .collect();
        for alias in &abbreviations {
            let Some(word) = alias.split_whitespace().last() else {
                continue;
            };
            if word.len() <= MAX_ABBREVIATION_WORD_LEN
                && word.chars().all(|ch| ch.is_ascii_alphabetic())
                && !full_name_words.contains(word)
                && !COMMON_WORDS.contains(&word)
            {
                abbreviation_words.insert(word.to_string());
            }
        }

        Self {
            aliases,
            full_names,
            abbreviations,
            abbreviation_words,
        }
    }

    /// Resolves a raw book token ("Rom.", "St. John", "1  Cor") to its book.
    pub fn resolve(&self, raw: &str) -> Option<&'static BookDefinition> {
        let normalized = normalize_book_token(raw);
        if normalized.is_empty() {
            return None;
        }
        self.aliases.get(&normalized).copied()
    }

    /// Aliases written in the given form, longest first. Saint-prefixed
    /// citations reuse every alias behind the prefix.
    pub fn aliases_for(&self, form: BookForm) -> Vec<&str> {
        match form {
            BookForm::FullName => self.full_names.iter().map(String::as_str).collect(),
            BookForm::Abbreviation => self.abbreviations.iter().map(String::as_str).collect(),
            BookForm::SaintPrefixed => {
                let mut all: Vec<&str> = self
                    .full_names
                    .iter()
                    .chain(self.abbreviations.iter())
                    .map(String::as_str)
                    .collect();
                all.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
                all
            }
        }
    }

    pub fn is_alias(&self, word: &str) -> bool {
        self.aliases.contains_key(&word.to_lowercase())
    }

    /// True when a period directly after `word` belongs to an abbreviation.
    pub fn is_abbreviation_word(&self, word: &str) -> bool {
        self.abbreviation_words.contains(&word.to_lowercase())
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

static SHARED: LazyLock<Resolver> = LazyLock::new(Resolver::new);

/// Process-wide resolver, built on first use.
pub fn shared() -> &'static Resolver {
    &SHARED
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-folds, drops periods, collapses whitespace and strips a leading
/// "St"/"St."/"Saint".
pub fn normalize_book_token(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('.', " ");
    let mut words: Vec<&str> = lowered.split_whitespace().collect();

    if words.len() > 1 && matches!(words[0], "st" | "saint") {
        words.remove(0);
    }

    words.join(" ")
}

/// Converts a Roman numeral chapter token to an integer.
///
/// Accepts canonical subtractive numerals, the purely additive forms of older
/// printing ("iiii", "xviiii") and a terminal `j` closing a run of `i`s
/// ("ij", "viij"). Returns `None` for anything else, including a bare `j`.
pub fn roman_to_int(token: &str) -> Option<u32> {
    let mut normalized = token.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized.len() > 15 {
        return None;
    }
    if normalized.ends_with("ij") {
        normalized.pop();
        normalized.push('i');
    }

    let values: Vec<u32> = normalized
        .chars()
        .map(roman_digit)
        .collect::<Option<Vec<_>>>()?;

    let mut total = 0;
    for (index, value) in values.iter().enumerate() {
        match values.get(index + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    let total = u32::try_from(total).ok().filter(|value| *value > 0)?;

    if int_to_roman(total) == normalized || is_additive_numeral(&normalized, &values) {
        Some(total)
    } else {
        None
    }
}

fn roman_digit(ch: char) -> Option<u32> {
    match ch {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    }
}

fn int_to_roman(mut value: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut out = String::new();
    for (amount, numeral) in TABLE {
        while value >= *amount {
            out.push_str(numeral);
            value -= amount;
        }
    }
    out
}

fn is_additive_numeral(normalized: &str, values: &[u32]) -> bool {
    if values.windows(2).any(|pair| pair[1] > pair[0]) {
        return false;
    }

    let mut run_char = '\0';
    let mut run_len = 0;
    for ch in normalized.chars() {
        if ch == run_char {
            run_len += 1;
        } else {
            run_char = ch;
            run_len = 1;
        }
        let limit = if matches!(ch, 'v' | 'l' | 'd') { 1 } else { 4 };
        if run_len > limit {
            return false;
        }
    }
    true
}
