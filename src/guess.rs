//! Guessing stream properties from free-text track titles.
//!
//! Track titles such as `"Brazilian Portuguese (SDH)"` or
//! `"Director's Commentary"` carry information the language fields don't.

use std::sync::LazyLock;

use regex::Regex;

use crate::language::Language;

static COMMENTARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcomm?entar(?:y|ies|io|e)\b").unwrap());

static HEARING_IMPAIRED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsdh\b|hearing[\s-]*impaired|\bdeaf\b|\bhoh\b").unwrap()
});

static CLOSED_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcc\b|closed[\s-]*captions?").unwrap());

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").unwrap());

/// Regional qualifiers found in titles.
struct RegionHint {
    pattern: Regex,
    alpha3: &'static str,
    country: Option<&'static str>,
    script: Option<&'static str>,
    /// Whether the hint names the language on its own ("Brazilian").
    standalone: bool,
}

static REGION_HINTS: LazyLock<Vec<RegionHint>> = LazyLock::new(|| {
    let hint = |pattern: &str, alpha3, country, script, standalone| RegionHint {
        pattern: Regex::new(pattern).unwrap(),
        alpha3,
        country,
        script,
        standalone,
    };
    vec![
        hint(r"(?i)\bbrazil(?:ian)?\b|\bpt[-_]br\b", "por", Some("BR"), None, true),
        hint(r"(?i)\bportugal\b|\beuropean\b|\bpt[-_]pt\b", "por", Some("PT"), None, false),
        hint(r"(?i)\blatin[\s-]*america(?:n)?\b|\blatino\b|\blatam\b|\bes[-_]419\b", "spa", Some("419"), None, true),
        hint(r"(?i)\bcastilian\b|\bcastellano\b|\bspain\b|\bes[-_]es\b", "spa", Some("ES"), None, true),
        hint(r"(?i)\bcanadian\b|\bqu[eé]b[eé]c(?:ois)?\b|\bfr[-_]ca\b", "fra", Some("CA"), None, false),
        hint(r"(?i)\bflemish\b", "nld", Some("BE"), None, true),
        hint(r"(?i)\bsimplified\b", "zho", None, Some("Hans"), false),
        hint(r"(?i)\btraditional\b", "zho", None, Some("Hant"), false),
    ]
});

/// Properties guessed from a stream title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guess {
    pub language: Option<Language>,
    pub commentary: bool,
    pub hearing_impaired: bool,
    pub closed_caption: bool,
}

/// Guess language and flags from a track title.
///
/// `expected` is the language Plex reported, if it reported exactly one; it
/// lets ambiguous region words ("European", "Simplified") refine it.
pub fn guess(title: &str, expected: Option<&Language>) -> Guess {
    let named = WORD
        .find_iter(title)
        .filter(|word| word.as_str().len() > 3)
        .find_map(|word| Language::from_name(word.as_str()))
        .filter(|language| !language.is_undetermined());

    let base = named.clone().or_else(|| expected.cloned());
    let hint = REGION_HINTS.iter().find(|hint| {
        hint.pattern.is_match(title)
            && (hint.standalone || base.as_ref().is_some_and(|l| l.alpha3() == hint.alpha3))
    });

    let language = match hint {
        Some(hint) => {
            let mut language = Language::from_code(hint.alpha3);
            if let Some(country) = hint.country {
                language = language.map(|l| l.with_country(country));
            }
            if let Some(script) = hint.script {
                language = language.map(|l| l.with_script(script));
            }
            language
        }
        None => named,
    };

    Guess {
        language,
        commentary: COMMENTARY.is_match(title),
        hearing_impaired: HEARING_IMPAIRED.is_match(title),
        closed_caption: CLOSED_CAPTION.is_match(title),
    }
}

/// Pick the most descriptive title out of Plex's three title fields.
///
/// The longest one wins; on a tie the earlier field wins.
pub fn best_title<'a>(candidates: [Option<&'a str>; 3]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .fold(None, |best: Option<&str>, t| match best {
            Some(b) if b.len() >= t.len() => Some(b),
            _ => Some(t),
        })
}

/// Parse every language field and keep only the most specific results.
pub fn expected_languages(fields: &[Option<&str>]) -> Vec<Language> {
    let mut languages: Vec<Language> = Vec::new();
    for value in fields.iter().flatten() {
        if let Some(language) = Language::parse_any(value) {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
    }

    let max = languages.iter().map(Language::specificity).max().unwrap_or(0);
    languages.retain(|l| l.specificity() == max);
    languages
}

/// Decide a stream's language from its reported fields and a title guess.
///
/// A guess only replaces a single reported language when it is not a vaguer
/// form of it; "Portuguese" in the title must not erase a `pt-BR` tag.
pub fn resolve_language(expected: &[Language], guessed: Option<&Language>) -> Language {
    match expected {
        [only] => match guessed {
            Some(g) if !(g.same_base(only) && g.specificity() < only.specificity()) => g.clone(),
            _ => only.clone(),
        },
        [first, ..] => first.clone(),
        [] => guessed.cloned().unwrap_or_else(Language::undetermined),
    }
}
