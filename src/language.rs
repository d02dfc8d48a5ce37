//! Language tags for audio and subtitle streams.
//!
//! Plex reports a stream's language three ways: an ISO 639-2 code
//! (`languageCode`, often the bibliographic variant such as `fre`), an English
//! name (`language`) and an IETF tag (`languageTag`). [`Language`] normalizes
//! all of them to an ISO 639-3 base code plus optional script and country.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use crate::error::AppError;

/// Every ISO 639-1 language plus a few common ISO 639-3 ones, as
/// (alpha2, alpha3, bibliographic alpha3, English name).
const LANGUAGES: &[(&str, &str, &str, &str)] = &[
    ("", "und", "", "Undetermined"),
    ("aa", "aar", "", "Afar"),
    ("ab", "abk", "", "Abkhazian"),
    ("ae", "ave", "", "Avestan"),
    ("af", "afr", "", "Afrikaans"),
    ("ak", "aka", "", "Akan"),
    ("am", "amh", "", "Amharic"),
    ("an", "arg", "", "Aragonese"),
    ("ar", "ara", "", "Arabic"),
    ("as", "asm", "", "Assamese"),
    ("av", "ava", "", "Avaric"),
    ("ay", "aym", "", "Aymara"),
    ("az", "aze", "", "Azerbaijani"),
    ("ba", "bak", "", "Bashkir"),
    ("be", "bel", "", "Belarusian"),
    ("bg", "bul", "", "Bulgarian"),
    ("bi", "bis", "", "Bislama"),
    ("bm", "bam", "", "Bambara"),
    ("bn", "ben", "", "Bengali"),
    ("bo", "bod", "tib", "Tibetan"),
    ("br", "bre", "", "Breton"),
    ("bs", "bos", "", "Bosnian"),
    ("ca", "cat", "", "Catalan"),
    ("ce", "che", "", "Chechen"),
    ("ch", "cha", "", "Chamorro"),
    ("co", "cos", "", "Corsican"),
    ("cr", "cre", "", "Cree"),
    ("cs", "ces", "cze", "Czech"),
    ("cu", "chu", "", "Church Slavic"),
    ("cv", "chv", "", "Chuvash"),
    ("cy", "cym", "wel", "Welsh"),
    ("da", "dan", "", "Danish"),
    ("de", "deu", "ger", "German"),
    ("dv", "div", "", "Dhivehi"),
    ("dz", "dzo", "", "Dzongkha"),
    ("ee", "ewe", "", "Ewe"),
    ("el", "ell", "gre", "Greek"),
    ("en", "eng", "", "English"),
    ("eo", "epo", "", "Esperanto"),
    ("es", "spa", "", "Spanish"),
    ("et", "est", "", "Estonian"),
    ("eu", "eus", "baq", "Basque"),
    ("fa", "fas", "per", "Persian"),
    ("ff", "ful", "", "Fulah"),
    ("fi", "fin", "", "Finnish"),
    ("fj", "fij", "", "Fijian"),
    ("fo", "fao", "", "Faroese"),
    ("fr", "fra", "fre", "French"),
    ("fy", "fry", "", "Western Frisian"),
    ("ga", "gle", "", "Irish"),
    ("gd", "gla", "", "Scottish Gaelic"),
    ("gl", "glg", "", "Galician"),
    ("gn", "grn", "", "Guarani"),
    ("gu", "guj", "", "Gujarati"),
    ("gv", "glv", "", "Manx"),
    ("ha", "hau", "", "Hausa"),
    ("he", "heb", "", "Hebrew"),
    ("hi", "hin", "", "Hindi"),
    ("ho", "hmo", "", "Hiri Motu"),
    ("hr", "hrv", "", "Croatian"),
    ("ht", "hat", "", "Haitian"),
    ("hu", "hun", "", "Hungarian"),
    ("hy", "hye", "arm", "Armenian"),
    ("hz", "her", "", "Herero"),
    ("ia", "ina", "", "Interlingua"),
    ("id", "ind", "", "Indonesian"),
    ("ie", "ile", "", "Interlingue"),
    ("ig", "ibo", "", "Igbo"),
    ("ii", "iii", "", "Sichuan Yi"),
    ("ik", "ipk", "", "Inupiaq"),
    ("io", "ido", "", "Ido"),
    ("is", "isl", "ice", "Icelandic"),
    ("it", "ita", "", "Italian"),
    ("iu", "iku", "", "Inuktitut"),
    ("ja", "jpn", "", "Japanese"),
    ("jv", "jav", "", "Javanese"),
    ("ka", "kat", "geo", "Georgian"),
    ("kg", "kon", "", "Kongo"),
    ("ki", "kik", "", "Kikuyu"),
    ("kj", "kua", "", "Kuanyama"),
    ("kk", "kaz", "", "Kazakh"),
    ("kl", "kal", "", "Kalaallisut"),
    ("km", "khm", "", "Khmer"),
    ("kn", "kan", "", "Kannada"),
    ("ko", "kor", "", "Korean"),
    ("kr", "kau", "", "Kanuri"),
    ("ks", "kas", "", "Kashmiri"),
    ("ku", "kur", "", "Kurdish"),
    ("kv", "kom", "", "Komi"),
    ("kw", "cor", "", "Cornish"),
    ("ky", "kir", "", "Kirghiz"),
    ("la", "lat", "", "Latin"),
    ("lb", "ltz", "", "Luxembourgish"),
    ("lg", "lug", "", "Ganda"),
    ("li", "lim", "", "Limburgish"),
    ("ln", "lin", "", "Lingala"),
    ("lo", "lao", "", "Lao"),
    ("lt", "lit", "", "Lithuanian"),
    ("lu", "lub", "", "Luba-Katanga"),
    ("lv", "lav", "", "Latvian"),
    ("mg", "mlg", "", "Malagasy"),
    ("mh", "mah", "", "Marshallese"),
    ("mi", "mri", "mao", "Maori"),
    ("mk", "mkd", "mac", "Macedonian"),
    ("ml", "mal", "", "Malayalam"),
    ("mn", "mon", "", "Mongolian"),
    ("mr", "mar", "", "Marathi"),
    ("ms", "msa", "may", "Malay"),
    ("mt", "mlt", "", "Maltese"),
    ("my", "mya", "bur", "Burmese"),
    ("na", "nau", "", "Nauru"),
    ("nb", "nob", "", "Norwegian Bokmal"),
    ("nd", "nde", "", "North Ndebele"),
    ("ne", "nep", "", "Nepali"),
    ("ng", "ndo", "", "Ndonga"),
    ("nl", "nld", "dut", "Dutch"),
    ("nn", "nno", "", "Norwegian Nynorsk"),
    ("no", "nor", "", "Norwegian"),
    ("nr", "nbl", "", "South Ndebele"),
    ("nv", "nav", "", "Navajo"),
    ("ny", "nya", "", "Nyanja"),
    ("oc", "oci", "", "Occitan"),
    ("oj", "oji", "", "Ojibwa"),
    ("om", "orm", "", "Oromo"),
    ("or", "ori", "", "Oriya"),
    ("os", "oss", "", "Ossetian"),
    ("pa", "pan", "", "Punjabi"),
    ("pi", "pli", "", "Pali"),
    ("pl", "pol", "", "Polish"),
    ("ps", "pus", "", "Pashto"),
    ("pt", "por", "", "Portuguese"),
    ("qu", "que", "", "Quechua"),
    ("rm", "roh", "", "Romansh"),
    ("rn", "run", "", "Rundi"),
    ("ro", "ron", "rum", "Romanian"),
    ("ru", "rus", "", "Russian"),
    ("rw", "kin", "", "Kinyarwanda"),
    ("sa", "san", "", "Sanskrit"),
    ("sc", "srd", "", "Sardinian"),
    ("sd", "snd", "", "Sindhi"),
    ("se", "sme", "", "Northern Sami"),
    ("sg", "sag", "", "Sango"),
    ("si", "sin", "", "Sinhala"),
    ("sk", "slk", "slo", "Slovak"),
    ("sl", "slv", "", "Slovenian"),
    ("sm", "smo", "", "Samoan"),
    ("sn", "sna", "", "Shona"),
    ("so", "som", "", "Somali"),
    ("sq", "sqi", "alb", "Albanian"),
    ("sr", "srp", "", "Serbian"),
    ("ss", "ssw", "", "Swati"),
    ("st", "sot", "", "Southern Sotho"),
    ("su", "sun", "", "Sundanese"),
    ("sv", "swe", "", "Swedish"),
    ("sw", "swa", "", "Swahili"),
    ("ta", "tam", "", "Tamil"),
    ("te", "tel", "", "Telugu"),
    ("tg", "tgk", "", "Tajik"),
    ("th", "tha", "", "Thai"),
    ("ti", "tir", "", "Tigrinya"),
    ("tk", "tuk", "", "Turkmen"),
    ("tl", "tgl", "", "Tagalog"),
    ("tn", "tsn", "", "Tswana"),
    ("to", "ton", "", "Tonga"),
    ("tr", "tur", "", "Turkish"),
    ("ts", "tso", "", "Tsonga"),
    ("tt", "tat", "", "Tatar"),
    ("tw", "twi", "", "Twi"),
    ("ty", "tah", "", "Tahitian"),
    ("ug", "uig", "", "Uighur"),
    ("uk", "ukr", "", "Ukrainian"),
    ("ur", "urd", "", "Urdu"),
    ("uz", "uzb", "", "Uzbek"),
    ("ve", "ven", "", "Venda"),
    ("vi", "vie", "", "Vietnamese"),
    ("vo", "vol", "", "Volapuk"),
    ("wa", "wln", "", "Walloon"),
    ("wo", "wol", "", "Wolof"),
    ("xh", "xho", "", "Xhosa"),
    ("yi", "yid", "", "Yiddish"),
    ("yo", "yor", "", "Yoruba"),
    ("za", "zha", "", "Zhuang"),
    ("zh", "zho", "chi", "Chinese"),
    ("zu", "zul", "", "Zulu"),
    ("", "yue", "", "Cantonese"),
    ("", "fil", "", "Filipino"),
    ("", "haw", "", "Hawaiian"),
];

type Entry = (&'static str, &'static str, &'static str, &'static str);

fn by_code(code: &str) -> Option<&'static Entry> {
    let code = code.to_ascii_lowercase();
    LANGUAGES.iter().find(|(alpha2, alpha3, alpha3b, _)| {
        (!alpha2.is_empty() && *alpha2 == code) || *alpha3 == code || (!alpha3b.is_empty() && *alpha3b == code)
    })
}

fn by_name(name: &str) -> Option<&'static Entry> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .find(|(_, _, _, english)| english.eq_ignore_ascii_case(name))
}

/// A language with optional script and country, e.g. `pt-BR` or `zh-Hant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    alpha3: &'static str,
    script: Option<String>,
    country: Option<String>,
}

impl Language {
    /// The undetermined language (`und`).
    pub fn undetermined() -> Self {
        Self {
            alpha3: "und",
            script: None,
            country: None,
        }
    }

    /// Look up a language by ISO 639-1, ISO 639-2/T or ISO 639-2/B code.
    pub fn from_code(code: &str) -> Option<Self> {
        by_code(code).map(|entry| Self {
            alpha3: entry.1,
            script: None,
            country: None,
        })
    }

    /// Look up a language by its English name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        by_name(name).map(|entry| Self {
            alpha3: entry.1,
            script: None,
            country: None,
        })
    }

    /// Parse an IETF tag such as `en`, `pt-BR`, `zh-Hant` or `sr-Latn-RS`.
    pub fn from_ietf(tag: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidInput(format!("'{}' is not a valid language", tag));

        let mut subtags = tag.trim().split(['-', '_']);
        let base = subtags.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if !(2..=3).contains(&base.len()) || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut language = Self::from_code(base).ok_or_else(invalid)?;
        for subtag in subtags {
            let is_alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
            let is_digit = subtag.chars().all(|c| c.is_ascii_digit());
            match subtag.len() {
                4 if is_alpha && language.script.is_none() && language.country.is_none() => {
                    let mut script = subtag.to_ascii_lowercase();
                    script[..1].make_ascii_uppercase();
                    language.script = Some(script);
                }
                2 if is_alpha && language.country.is_none() => {
                    language.country = Some(subtag.to_ascii_uppercase());
                }
                3 if is_digit && language.country.is_none() => {
                    language.country = Some(subtag.to_string());
                }
                _ => return Err(invalid()),
            }
        }

        Ok(language)
    }

    /// Parse whatever Plex put in a language field: IETF tag first, then
    /// English name.
    pub fn parse_any(value: &str) -> Option<Self> {
        Self::from_ietf(value)
            .ok()
            .or_else(|| Self::from_name(value))
    }

    /// Build a copy with the given country.
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_ascii_uppercase());
        self
    }

    /// Build a copy with the given script.
    pub fn with_script(mut self, script: &str) -> Self {
        self.script = Some(script.to_string());
        self
    }

    pub fn alpha3(&self) -> &'static str {
        self.alpha3
    }

    pub fn alpha2(&self) -> Option<&'static str> {
        by_code(self.alpha3)
            .map(|entry| entry.0)
            .filter(|alpha2| !alpha2.is_empty())
    }

    pub fn name(&self) -> &'static str {
        by_code(self.alpha3).map(|entry| entry.3).unwrap_or("Unknown")
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn is_undetermined(&self) -> bool {
        self.alpha3 == "und"
    }

    /// Number of subtags; `pt-BR` is more specific than `pt`.
    pub fn specificity(&self) -> usize {
        1 + usize::from(self.script.is_some()) + usize::from(self.country.is_some())
    }

    /// Same base language, regardless of script or region.
    pub fn same_base(&self, other: &Language) -> bool {
        !self.is_undetermined() && self.alpha3 == other.alpha3
    }

    /// How far `self` is from `target` within the same base language.
    ///
    /// 0 is an exact match, 1 shares the country, 2 has no region on one side,
    /// 3 is some other regional variant. Different base languages are 4.
    pub fn distance(&self, target: &Language) -> u8 {
        if self == target {
            0
        } else if !self.same_base(target) {
            4
        } else if self.country == target.country {
            1
        } else if self.country.is_none() || target.country.is_none() {
            2
        } else {
            3
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alpha2().unwrap_or(self.alpha3))?;
        if let Some(script) = &self.script {
            write!(f, "-{}", script)?;
        }
        if let Some(country) = &self.country {
            write!(f, "-{}", country)?;
        }
        Ok(())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ietf(s)
    }
}

impl TryFrom<String> for Language {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_ietf(&value)
    }
}

// `alpha3` points into the static table; deserialize through an owned tag.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::from_ietf(&tag).map_err(de::Error::custom)
    }
}
