use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)] // literal pattern
static YOU_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([Yy])(?:ou|OU)\b").expect("valid you regex"));
#[allow(clippy::expect_used)] // literal pattern
static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));
#[allow(clippy::expect_used)] // literal pattern
static SENTENCE_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(\s|$)").expect("valid sentence end regex"));

const EMOTICONS: [&str; 6] = ["(◕ᴥ◕)", "uwu", "owo", ">w<", "^w^", "(˘ω˘)"];

/// Stutter every n-th word
const STUTTER_EVERY: usize = 3;

/// Transform toggles, read fresh from config on every hotkey press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Insert emoticons after sentences
    pub smiley: bool,
    /// Replace "you" with "yu"
    pub yu: bool,
    /// Stutter the first letter of some words
    pub stutter: bool,
    /// Suppress the core r/l → w substitution
    pub nouwu: bool,
}

impl TransformOptions {
    /// Value of a single toggle
    #[must_use]
    pub const fn get(&self, toggle: TransformToggle) -> bool {
        match toggle {
            TransformToggle::Smiley => self.smiley,
            TransformToggle::Yu => self.yu,
            TransformToggle::Stutter => self.stutter,
            TransformToggle::NoUwu => self.nouwu,
        }
    }

    /// Set a single toggle
    pub fn set(&mut self, toggle: TransformToggle, value: bool) {
        match toggle {
            TransformToggle::Smiley => self.smiley = value,
            TransformToggle::Yu => self.yu = value,
            TransformToggle::Stutter => self.stutter = value,
            TransformToggle::NoUwu => self.nouwu = value,
        }
    }
}

/// Named transform toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformToggle {
    /// `smiley`
    Smiley,
    /// `yu`
    Yu,
    /// `stutter`
    Stutter,
    /// `nouwu`
    NoUwu,
}

impl TransformToggle {
    /// Config key of this toggle
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Smiley => "smiley",
            Self::Yu => "yu",
            Self::Stutter => "stutter",
            Self::NoUwu => "nouwu",
        }
    }
}

impl fmt::Display for TransformToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TransformToggle {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smiley" => Ok(Self::Smiley),
            "yu" => Ok(Self::Yu),
            "stutter" => Ok(Self::Stutter),
            "nouwu" => Ok(Self::NoUwu),
            other => Err(TransformError::UnknownToggle(other.to_owned())),
        }
    }
}

/// Transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    /// The transform could not process the text
    #[error("transform failed: {0}")]
    Failed(String),

    /// No toggle with this name
    #[error("unknown transform toggle: {0}")]
    UnknownToggle(String),
}

/// Pluggable text transform
///
/// Callers must treat any error (or panic) as "keep the original text".
#[cfg_attr(test, mockall::automock)]
pub trait TextTransform: Send + Sync {
    /// Transform `text` according to `options`
    ///
    /// # Errors
    /// Returns error if the text cannot be transformed
    fn transform(&self, text: &str, options: &TransformOptions) -> Result<String, TransformError>;
}

/// Deterministic uwu transform
#[derive(Debug, Default, Clone, Copy)]
pub struct UwuTransform;

impl UwuTransform {
    /// Create the transform
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply all enabled steps (pure, testable)
    #[must_use]
    pub fn apply(text: &str, options: &TransformOptions) -> String {
        if text.trim().is_empty() {
            return text.to_owned();
        }

        let mut result = text.to_owned();
        if options.yu {
            result = replace_you(&result);
        }
        if !options.nouwu {
            result = substitute_letters(&result);
        }
        if options.stutter {
            result = add_stutter(&result);
        }
        if options.smiley {
            result = add_smileys(&result);
        }
        result
    }
}

impl TextTransform for UwuTransform {
    fn transform(&self, text: &str, options: &TransformOptions) -> Result<String, TransformError> {
        Ok(Self::apply(text, options))
    }
}

fn replace_you(text: &str) -> String {
    YOU_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let upper = caps[0].chars().skip(1).all(char::is_uppercase);
            format!("{}{}", &caps[1], if upper { "U" } else { "u" })
        })
        .into_owned()
}

/// ove → uv, n+vowel → ny+vowel, r/l → w
fn substitute_letters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.eq_ignore_ascii_case(&'o')
            && chars.get(i + 1).is_some_and(|n| n.eq_ignore_ascii_case(&'v'))
            && chars.get(i + 2).is_some_and(|n| n.eq_ignore_ascii_case(&'e'))
        {
            out.push(if c.is_uppercase() { 'U' } else { 'u' });
            out.push(chars[i + 1]);
            i += 3;
            continue;
        }

        match c {
            'r' | 'l' => out.push('w'),
            'R' | 'L' => out.push('W'),
            'n' | 'N' if chars.get(i + 1).is_some_and(|n| is_vowel(*n)) => {
                out.push(c);
                out.push(if chars[i + 1].is_uppercase() { 'Y' } else { 'y' });
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

const fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U')
}

fn add_stutter(text: &str) -> String {
    let mut index = 0;
    WORD_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let word = &caps[0];
            let Some(first) = word.chars().next().filter(|c| c.is_alphabetic()) else {
                return word.to_owned();
            };
            let stutter = index % STUTTER_EVERY == 0;
            index += 1;
            if stutter {
                format!("{first}-{word}")
            } else {
                word.to_owned()
            }
        })
        .into_owned()
}

fn add_smileys(text: &str) -> String {
    let mut count = 0;
    let mut result = SENTENCE_END_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let trailing = &caps[1];
            let punctuation = &whole[..whole.len() - trailing.len()];
            let emoticon = EMOTICONS[count % EMOTICONS.len()];
            count += 1;
            format!("{punctuation} {emoticon}{trailing}")
        })
        .into_owned();

    if count == 0 {
        let trimmed_len = result.trim_end().len();
        let tail = result.split_off(trimmed_len);
        result.push(' ');
        result.push_str(EMOTICONS[0]);
        result.push_str(&tail);
    }
    result
}
