//! Filename templates for downloaded tracks.
//!
//! A template is a relative path with `:token` placeholders, for example the
//! default `:name/:singer - :songName.:ext`. Tokens are matched
//! case-insensitively in one left-to-right pass, so values that happen to
//! contain `:name` are never expanded again. Unknown tokens stay as written.
//!
//! | Token       | Value                                   |
//! |-------------|-----------------------------------------|
//! | `:type`     | collection kind key (`playlist`)        |
//! | `:typeText` | collection kind label (`列表`)          |
//! | `:name`     | collection title                        |
//! | `:songName` | track title                             |
//! | `:singer`   | first credited artist                   |
//! | `:index`    | zero-padded position                    |
//! | `:rawIndex` | unpadded position                       |
//! | `:ext`      | file extension without the dot          |

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::collection::CollectionKind;
use crate::track::ResolvedTrack;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = ":name/:singer - :songName.:ext";

// `typeText` precedes `type` so the longer token wins at the same offset.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i):(typeText|type|songName|singer|rawIndex|index|ext|name)")
});

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Values available to a template for one track.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Kind of the collection the track belongs to.
    pub kind: CollectionKind,
    /// Collection title.
    pub name: &'a str,
    /// The track being named.
    pub track: &'a ResolvedTrack,
}

impl<'a> TemplateContext<'a> {
    #[must_use]
    pub fn new(kind: CollectionKind, name: &'a str, track: &'a ResolvedTrack) -> Self {
        Self { kind, name, track }
    }

    fn value(&self, token: &str) -> Option<Cow<'a, str>> {
        let value = match token.to_ascii_lowercase().as_str() {
            "typetext" => Cow::Borrowed(self.kind.label()),
            "type" => Cow::Borrowed(self.kind.key()),
            "name" => Cow::Borrowed(self.name),
            "songname" => Cow::Borrowed(self.track.track.name.as_str()),
            "singer" => Cow::Borrowed(self.track.track.singer()),
            "rawindex" => Cow::Owned(self.track.track.position.to_string()),
            "index" => Cow::Borrowed(self.track.index.as_str()),
            "ext" => Cow::Borrowed(self.track.ext.as_str()),
            _ => return None,
        };
        Some(value)
    }
}

/// Renders `template` for one track.
///
/// Every substituted value is passed through [`sanitize_component`] first;
/// literal template text, including its `/` separators, is kept as is. When
/// the track has no extension, dots left dangling at the end are dropped.
#[must_use]
pub fn render(template: &str, context: &TemplateContext<'_>) -> String {
    let rendered = TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| match context.value(&caps[1]) {
            Some(value) => sanitize_component(&value),
            None => caps[0].to_string(),
        })
        .into_owned();
    if context.track.ext.is_empty() {
        rendered.trim_end_matches('.').to_string()
    } else {
        rendered
    }
}

/// Removes characters that are illegal in a file name.
///
/// Drops `/ \ ? < > : * | "` and control characters, trims trailing dots and
/// spaces, and maps the reserved names `.` and `..` to an empty string.
#[must_use]
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '?' | '<' | '>' | ':' | '*' | '|' | '"'))
        .filter(|c| !c.is_control())
        .collect();
    let trimmed = cleaned.trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return String::new();
    }
    trimmed.to_string()
}
