//! Track records flowing through the pipeline.
//!
//! [`RawTrack`] is produced by a collection adapter, [`PlaybackResult`] by the
//! playback lookup, and [`ResolvedTrack`] by joining the two. Records are
//! never mutated once built; downstream stages only read them.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// One entry of a collection as listed by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrack {
    /// Stable track identifier.
    pub id: u64,
    /// Track title.
    pub name: String,
    /// Artist names in credit order.
    pub artists: Vec<String>,
    /// 1-based position within the collection.
    pub position: usize,
}

impl RawTrack {
    /// Returns the first credited artist, or an empty string.
    #[must_use]
    pub fn singer(&self) -> &str {
        self.artists.first().map_or("", String::as_str)
    }
}

/// Playback lookup entry for one track id.
///
/// The service may return an entry with no URL (unlicensed) or omit the id
/// entirely; both mean the track cannot be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackResult {
    /// Track identifier the URL belongs to.
    pub id: u64,
    /// Playable URL, if any.
    pub url: Option<String>,
}

impl PlaybackResult {
    /// Returns the URL when present and non-empty.
    #[must_use]
    pub fn playable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// A track joined with its playable URL.
///
/// Invariant: `url` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    /// The source record.
    pub track: RawTrack,
    /// Playable URL.
    pub url: String,
    /// File extension taken from the URL path, without the leading dot.
    pub ext: String,
    /// Position zero-padded to the width of the collection length.
    pub index: String,
}

impl ResolvedTrack {
    /// Joins a raw track with its URL. `total` is the original collection length.
    #[must_use]
    pub fn new(track: RawTrack, url: String, total: usize) -> Self {
        let ext = extension_from_url(&url).unwrap_or_default();
        let index = pad_index(track.position, total);
        Self {
            track,
            url,
            ext,
            index,
        }
    }
}

/// Zero-pads `position` to the number of digits in `total`.
#[must_use]
pub fn pad_index(position: usize, total: usize) -> String {
    let width = total.max(1).to_string().len();
    format!("{position:0width$}")
}

/// Extracts the lowercase extension from the last URL path segment.
pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index + 1..];
    if ext.is_empty() || ext.len() > 12 {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Requested playback bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// 128 kbps.
    Standard,
    /// 192 kbps.
    Higher,
    /// 320 kbps.
    #[default]
    Exhigh,
}

impl Quality {
    /// Bitrate in bits per second as expected by the playback service.
    #[must_use]
    pub fn bitrate(self) -> u32 {
        match self {
            Self::Standard => 128_000,
            Self::Higher => 192_000,
            Self::Exhigh => 320_000,
        }
    }

    /// Bitrate in kbps.
    #[must_use]
    pub fn kbps(self) -> u32 {
        self.bitrate() / 1000
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kbps())
    }
}

/// Error returned when a quality string is not one of 128, 192 or 320.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quality '{0}': expected 128, 192 or 320")]
pub struct ParseQualityError(String);

impl FromStr for Quality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "128" | "128000" => Ok(Self::Standard),
            "192" | "192000" => Ok(Self::Higher),
            "320" | "320000" => Ok(Self::Exhigh),
            other => Err(ParseQualityError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(id: u64, position: usize) -> RawTrack {
        RawTrack {
            id,
            name: format!("song {id}"),
            artists: vec!["Artist".to_string(), "Feat".to_string()],
            position,
        }
    }

    #[test]
    fn test_singer_is_first_artist() {
        assert_eq!(raw(1, 1).singer(), "Artist");
    }

    #[test]
    fn test_singer_empty_without_artists() {
        let mut track = raw(1, 1);
        track.artists.clear();
        assert_eq!(track.singer(), "");
    }

    #[test]
    fn test_pad_index_width_follows_total() {
        assert_eq!(pad_index(3, 9), "3");
        assert_eq!(pad_index(3, 12), "03");
        assert_eq!(pad_index(3, 120), "003");
        assert_eq!(pad_index(120, 120), "120");
    }

    #[test]
    fn test_pad_index_zero_total() {
        assert_eq!(pad_index(1, 0), "1");
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(
            extension_from_url("http://m8.music.126.net/a/b/c.mp3?x=1").as_deref(),
            Some("mp3")
        );
        assert_eq!(
            extension_from_url("http://m8.music.126.net/a/b/C.FLAC").as_deref(),
            Some("flac")
        );
        assert_eq!(extension_from_url("http://m8.music.126.net/a/b/noext"), None);
        assert_eq!(extension_from_url("not a url"), None);
    }

    #[test]
    fn test_resolved_track_derives_ext_and_index() {
        let resolved = ResolvedTrack::new(raw(7, 4), "http://host/x/y.m4a".to_string(), 15);
        assert_eq!(resolved.ext, "m4a");
        assert_eq!(resolved.index, "04");
        assert_eq!(resolved.track.id, 7);
    }

    #[test]
    fn test_playable_url_filters_empty() {
        let none = PlaybackResult { id: 1, url: None };
        let empty = PlaybackResult {
            id: 1,
            url: Some(String::new()),
        };
        let some = PlaybackResult {
            id: 1,
            url: Some("http://a/b.mp3".to_string()),
        };
        assert_eq!(none.playable_url(), None);
        assert_eq!(empty.playable_url(), None);
        assert_eq!(some.playable_url(), Some("http://a/b.mp3"));
    }

    #[test]
    fn test_quality_parse_and_bitrate() {
        assert_eq!("128".parse::<Quality>().unwrap().bitrate(), 128_000);
        assert_eq!("192".parse::<Quality>().unwrap().bitrate(), 192_000);
        assert_eq!("320".parse::<Quality>().unwrap().bitrate(), 320_000);
        assert!("256".parse::<Quality>().is_err());
        assert_eq!(Quality::default(), Quality::Exhigh);
        assert_eq!(Quality::Higher.to_string(), "192");
    }
}
