//! Browser identity headers shared by page, API and download traffic.
//!
//! The upstream site rejects default client identifiers, so every request
//! carries a desktop browser User-Agent and a referer pointing at the site.

/// Browser User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Referer expected by the music site.
pub const SITE_REFERER: &str = "http://music.163.com/";
