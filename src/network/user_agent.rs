//! User agent generation

use rand::seq::SliceRandom;

const CHROME_VERSIONS: &[&str] = &["122.0.0.0", "123.0.0.0", "124.0.0.0", "125.0.0.0"];
const FIREFOX_VERSIONS: &[&str] = &["123.0", "124.0", "125.0"];

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

/// Generate a random but realistic desktop user agent string
///
/// HTML engines such as DuckDuckGo serve a reduced page to unknown clients.
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or(PLATFORMS[0]);

    if rand::random::<bool>() {
        let chrome = CHROME_VERSIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(CHROME_VERSIONS[0]);
        format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
            platform, chrome
        )
    } else {
        let firefox = FIREFOX_VERSIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(FIREFOX_VERSIONS[0]);
        format!(
            "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
            platform, firefox, firefox
        )
    }
}

/// Standard accept header for HTML requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept header for JSON API requests
pub fn accept_json() -> &'static str {
    "application/json,text/javascript,*/*;q=0.01"
}
