/// User-agent parsing for the tracking enrichment step. Mirrors what the
/// dashboard expects to see in the device/browser/OS breakdowns.

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub device_type: String,
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
}

const UNKNOWN: &str = "Unknown";

/// Pull the version token that follows `marker`, e.g. "128.0.1" after
/// "firefox/". Stops at the first character outside `0-9.` (or `_` when
/// `underscores` is set, as Apple platforms write "10_15_7").
fn token_after(ua: &str, marker: &str, underscores: bool) -> Option<String> {
    let start = ua.find(marker)? + marker.len();
    let token: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || (underscores && *c == '_'))
        .collect();
    if token.is_empty() {
        None
    } else {
        Some(token.replace('_', "."))
    }
}

fn detect_device_type(ua: &str) -> String {
    let tablet_markers = ["tablet", "ipad", "playbook", "silk"];
    if tablet_markers.iter().any(|m| ua.contains(m))
        || (ua.contains("android") && !ua.contains("mobi"))
    {
        return "Tablet".to_string();
    }

    let mobile_markers = [
        "mobile",
        "android",
        "iphone",
        "ipod",
        "iemobile",
        "blackberry",
        "kindle",
        "webos",
        "hpwos",
        "opera mobi",
        "opera mini",
    ];
    if mobile_markers.iter().any(|m| ua.contains(m)) {
        return "Mobile".to_string();
    }

    "Desktop".to_string()
}

// Order matters: Chrome UAs also say "Safari", Edge UAs also say "Chrome",
// so the more specific markers are tried first.
fn detect_browser(ua: &str) -> (String, String) {
    let rules: [(&str, &str, &str); 5] = [
        ("firefox", "Firefox", "firefox/"),
        ("edg", "Edge", "edg/"),
        ("chrome", "Chrome", "chrome/"),
        ("safari", "Safari", "version/"),
        ("opr", "Opera", "opr/"),
    ];

    for (marker, name, version_marker) in rules {
        if ua.contains(marker) {
            let version =
                token_after(ua, version_marker, false).unwrap_or_else(|| UNKNOWN.to_string());
            return (name.to_string(), version);
        }
    }

    if ua.contains("opera") {
        let version =
            token_after(ua, "opera/", false).unwrap_or_else(|| UNKNOWN.to_string());
        return ("Opera".to_string(), version);
    }

    (UNKNOWN.to_string(), UNKNOWN.to_string())
}

fn detect_os(ua: &str) -> (String, String) {
    if ua.contains("windows") {
        let version = if ua.contains("windows nt 10.0") {
            "10/11"
        } else if ua.contains("windows nt 6.3") {
            "8.1"
        } else if ua.contains("windows nt 6.2") {
            "8"
        } else if ua.contains("windows nt 6.1") {
            "7"
        } else {
            UNKNOWN
        };
        return ("Windows".to_string(), version.to_string());
    }
    // iPhone/iPad agents also say "like Mac OS X", so iOS is tried first
    if ua.contains("iphone") || ua.contains("ipad") {
        let version = token_after(ua, "os ", true).unwrap_or_else(|| UNKNOWN.to_string());
        return ("iOS".to_string(), version);
    }
    if ua.contains("mac os") {
        let version =
            token_after(ua, "mac os x ", true).unwrap_or_else(|| UNKNOWN.to_string());
        return ("macOS".to_string(), version);
    }
    if ua.contains("android") {
        let version =
            token_after(ua, "android ", false).unwrap_or_else(|| UNKNOWN.to_string());
        return ("Android".to_string(), version);
    }
    if ua.contains("linux") {
        return ("Linux".to_string(), UNKNOWN.to_string());
    }
    (UNKNOWN.to_string(), UNKNOWN.to_string())
}

/// Parse a raw user-agent string into the fields the tracking payload
/// carries. Anything unrecognized comes back as "Unknown".
pub fn parse_user_agent(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.to_lowercase();

    let device_type = detect_device_type(&ua);
    let (browser, browser_version) = detect_browser(&ua);
    let (os, os_version) = detect_os(&ua);

    DeviceInfo {
        device_type,
        browser,
        browser_version,
        os,
        os_version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X906C) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36";

    #[test]
    fn chrome_is_not_mistaken_for_safari() {
        let info = parse_user_agent(CHROME_WINDOWS);
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.browser_version, "120.0.0.0");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.os_version, "10/11");
        assert_eq!(info.device_type, "Desktop");
    }

    #[test]
    fn edge_wins_over_chrome() {
        let info = parse_user_agent(EDGE_WINDOWS);
        assert_eq!(info.browser, "Edge");
        assert_eq!(info.browser_version, "120.0.2210.91");
    }

    #[test]
    fn firefox_on_linux() {
        let info = parse_user_agent(FIREFOX_LINUX);
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.browser_version, "128.0");
        assert_eq!(info.os, "Linux");
    }

    #[test]
    fn iphone_is_mobile_ios_safari() {
        let info = parse_user_agent(SAFARI_IPHONE);
        assert_eq!(info.device_type, "Mobile");
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.browser_version, "17.1");
        assert_eq!(info.os, "iOS");
        assert_eq!(info.os_version, "17.1");
    }

    #[test]
    fn android_without_mobi_is_a_tablet() {
        let info = parse_user_agent(ANDROID_TABLET);
        assert_eq!(info.device_type, "Tablet");
        assert_eq!(info.os, "Android");
        assert_eq!(info.os_version, "13");
    }

    #[test]
    fn unrecognized_agent_degrades_to_unknown() {
        let info = parse_user_agent("curl/8.5.0");
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.browser_version, "Unknown");
        assert_eq!(info.os, "Unknown");
        assert_eq!(info.device_type, "Desktop");
    }
}
