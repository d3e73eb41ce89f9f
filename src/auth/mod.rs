//! Cookie adapter.
//!
//! Cookies arrive as a JSON export from a browser extension. They are adapted
//! into three forms: cookies for browser session injection, a Netscape jar file
//! for `yt-dlp`, and an in-memory jar for the HTTP client.

mod cookies;
mod netscape;
mod records;

pub use cookies::load_cookies_into_jar;
pub use netscape::{
    CookieJarFile, NETSCAPE_HEADER, cookie_jar_path, ensure_cookie_jar, render_netscape,
};
pub use records::{
    BrowserCookie, CookieError, CookieRecord, load_cookie_records, parse_cookie_records,
    to_browser_cookies,
};
