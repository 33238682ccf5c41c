#![no_main]

use auth_service::config::DEFAULT_PUBLIC_PATHS;
use auth_service::middleware::PublicPaths;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // First line is a pattern, the rest a path.
        let (pattern, path) = s.split_once('\n').unwrap_or((s, "/"));
        let _ = PublicPaths::new([pattern]).matches(path);
        let _ = PublicPaths::new(DEFAULT_PUBLIC_PATHS).matches(s);
    }
});
