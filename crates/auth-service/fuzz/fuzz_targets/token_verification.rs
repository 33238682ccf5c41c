#![no_main]

use auth_service::config::Config;
use auth_service::crypto::KeyStore;
use auth_service::services::TokenVerifier;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

fn verifier() -> &'static TokenVerifier {
    static VERIFIER: OnceLock<TokenVerifier> = OnceLock::new();
    VERIFIER.get_or_init(|| {
        let config = Config::from_vars(&HashMap::new()).expect("default config");
        let keys = KeyStore::bundled(&config.key_id).expect("bundled key pair");
        TokenVerifier::new(Arc::new(keys), &config)
    })
}

fuzz_target!(|data: &[u8]| {
    if let Ok(token) = std::str::from_utf8(data) {
        // Header parsing, then both verification paths. None may panic.
        let _ = common::jwt::extract_kid(token);
        let _ = verifier().parse_access_token(token);
        let _ = verifier().parse_refresh_token(token);
    }
});
