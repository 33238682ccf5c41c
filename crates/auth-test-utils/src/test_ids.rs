//! Fixed test identities for deterministic tests

// Principals
pub const TEST_EMAIL_ALICE: &str = "alice@example.com";
pub const TEST_EMAIL_BOB: &str = "bob@example.com";
pub const TEST_EMAIL_ADMIN: &str = "admin@example.com";

/// Shared by every fixture principal.
pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_WRONG_PASSWORD: &str = "incorrect-horse";

// Key IDs
pub const TEST_KEY_ID: &str = auth_service::config::DEFAULT_KEY_ID;
pub const TEST_FOREIGN_KEY_ID: &str = "foreign-key-1";

/// bcrypt cost for fixture users. Far below the production floor to keep
/// tests fast; stored hashes of any cost verify.
pub const TEST_BCRYPT_COST: u32 = 4;
