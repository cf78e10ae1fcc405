use std::path::PathBuf;

/// Migrations creating the `users` table
pub fn users_migrations() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/migrations")
}
