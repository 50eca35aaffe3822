// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys. No exporter is installed here; the
//! counters are no-ops unless the embedding process sets a recorder.
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const TOKEN_ISSUED: &str = "auth.token.issued";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const USER_REGISTERED: &str = "user.registered";
pub const REGISTRATION_CONFLICT: &str = "user.registration.conflict";
