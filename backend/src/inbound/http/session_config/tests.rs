//! Unit tests for session configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;

use std::io::Write;
use tempfile::NamedTempFile;

struct TempKeyFile(NamedTempFile);

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let mut file = NamedTempFile::new().expect("create key file");
        file.write_all(&vec![b'k'; len]).expect("write key file");
        Self(file)
    }

    fn path_str(&self) -> String {
        self.0.path().to_str().expect("utf-8 temp path").to_owned()
    }
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn key_file() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN)
}

fn release_vars(key_file: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_file.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[rstest]
fn release_accepts_complete_configuration(key_file: TempKeyFile) {
    let env = mock_env(release_vars(&key_file));

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl, Duration::hours(SESSION_TTL_DEFAULT_HOURS));
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_each_toggle(key_file: TempKeyFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&key_file);
    vars.remove(missing);
    let env = mock_env(vars);

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(
        result,
        Err(SessionConfigError::MissingEnv { name }) if name == missing
    ));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
#[case(TTL_ENV, "0")]
#[case(TTL_ENV, "forever")]
fn release_rejects_malformed_values(
    key_file: TempKeyFile,
    #[case] variable: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&key_file);
    vars.insert(variable, value.to_owned());
    let env = mock_env(vars);

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(
        result,
        Err(SessionConfigError::InvalidEnv { name, .. }) if name == variable
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    let env = mock_env(vars);

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::EphemeralNotAllowed)));
}

#[rstest]
fn release_rejects_missing_key_file(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(KEY_FILE_ENV, "/nonexistent/helpdesk/key".to_owned());
    let env = mock_env(vars);

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::KeyRead { .. })));
}

#[rstest]
#[case(BuildMode::Release, 40)]
#[case(BuildMode::Debug, 16)]
fn short_keys_are_rejected(#[case] mode: BuildMode, #[case] length: usize) {
    let short = TempKeyFile::new(length);
    let env = mock_env(release_vars(&short));

    let result = session_settings_from_env(&env, mode);

    assert!(matches!(
        result,
        Err(SessionConfigError::KeyTooShort { length: got, .. }) if got == length
    ));
}

#[rstest]
fn release_rejects_insecure_same_site_none(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    let env = mock_env(vars);

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::InsecureSameSiteNone)));
}

#[rstest]
fn ttl_override_is_applied(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(TTL_ENV, "24".to_owned());
    let env = mock_env(vars);

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert_eq!(settings.ttl, Duration::hours(24));
}

#[rstest]
fn debug_defaults_need_no_configuration() {
    let env = mock_env(HashMap::new());

    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_tolerates_garbage_toggles(key_file: TempKeyFile) {
    let mut vars = release_vars(&key_file);
    vars.insert(COOKIE_SECURE_ENV, "perhaps".to_owned());
    vars.insert(SAMESITE_ENV, "unexpected".to_owned());
    let env = mock_env(vars);

    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug fallback");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("1", Some(true))]
#[case(" YES ", Some(true))]
#[case("n", Some(false))]
#[case("False", Some(false))]
#[case("2", None)]
fn bool_toggles_parse_leniently(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}

#[rstest]
fn fingerprint_is_stable_for_a_key(key_file: TempKeyFile) {
    let env = mock_env(release_vars(&key_file));
    let first = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    let second = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert_eq!(first.key_fingerprint(), second.key_fingerprint());
    assert_eq!(first.key_fingerprint().len(), FINGERPRINT_BYTES * 2);
}
