//! Input validation and naming rules shared by the object codec and the
//! ref store. Every public entry point validates before touching storage.

use crate::errors::GitError;

/// 40 hex characters.
pub fn validate_identifier_str(s: &str) -> Result<(), GitError> {
    if s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(GitError::InvalidIdentifier(s.to_string()))
    }
}

/// `HEAD` is the sole always-valid exception to the component rules below.
pub fn validate_ref_name(name: &str) -> Result<(), GitError> {
    if name == "HEAD" {
        return Ok(());
    }
    let bad = || GitError::InvalidName(name.to_string());

    if name.is_empty() || name == "@" {
        return Err(bad());
    }
    if name.contains("..") || name.contains("@{") {
        return Err(bad());
    }
    if name.ends_with('/') || name.ends_with(".lock") {
        return Err(bad());
    }
    const FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\', ' '];
    if name.chars().any(|c| c.is_control() || FORBIDDEN.contains(&c)) {
        return Err(bad());
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(bad());
        }
        if component.starts_with('.') || component.ends_with('.') {
            return Err(bad());
        }
    }
    Ok(())
}

/// Entry name: non-empty, no `/`, no zero byte.
pub fn validate_entry_name(name: &str) -> Result<(), GitError> {
    if name.is_empty() || name.contains('/') || name.bytes().any(|b| b == 0) {
        Err(GitError::BadModeOrName(name.to_string()))
    } else {
        Ok(())
    }
}

/// `[+-]\d{4}`.
pub fn validate_timezone(tz: &str) -> Result<(), GitError> {
    if crate::internal::object::signature::validate_timezone(tz) {
        Ok(())
    } else {
        Err(GitError::InvalidTimezone(tz.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_is_always_valid() {
        assert!(validate_ref_name("HEAD").is_ok());
    }

    #[test]
    fn accepts_a_well_formed_branch_name() {
        assert!(validate_ref_name("refs/heads/main").is_ok());
    }

    #[test]
    fn rejects_double_dot() {
        assert!(validate_ref_name("refs/heads/a..b").is_err());
    }

    #[test]
    fn rejects_trailing_lock() {
        assert!(validate_ref_name("refs/heads/main.lock").is_err());
    }

    #[test]
    fn rejects_component_starting_with_dot() {
        assert!(validate_ref_name("refs/heads/.hidden").is_err());
    }

    #[test]
    fn rejects_at_alone() {
        assert!(validate_ref_name("@").is_err());
    }

    #[test]
    fn rejects_control_and_glob_chars() {
        for bad in ["refs/heads/a~1", "refs/heads/a^1", "refs/heads/a:b", "refs/heads/a*"] {
            assert!(validate_ref_name(bad).is_err(), "{bad} should be invalid");
        }
    }

    #[test]
    fn validates_identifier_length_and_hex() {
        assert!(validate_identifier_str("ce013625030ba8dba906f756967f9e9ca394464a").is_ok());
        assert!(validate_identifier_str("not-hex").is_err());
    }
}
