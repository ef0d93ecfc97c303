//! Identity lines: `author`, `committer`, and `tagger`.
//!
//! Wire form: `<name> <<email>> <seconds> <timezone>`.

use std::fmt::Display;

use bstr::ByteSlice;

use crate::errors::GitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: u64,
    pub timezone: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp: u64, timezone: impl Into<String>) -> Self {
        Signature {
            name: name.into(),
            email: email.into(),
            timestamp,
            timezone: timezone.into(),
        }
    }

    /// Parses `"<name> <<email>> <seconds> <tz>"`.
    pub fn parse(line: &[u8]) -> Result<Signature, GitError> {
        let bad = || GitError::BadIdentityLine(line.to_str_lossy().to_string());

        let email_start = line.find(b" <").ok_or_else(bad)?;
        let name = line[..email_start].to_str().map_err(|_| bad())?.to_string();

        let email_end = line[email_start..].find(b"> ").ok_or_else(bad)? + email_start;
        let email = line[email_start + 2..email_end]
            .to_str()
            .map_err(|_| bad())?
            .to_string();

        let rest = line[email_end + 2..].to_str().map_err(|_| bad())?;
        let mut parts = rest.trim_end().splitn(2, ' ');
        let timestamp: u64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let timezone = parts.next().ok_or_else(bad)?.to_string();
        if !validate_timezone(&timezone) {
            return Err(GitError::InvalidTimezone(timezone));
        }

        Ok(Signature {
            name,
            email,
            timestamp,
            timezone,
        })
    }

    pub fn to_line(&self) -> Vec<u8> {
        format!(
            "{} <{}> {} {}",
            self.name, self.email, self.timestamp, self.timezone
        )
        .into_bytes()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// `[+-]\d{4}`.
pub fn validate_timezone(tz: &str) -> bool {
    let bytes = tz.as_bytes();
    bytes.len() == 5 && (bytes[0] == b'+' || bytes[0] == b'-') && bytes[1..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_identity_line() {
        let sig = Signature::parse(b"A <a@x> 1700000000 +0000").unwrap();
        assert_eq!(sig.name, "A");
        assert_eq!(sig.email, "a@x");
        assert_eq!(sig.timestamp, 1700000000);
        assert_eq!(sig.timezone, "+0000");
    }

    #[test]
    fn round_trips_to_line() {
        let sig = Signature::new("A", "a@x", 1700000000, "+0000");
        assert_eq!(sig.to_line(), b"A <a@x> 1700000000 +0000");
    }

    #[test]
    fn rejects_bad_timezone() {
        assert!(Signature::parse(b"A <a@x> 1700000000 +000").is_err());
    }

    #[test]
    fn rejects_missing_email() {
        assert!(Signature::parse(b"A 1700000000 +0000").is_err());
    }
}
