//! Operator authentication.
//!
//! A single operator is recognised by comparing the transformed identity and
//! secret against a two-line reference file. Plaintext credentials are never
//! stored; the reference file only ever holds [`CredentialDigest`] output.

pub mod digest;

pub use digest::CredentialDigest;

use std::path::{Path, PathBuf};

use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::error::{DeckError, Result};

// ============================================================================
// Outcome
// ============================================================================

/// Result of a credential check. There is no partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    Authenticated,
    InvalidCredentials,
}

impl AuthOutcome {
    /// Returns `true` for [`AuthOutcome::Authenticated`].
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Operator-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Authenticated => "Logged in successfully!",
            Self::InvalidCredentials => "Invalid username or password.",
        }
    }
}

// ============================================================================
// Reference file
// ============================================================================

/// Transformed identity and secret as stored in the reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReference {
    pub identity: String,
    pub secret: String,
}

impl CredentialReference {
    /// Read the first two lines of the reference file (order-significant).
    ///
    /// Missing lines read as empty strings, which never match a transform.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut lines = content.lines().map(str::trim);
        Ok(Self {
            identity: lines.next().unwrap_or_default().to_string(),
            secret: lines.next().unwrap_or_default().to_string(),
        })
    }
}

/// Transform `identity` and `secret` and write them as a reference file.
///
/// Parent directories are created as needed. Both values must be non-empty,
/// since empty credentials are always rejected at login.
pub fn write_reference(
    path: &Path,
    digest: &CredentialDigest,
    identity: &str,
    secret: &str,
) -> Result<CredentialReference> {
    if identity.is_empty() || secret.is_empty() {
        return Err(DeckError::Validation(
            "username and password cannot be empty".to_string(),
        ));
    }
    let reference = CredentialReference {
        identity: digest.transform(identity),
        secret: digest.transform(secret),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        format!("{}\n{}\n", reference.identity, reference.secret),
    )?;
    info!(path = %path.display(), "Credential reference written");
    Ok(reference)
}

// ============================================================================
// Verifier
// ============================================================================

/// Checks submitted credentials against the reference file.
///
/// The reference file is read on every call, so re-enrolling takes effect
/// without a restart.
#[derive(Debug)]
pub struct CredentialVerifier {
    digest: CredentialDigest,
    reference_path: PathBuf,
}

impl CredentialVerifier {
    pub fn new(digest: CredentialDigest, reference_path: impl Into<PathBuf>) -> Self {
        Self {
            digest,
            reference_path: reference_path.into(),
        }
    }

    /// Path of the reference file consulted by [`verify`](Self::verify).
    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    /// Verify an identity/secret pair.
    ///
    /// Empty input is rejected before any transform runs or the reference
    /// file is touched. An unreadable reference file is an I/O error.
    pub fn verify(&self, identity: &str, secret: &str) -> Result<AuthOutcome> {
        if identity.is_empty() || secret.is_empty() {
            debug!("Rejected login with empty credentials");
            return Ok(AuthOutcome::InvalidCredentials);
        }

        let submitted_identity = self.digest.transform(identity);
        let submitted_secret = self.digest.transform(secret);
        let reference = CredentialReference::load(&self.reference_path)?;

        // Evaluate both comparisons before combining them.
        let identity_ok = submitted_identity
            .as_bytes()
            .ct_eq(reference.identity.as_bytes());
        let secret_ok = submitted_secret
            .as_bytes()
            .ct_eq(reference.secret.as_bytes());

        if bool::from(identity_ok & secret_ok) {
            crate::log_component!(info, "auth", "Operator logged in");
            Ok(AuthOutcome::Authenticated)
        } else {
            crate::log_component!(info, "auth", "Rejected login with invalid credentials");
            Ok(AuthOutcome::InvalidCredentials)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"MyFixedBlowfishKey123456";

    fn verifier_with(identity: &str, secret: &str) -> (CredentialVerifier, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encrypted_strings.txt");
        let digest = CredentialDigest::new(KEY).unwrap();
        write_reference(&path, &digest, identity, secret).unwrap();
        (CredentialVerifier::new(digest, path), dir)
    }

    #[test]
    fn test_empty_inputs_rejected_without_reference() {
        let digest = CredentialDigest::new(KEY).unwrap();
        let verifier = CredentialVerifier::new(digest, "/nonexistent/encrypted_strings.txt");
        assert_eq!(
            verifier.verify("", "x").unwrap(),
            AuthOutcome::InvalidCredentials
        );
        assert_eq!(
            verifier.verify("x", "").unwrap(),
            AuthOutcome::InvalidCredentials
        );
    }

    #[test]
    fn test_correct_credentials_authenticate() {
        let (verifier, _dir) = verifier_with("admin", "password");
        assert_eq!(
            verifier.verify("admin", "password").unwrap(),
            AuthOutcome::Authenticated
        );
    }

    #[test]
    fn test_partial_match_is_invalid() {
        let (verifier, _dir) = verifier_with("admin", "password");
        assert_eq!(
            verifier.verify("admin", "wrong").unwrap(),
            AuthOutcome::InvalidCredentials
        );
        assert_eq!(
            verifier.verify("root", "password").unwrap(),
            AuthOutcome::InvalidCredentials
        );
    }

    #[test]
    fn test_swapped_lines_are_invalid() {
        let (verifier, _dir) = verifier_with("admin", "password");
        assert_eq!(
            verifier.verify("password", "admin").unwrap(),
            AuthOutcome::InvalidCredentials
        );
    }

    #[test]
    fn test_reads_reference_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.txt");
        // Reference values as produced by earlier deployments, with CRLF endings.
        std::fs::write(
            &path,
            "50o5348nrr5p59qq0rprr2318r055o98073s0rp22755n028p2o8954s649q3ronsq55sp69r395285prn9oq24599s43qn5q37or8r39oq587q36nnpqr4po0s7493p\r\n\
             n0o80595qso7r0sp269p1n9682q17nq6s28r0rrnq9p7oo9p740onp43s1nr199059sq1405pr5n0s4qqr112r2334p225s63r0p0296por58558p529o8nsrp7p0ss6\r\n",
        )
        .unwrap();
        let verifier = CredentialVerifier::new(CredentialDigest::new(KEY).unwrap(), &path);
        assert!(verifier.verify("admin", "password").unwrap().is_authenticated());
    }

    #[test]
    fn test_reference_read_fresh_each_call() {
        let (verifier, _dir) = verifier_with("admin", "password");
        assert!(verifier.verify("admin", "password").unwrap().is_authenticated());

        let digest = CredentialDigest::new(KEY).unwrap();
        write_reference(verifier.reference_path(), &digest, "admin", "rotated").unwrap();

        assert!(!verifier.verify("admin", "password").unwrap().is_authenticated());
        assert!(verifier.verify("admin", "rotated").unwrap().is_authenticated());
    }

    #[test]
    fn test_missing_reference_is_io_error() {
        let digest = CredentialDigest::new(KEY).unwrap();
        let verifier = CredentialVerifier::new(digest, "/nonexistent/encrypted_strings.txt");
        assert!(matches!(
            verifier.verify("admin", "password"),
            Err(DeckError::Io(_))
        ));
    }

    #[test]
    fn test_short_reference_file_never_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.txt");
        std::fs::write(&path, "only-one-line\n").unwrap();
        let verifier = CredentialVerifier::new(CredentialDigest::new(KEY).unwrap(), &path);
        assert_eq!(
            verifier.verify("admin", "password").unwrap(),
            AuthOutcome::InvalidCredentials
        );
    }

    #[test]
    fn test_write_reference_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let digest = CredentialDigest::new(KEY).unwrap();
        let result = write_reference(&dir.path().join("ref.txt"), &digest, "", "x");
        assert!(matches!(result, Err(DeckError::Validation(_))));
    }

    #[test]
    fn test_write_reference_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ref.txt");
        let digest = CredentialDigest::new(KEY).unwrap();
        let reference = write_reference(&path, &digest, "admin", "password").unwrap();
        assert_eq!(CredentialReference::load(&path).unwrap(), reference);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            AuthOutcome::Authenticated.message(),
            "Logged in successfully!"
        );
        assert_eq!(
            AuthOutcome::InvalidCredentials.message(),
            "Invalid username or password."
        );
        assert_eq!(
            serde_json::to_string(&AuthOutcome::InvalidCredentials).unwrap(),
            "\"invalid_credentials\""
        );
    }
}
