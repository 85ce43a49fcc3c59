//! The admin PIN gate in front of the consolidated view.
//!
//! Advisory only: a plain string comparison with no hashing, lockout or rate
//! limiting. It keeps casual visitors out of the report; it is not a security
//! boundary.

/// Holds the configured secret, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGate {
  secret: Option<String>,
}

impl AccessGate {
  /// A blank or missing secret leaves the gate open.
  pub fn new(secret: Option<&str>) -> Self {
    Self {
      secret: secret
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned),
    }
  }

  /// A gate that admits everyone.
  pub fn open() -> Self { Self::default() }

  pub fn is_protected(&self) -> bool { self.secret.is_some() }

  /// `true` when no secret is configured or when the trimmed candidate equals
  /// the secret.
  pub fn check_pin(&self, candidate: &str) -> bool {
    match &self.secret {
      None => true,
      Some(secret) => candidate.trim() == secret,
    }
  }

  /// Like [`Self::check_pin`] for callers that may have no candidate at all.
  pub fn admits(&self, candidate: Option<&str>) -> bool {
    self.check_pin(candidate.unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn configured_secret_must_match() {
    let gate = AccessGate::new(Some("1234"));
    assert!(gate.is_protected());
    assert!(gate.check_pin("1234"));
    assert!(gate.check_pin(" 1234\n"));
    assert!(!gate.check_pin("4321"));
    assert!(!gate.check_pin(""));
    assert!(!gate.admits(None));
  }

  #[test]
  fn other_secret_rejects_1234() {
    assert!(!AccessGate::new(Some("0000")).check_pin("1234"));
  }

  #[test]
  fn missing_or_blank_secret_is_open() {
    for gate in [AccessGate::open(), AccessGate::new(None), AccessGate::new(Some("  "))] {
      assert!(!gate.is_protected());
      assert!(gate.check_pin("1234"));
      assert!(gate.check_pin(""));
      assert!(gate.admits(None));
    }
  }
}
