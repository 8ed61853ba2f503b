//! Output masking for secret values.

/// Replacement for every masked secret.
pub const MASK: &str = "[REDACTED]";

/// Masks secret values in strings before they reach a terminal or log.
#[derive(Debug, Clone, Default)]
pub struct OutputMasker {
    secrets: Vec<String>,
}

impl OutputMasker {
    /// Create a masker with no secrets registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret value. Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() && !self.secrets.contains(&value) {
            self.secrets.push(value);
        }
    }

    /// Mask every registered secret in `input`.
    pub fn mask(&self, input: &str) -> String {
        self.secrets
            .iter()
            .fold(input.to_string(), |acc, secret| acc.replace(secret.as_str(), MASK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_every_occurrence() {
        let mut masker = OutputMasker::new();
        masker.add_secret("s3cr3t");

        let output = masker.mask("--password s3cr3t (was s3cr3t)");

        assert_eq!(output, "--password [REDACTED] (was [REDACTED])");
    }

    #[test]
    fn empty_secret_masks_nothing() {
        let mut masker = OutputMasker::new();
        masker.add_secret("");

        assert_eq!(masker.mask("nothing here"), "nothing here");
    }
}
