//! Secret pattern matching on environment variable names.

use regex::Regex;

/// A pattern that identifies secret values by variable name.
#[derive(Debug, Clone)]
pub struct SecretPattern {
    /// Name of this pattern (for debugging).
    pub name: String,
    /// Regex matched against environment variable names.
    pub env_pattern: Regex,
}

/// Built-in patterns, as (name, regex) pairs.
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("password", r"(?i)^.*_?(PASSWORD|PASSWD|PWD)$"),
    ("secret", r"(?i)^.*_?(SECRET|SECRET_KEY)$"),
    ("token", r"(?i)^.*_?(TOKEN|ACCESS_TOKEN|AUTH_TOKEN)$"),
    ("credential", r"(?i)^.*_?CREDENTIALS?$"),
    ("private_key", r"(?i)^.*_?PRIVATE_KEY$"),
];

/// Matches environment variable names against secret patterns.
pub struct SecretMatcher {
    patterns: Vec<SecretPattern>,
}

impl SecretMatcher {
    /// Create a matcher with the built-in patterns.
    pub fn with_builtins() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| {
                Regex::new(pattern).ok().map(|env_pattern| SecretPattern {
                    name: name.to_string(),
                    env_pattern,
                })
            })
            .collect();

        Self { patterns }
    }

    /// Check if an environment variable name looks like a secret.
    pub fn is_secret(&self, env_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.env_pattern.is_match(env_name))
    }
}

impl Default for SecretMatcher {
    fn default() -> Self {
        Self::with_builtins()
    }
}
