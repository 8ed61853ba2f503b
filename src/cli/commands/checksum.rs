//! Checksum command implementation.
//!
//! `hskc checksum FILE` prints the SHA-512 the way `sha512sum` does, which
//! is the value `AUTHENTICATOR_CHECKSUM` expects.

use crate::cli::args::ChecksumArgs;
use crate::download::{sha512sum, verify_sha512};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The checksum command implementation.
pub struct ChecksumCommand {
    args: ChecksumArgs,
}

impl ChecksumCommand {
    /// Create a new checksum command.
    pub fn new(args: ChecksumArgs) -> Self {
        Self { args }
    }
}

impl Command for ChecksumCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let file = &self.args.file;
        let Some(expected) = &self.args.expect else {
            println!("{}  {}", sha512sum(file)?, file.display());
            return Ok(CommandResult::success());
        };

        let actual = verify_sha512(file, expected)?;
        println!("{}  {}", actual, file.display());
        ui.success("Checksum matches");
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HskcError;
    use crate::ui::MockUI;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ABC_SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

    fn args(file: &Path, expect: Option<&str>) -> ChecksumArgs {
        ChecksumArgs {
            file: file.to_path_buf(),
            expect: expect.map(String::from),
        }
    }

    #[test]
    fn matching_checksum_succeeds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("abc.txt");
        fs::write(&file, "abc").unwrap();
        let mut ui = MockUI::new();

        let result = ChecksumCommand::new(args(&file, Some(ABC_SHA512)))
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_success("Checksum matches"));
    }

    #[test]
    fn mismatched_checksum_is_an_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("abc.txt");
        fs::write(&file, "abd").unwrap();

        let err = ChecksumCommand::new(args(&file, Some(ABC_SHA512)))
            .execute(&mut MockUI::new())
            .unwrap_err();

        assert!(matches!(err, HskcError::ChecksumMismatch { ref expected, .. } if expected == ABC_SHA512));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(ChecksumCommand::new(args(&temp.path().join("nope"), None))
            .execute(&mut MockUI::new())
            .is_err());
    }
}
