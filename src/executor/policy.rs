// Command policy: which command lines may reach the runner

use crate::executor::error::{ExecutorError, Result};

/// Literal prefix every install command must start with
pub const INSTALL_PREFIX: &str = "sudo apt install";

/// Rule a command line is checked against before execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whitelist {
    /// Only `sudo apt install ...` command lines
    InstallWhitelist,
    /// Anything goes; used for ad-hoc commands on a trusted local host
    NoRestriction,
    /// Nothing goes; ad-hoc commands switched off by the operator
    Disabled,
}

impl Whitelist {
    /// Rule for the ad-hoc path given the operator's setting
    pub fn ad_hoc(allowed: bool) -> Self {
        if allowed {
            Self::NoRestriction
        } else {
            Self::Disabled
        }
    }

    /// Check a raw command line against this rule
    pub fn validate(self, command_line: &str) -> Result<()> {
        match self {
            Self::InstallWhitelist if command_line.starts_with(INSTALL_PREFIX) => Ok(()),
            Self::InstallWhitelist => Err(ExecutorError::PolicyRejected(format!(
                "Only '{INSTALL_PREFIX}' commands are allowed"
            ))),
            Self::NoRestriction => Ok(()),
            Self::Disabled => Err(ExecutorError::PolicyRejected(
                "Ad-hoc commands are disabled on this server".to_string(),
            )),
        }
    }
}

/// Split a command line on whitespace into an argument vector.
///
/// No quoting, globbing or variable expansion: `"a b"` yields two tokens
/// `"a` and `b"`.
pub fn tokenize(command_line: &str) -> Vec<String> {
    command_line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_whitelist_accepts_prefix() {
        assert!(Whitelist::InstallWhitelist.validate("sudo apt install htop").is_ok());
        // Raw prefix match, no token boundary required
        assert!(Whitelist::InstallWhitelist.validate("sudo apt installx").is_ok());
    }

    #[test]
    fn test_install_whitelist_rejects_others() {
        for cmd in [
            "apt install foo",
            " sudo apt install foo",
            "sudo  apt install foo",
            "rm -rf /",
            "",
        ] {
            let err = Whitelist::InstallWhitelist.validate(cmd).unwrap_err();
            assert_eq!(err.to_string(), "Only 'sudo apt install' commands are allowed");
        }
    }

    #[test]
    fn test_no_restriction() {
        assert!(Whitelist::NoRestriction.validate("rm -rf /tmp/x").is_ok());
        assert!(Whitelist::NoRestriction.validate("").is_ok());
    }

    #[test]
    fn test_disabled() {
        assert_eq!(Whitelist::ad_hoc(false), Whitelist::Disabled);
        assert_eq!(Whitelist::ad_hoc(true), Whitelist::NoRestriction);
        assert!(Whitelist::Disabled.validate("ls").is_err());
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("  sudo apt\tinstall   -y htop\n"),
            vec!["sudo", "apt", "install", "-y", "htop"]
        );
        assert_eq!(tokenize(r#"echo "a b""#), vec!["echo", "\"a", "b\""]);
        assert_eq!(tokenize("echo $HOME *"), vec!["echo", "$HOME", "*"]);
        assert!(tokenize("   ").is_empty());
    }
}
