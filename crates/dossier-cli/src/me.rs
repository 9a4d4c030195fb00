//! Presence identity resolution.
//!
//! The resolution chain: `--me` flag > `DOSSIER_ME` env > user config `me` >
//! `USER` env (TTY only). The identity is only used to leave the current user
//! out of "who else is editing" listings, so a missing identity is not an
//! error.

use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn resolve_me_with(
    cli_flag: Option<&str>,
    configured: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(me) = cli_flag.filter(|m| !m.is_empty()) {
        return Some(me.to_string());
    }

    if let Some(val) = env.get("DOSSIER_ME") {
        return Some(val);
    }

    if let Some(me) = configured.filter(|m| !m.is_empty()) {
        return Some(me.to_string());
    }

    if env.is_tty() {
        if let Some(val) = env.get("USER") {
            return Some(val);
        }
    }

    None
}

pub fn resolve_me(cli_flag: Option<&str>, configured: Option<&str>) -> Option<String> {
    resolve_me_with(cli_flag, configured, &RealEnv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
        tty: bool,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
                tty: false,
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }

        const fn tty(mut self) -> Self {
            self.tty = true;
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.is_empty()).cloned()
        }

        fn is_tty(&self) -> bool {
            self.tty
        }
    }

    #[test]
    fn cli_flag_takes_priority() {
        let env = MockEnv::new().var("DOSSIER_ME", "env-user");
        assert_eq!(
            resolve_me_with(Some("flag-user"), Some("cfg-user"), &env),
            Some("flag-user".into())
        );
    }

    #[test]
    fn env_beats_config() {
        let env = MockEnv::new().var("DOSSIER_ME", "env-user");
        assert_eq!(
            resolve_me_with(None, Some("cfg-user"), &env),
            Some("env-user".into())
        );
        assert_eq!(
            resolve_me_with(None, Some("cfg-user"), &MockEnv::new()),
            Some("cfg-user".into())
        );
    }

    #[test]
    fn user_only_on_tty() {
        let piped = MockEnv::new().var("USER", "alice");
        assert_eq!(resolve_me_with(None, None, &piped), None);

        let tty = MockEnv::new().var("USER", "alice").tty();
        assert_eq!(resolve_me_with(None, None, &tty), Some("alice".into()));
    }

    #[test]
    fn empty_flag_is_ignored() {
        assert_eq!(resolve_me_with(Some(""), None, &MockEnv::new()), None);
    }
}
