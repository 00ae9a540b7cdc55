use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Directory holding `config.toml`. Unlike a CLI, the server never creates it.
///
/// Returns `None` when nothing points at one (e.g. no `HOME` in a scratch
/// container); the relay then runs on flags, env and defaults alone.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_from(|key| env::var_os(key))
}

fn config_dir_from(var: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    if let Some(base) = var("CHAT_RELAY_HOME").map(PathBuf::from) {
        return Some(base.join("config"));
    }

    if let Some(xdg) = var("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("chat-relay"));
    }

    var("HOME").map(|home| PathBuf::from(home).join(".config").join("chat-relay"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(key: &'static str, value: &'static str) -> impl Fn(&str) -> Option<OsString> {
        move |k| (k == key).then(|| OsString::from(value))
    }

    #[test]
    fn relay_home_wins() {
        assert_eq!(
            config_dir_from(only("CHAT_RELAY_HOME", "/srv/relay")),
            Some(PathBuf::from("/srv/relay/config"))
        );
    }

    #[test]
    fn falls_back_to_xdg_then_home() {
        assert_eq!(
            config_dir_from(only("XDG_CONFIG_HOME", "/xdg")),
            Some(PathBuf::from("/xdg/chat-relay"))
        );
        assert_eq!(
            config_dir_from(only("HOME", "/home/app")),
            Some(PathBuf::from("/home/app/.config/chat-relay"))
        );
    }

    #[test]
    fn no_home_means_no_config_file() {
        assert_eq!(config_dir_from(|_| None), None);
    }
}
