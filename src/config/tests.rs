use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_maestro_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("MAESTRO_CONFIG_PATH", "/tmp/maestro-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/maestro-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("maestro")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("maestro")
            .join("config.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
music_dir = "/srv/music"
extensions = ["mp3", "flac"]
include_hidden = true
follow_links = false

[edit]
cover_candidates = ["art.png"]
default_cover_name = "art.png"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MAESTRO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("MAESTRO__LIBRARY__MUSIC_DIR");

    let s = Settings::load().unwrap();
    assert_eq!(
        s.library.music_dir,
        Some(std::path::PathBuf::from("/srv/music"))
    );
    assert_eq!(
        s.library.extensions,
        vec!["mp3".to_string(), "flac".to_string()]
    );
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.edit.cover_candidates, vec!["art.png".to_string()]);
    assert_eq!(s.edit.default_cover_name, "art.png");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
music_dir = "/srv/music"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("MAESTRO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("MAESTRO__LIBRARY__MUSIC_DIR", "/srv/other");

    let s = Settings::load().unwrap();
    assert_eq!(
        s.library.music_dir,
        Some(std::path::PathBuf::from("/srv/other"))
    );
}

#[test]
fn resolve_music_dir_falls_back_to_home_music() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("HOME", "/tmp/home-dir");

    let settings = LibrarySettings::default();
    assert_eq!(
        settings.resolve_music_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir").join("music")
    );
}

#[test]
fn validate_rejects_empty_extensions() {
    let mut s = Settings::default();
    s.library.extensions.clear();
    assert!(s.validate().is_err());
}
