//! Bridge settings – reads/writes `~/.skybridge/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use skybridge_runtime::{DEFAULT_YAW_RATE_LIMIT, PlatformConfig};
use skybridge_types::BridgeError;

/// Persisted bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Vehicle namespace, e.g. `drone0`.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Sensor descriptor string: `world,model,name,link,kind` entries
    /// separated by `:`.
    #[serde(default)]
    pub sensors: String,

    /// World-frame yaw-rate bound, rad/s.
    #[serde(default = "default_yaw_rate_limit")]
    pub yaw_rate_limit: f64,

    #[serde(default = "default_command_period_ms")]
    pub command_period_ms: u64,

    /// Buffered inbound simulator messages.
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
}

fn default_namespace() -> String {
    "drone0".to_string()
}
fn default_yaw_rate_limit() -> f64 {
    DEFAULT_YAW_RATE_LIMIT
}
fn default_command_period_ms() -> u64 {
    10
}
fn default_inbound_capacity() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            sensors: String::new(),
            yaw_rate_limit: default_yaw_rate_limit(),
            command_period_ms: default_command_period_ms(),
            inbound_capacity: default_inbound_capacity(),
        }
    }
}

impl Config {
    /// Settings for [`skybridge_runtime::Platform::new`].
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            namespace: self.namespace.clone(),
            sensors: self.sensors.clone(),
            yaw_rate_limit: self.yaw_rate_limit,
            command_period: Duration::from_millis(self.command_period_ms),
        }
    }

    /// Reject values the runtime cannot start with.  The yaw-rate limit and
    /// period are checked again by the platform itself.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.inbound_capacity == 0 {
            return Err(BridgeError::Config(
                "inbound_capacity must be at least 1".to_string(),
            ));
        }
        if self.command_period_ms == 0 {
            return Err(BridgeError::Config(
                "command_period_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Return the path to `~/.skybridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".skybridge").join("config.toml")
}

/// Load the config at `path`, with environment overrides applied.  Returns
/// `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, BridgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| BridgeError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SKYBRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SKYBRIDGE_NAMESPACE` | `namespace` |
/// | `SKYBRIDGE_SENSORS` | `sensors` |
/// | `SKYBRIDGE_YAW_RATE_LIMIT` | `yaw_rate_limit` |
/// | `SKYBRIDGE_COMMAND_PERIOD_MS` | `command_period_ms` |
///
/// Unparsable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SKYBRIDGE_NAMESPACE") {
        cfg.namespace = v;
    }
    if let Ok(v) = std::env::var("SKYBRIDGE_SENSORS") {
        cfg.sensors = v;
    }
    if let Ok(v) = std::env::var("SKYBRIDGE_YAW_RATE_LIMIT")
        && let Ok(limit) = v.trim().parse::<f64>()
    {
        cfg.yaw_rate_limit = limit;
    }
    if let Ok(v) = std::env::var("SKYBRIDGE_COMMAND_PERIOD_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.command_period_ms = ms;
    }
}

/// Save `cfg` to `path`, creating the parent directory if necessary.
/// On Unix the directory is `0o700` and the file `0o600`.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), BridgeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BridgeError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                BridgeError::Config(format!("failed to restrict {}: {e}", parent.display()))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| BridgeError::Serialization(format!("failed to serialize config: {e}")))?;
    let write_err =
        |e: std::io::Error| BridgeError::Config(format!("failed to write {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-var tests share process state; run them one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.namespace, "drone0");
        assert!(cfg.sensors.is_empty());
        assert!((cfg.yaw_rate_limit - std::f64::consts::FRAC_PI_2).abs() < f64::EPSILON);
        assert_eq!(cfg.command_period_ms, 10);
        assert_eq!(cfg.inbound_capacity, 256);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn platform_config_carries_settings() {
        let cfg = Config {
            namespace: "uav7".to_string(),
            sensors: "w1,m1,cam0,t0,camera".to_string(),
            command_period_ms: 20,
            ..Config::default()
        };
        let pc = cfg.platform_config();
        assert_eq!(pc.namespace, "uav7");
        assert_eq!(pc.sensors, "w1,m1,cam0,t0,camera");
        assert_eq!(pc.command_period, Duration::from_millis(20));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "sensors = \"w1,m1,gps0,t0,gps\"\n").unwrap();

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.sensors, "w1,m1,gps0,t0,gps");
        assert_eq!(cfg.namespace, "drone0");
        assert_eq!(cfg.inbound_capacity, 256);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "yaw_rate_limit = \"fast\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(BridgeError::Config(_))));
    }

    #[test]
    fn roundtrip_saved_config() {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            namespace: "drone3".to_string(),
            sensors: "w1,m1,lidar0,t1,lidar".to_string(),
            ..Config::default()
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_skybridge_dir() {
        let p = config_path_for_home("/home/pilot");
        assert_eq!(p, PathBuf::from("/home/pilot/.skybridge/config.toml"));
    }

    #[test]
    fn env_overrides_apply() {
        let _env = ENV_LOCK.lock().unwrap();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var("SKYBRIDGE_NAMESPACE", "drone9");
            std::env::set_var("SKYBRIDGE_SENSORS", "w1,m1,imu0,t0,imu");
            std::env::set_var("SKYBRIDGE_YAW_RATE_LIMIT", "0.75");
            std::env::set_var("SKYBRIDGE_COMMAND_PERIOD_MS", "25");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("SKYBRIDGE_NAMESPACE");
            std::env::remove_var("SKYBRIDGE_SENSORS");
            std::env::remove_var("SKYBRIDGE_YAW_RATE_LIMIT");
            std::env::remove_var("SKYBRIDGE_COMMAND_PERIOD_MS");
        }
        assert_eq!(cfg.namespace, "drone9");
        assert_eq!(cfg.sensors, "w1,m1,imu0,t0,imu");
        assert!((cfg.yaw_rate_limit - 0.75).abs() < f64::EPSILON);
        assert_eq!(cfg.command_period_ms, 25);
    }

    #[test]
    fn env_overrides_ignore_invalid_numbers() {
        let _env = ENV_LOCK.lock().unwrap();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var("SKYBRIDGE_YAW_RATE_LIMIT", "fast");
            std::env::set_var("SKYBRIDGE_COMMAND_PERIOD_MS", "-3");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("SKYBRIDGE_YAW_RATE_LIMIT");
            std::env::remove_var("SKYBRIDGE_COMMAND_PERIOD_MS");
        }
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = Config {
            inbound_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(BridgeError::Config(_))));
    }
}
