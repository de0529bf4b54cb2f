use anyhow::Result;
use std::path::PathBuf;

pub const CMDRELAY_DIR_NAME: &str = ".cmdrelay";
pub const HOME_ENV: &str = "CMDRELAY_HOME";

pub fn cmdrelay_home() -> Result<PathBuf> {
    if let Ok(override_home) = std::env::var(HOME_ENV) {
        let trimmed = override_home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("No home directory found"))?
        .join(CMDRELAY_DIR_NAME))
}

pub fn config_file() -> Result<PathBuf> {
    Ok(cmdrelay_home()?.join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cmdrelay_home_default() {
        let previous = std::env::var_os(HOME_ENV);
        std::env::remove_var(HOME_ENV);
        let path = cmdrelay_home().unwrap();
        if let Some(value) = previous {
            std::env::set_var(HOME_ENV, value);
        }
        assert!(path.ends_with(CMDRELAY_DIR_NAME));
        assert!(path.is_absolute());
    }

    #[test]
    #[serial]
    fn test_home_override() {
        let previous = std::env::var_os(HOME_ENV);
        std::env::set_var(HOME_ENV, "  /srv/cmdrelay  ");
        let home = cmdrelay_home().unwrap();
        let config = config_file().unwrap();
        match previous {
            Some(value) => std::env::set_var(HOME_ENV, value),
            None => std::env::remove_var(HOME_ENV),
        }
        assert_eq!(home, PathBuf::from("/srv/cmdrelay"));
        assert_eq!(config, PathBuf::from("/srv/cmdrelay/config.yaml"));
    }
}
