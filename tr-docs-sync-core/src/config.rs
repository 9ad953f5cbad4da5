use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const TR_PHONE_NUMBER: &str = "TR_PHONE_NUMBER";
pub const TR_PIN: &str = "TR_PIN";
pub const TR_DAYS_TO_DOWNLOAD: &str = "TR_DAYS_TO_DOWNLOAD";
pub const TR_DOC_DOWNLOAD_PATH: &str = "TR_DOC_DOWNLOAD_PATH";
pub const NC_URL: &str = "NC_URL";
pub const NC_AUTH_USER: &str = "NC_AUTH_USER";
pub const NC_AUTH_PASS: &str = "NC_AUTH_PASS";
pub const NC_TR_DOCUMENT_FOLDER: &str = "NC_TR_DOCUMENT_FOLDER";
pub const PYTR_COMMAND: &str = "PYTR_COMMAND";

/// Executable used for both the download and the export step when
/// `PYTR_COMMAND` is not set.
pub const DEFAULT_PYTR_COMMAND: &str = "pytr";

/// Every key the loader understands, in the order they are reported.
pub const ALL_KEYS: &[&str] = &[
    TR_PHONE_NUMBER,
    TR_PIN,
    TR_DAYS_TO_DOWNLOAD,
    TR_DOC_DOWNLOAD_PATH,
    NC_URL,
    NC_AUTH_USER,
    NC_AUTH_PASS,
    NC_TR_DOCUMENT_FOLDER,
    PYTR_COMMAND,
];

/// Immutable run configuration, loaded once and handed to every stage.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub trade_republic: TradeRepublicSettings,
    pub nextcloud: Option<NextcloudSettings>,
    pub pytr_command: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TradeRepublicSettings {
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub pin: String,
    /// Passed to `--last_days` verbatim; `0` asks for the full history.
    pub days_to_download: String,
    pub download_path: PathBuf,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NextcloudSettings {
    pub url: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Remote base folder that mirrors `download_path`.
    pub document_folder: String,
}

impl Settings {
    /// Builds settings from a key lookup (environment, dotenv file, map...).
    ///
    /// Empty values are treated as missing. All `TR_*` keys are required; the
    /// `NC_*` keys must be either all present or all absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tr_keys = [TR_PHONE_NUMBER, TR_PIN, TR_DAYS_TO_DOWNLOAD, TR_DOC_DOWNLOAD_PATH];
        let nc_keys = [NC_URL, NC_AUTH_USER, NC_AUTH_PASS, NC_TR_DOCUMENT_FOLDER];
        let absent = |keys: &[&str]| -> Vec<String> {
            keys.iter()
                .filter(|&&k| get(k).is_none())
                .map(|k| k.to_string())
                .collect()
        };

        let missing = absent(&tr_keys);
        let mut nc_missing = absent(&nc_keys);
        // An entirely absent group just means no remote is configured.
        if nc_missing.len() == nc_keys.len() {
            nc_missing.clear();
        }
        match (missing.is_empty(), nc_missing.is_empty()) {
            (true, true) => {}
            (false, true) => return Err(ConfigError::MissingKeys(missing)),
            (true, false) => return Err(ConfigError::IncompleteNextcloud(nc_missing)),
            (false, false) => {
                return Err(ConfigError::MissingAndIncomplete {
                    missing,
                    nextcloud: nc_missing,
                })
            }
        }

        let trade_republic = TradeRepublicSettings {
            phone_number: get(TR_PHONE_NUMBER).unwrap_or_default(),
            pin: get(TR_PIN).unwrap_or_default(),
            days_to_download: get(TR_DAYS_TO_DOWNLOAD).unwrap_or_default(),
            download_path: PathBuf::from(get(TR_DOC_DOWNLOAD_PATH).unwrap_or_default()),
        };

        let nextcloud = get(NC_URL).map(|url| NextcloudSettings {
            url,
            user: get(NC_AUTH_USER).unwrap_or_default(),
            password: get(NC_AUTH_PASS).unwrap_or_default(),
            document_folder: get(NC_TR_DOCUMENT_FOLDER).unwrap_or_default(),
        });

        Ok(Settings {
            trade_republic,
            nextcloud,
            pytr_command: get(PYTR_COMMAND).unwrap_or_else(|| DEFAULT_PYTR_COMMAND.to_string()),
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            download_path = %self.trade_republic.download_path.display(),
            days_to_download = %self.trade_republic.days_to_download,
            nextcloud_configured = self.nextcloud.is_some(),
            pytr_command = %self.pytr_command,
            "Loaded settings"
        );
        debug!(?self, "Settings loaded (full debug)");
    }
}

impl fmt::Debug for TradeRepublicSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradeRepublicSettings")
            .field("phone_number", &self.phone_number)
            .field("pin", &"***")
            .field("days_to_download", &self.days_to_download)
            .field("download_path", &self.download_path)
            .finish()
    }
}

impl fmt::Debug for NextcloudSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextcloudSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .field("document_folder", &self.document_folder)
            .finish()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("trade_republic", &self.trade_republic)
            .field("nextcloud", &self.nextcloud)
            .field("pytr_command", &self.pytr_command)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (TR_PHONE_NUMBER, "+4917055501"),
            (TR_PIN, "1234"),
            (TR_DAYS_TO_DOWNLOAD, "0"),
            (TR_DOC_DOWNLOAD_PATH, "downloads"),
            (NC_URL, "https://cloud.example.com"),
            (NC_AUTH_USER, "alice"),
            (NC_AUTH_PASS, "secret"),
            (NC_TR_DOCUMENT_FOLDER, "TR/Docs"),
        ])
    }

    fn load(map: &HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|k| map.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn loads_complete_settings() {
        let settings = load(&full()).expect("complete settings load");
        assert_eq!(settings.trade_republic.days_to_download, "0");
        assert_eq!(settings.trade_republic.download_path, PathBuf::from("downloads"));
        assert_eq!(settings.pytr_command, DEFAULT_PYTR_COMMAND);
        let nc = settings.nextcloud.expect("nextcloud configured");
        assert_eq!(nc.document_folder, "TR/Docs");
    }

    #[test]
    fn nextcloud_is_optional_as_a_group() {
        let mut map = full();
        for key in [NC_URL, NC_AUTH_USER, NC_AUTH_PASS, NC_TR_DOCUMENT_FOLDER] {
            map.remove(key);
        }
        let settings = load(&map).expect("settings without nextcloud load");
        assert!(settings.nextcloud.is_none());
    }

    #[test]
    fn partial_nextcloud_is_rejected() {
        let mut map = full();
        map.remove(NC_AUTH_PASS);
        assert_eq!(
            load(&map).unwrap_err(),
            ConfigError::IncompleteNextcloud(vec![NC_AUTH_PASS.to_string()])
        );
    }

    #[test]
    fn reports_every_missing_required_key() {
        let mut map = full();
        map.remove(TR_PIN);
        map.insert(TR_PHONE_NUMBER, "  ");
        let err = load(&map).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingKeys(vec![TR_PHONE_NUMBER.to_string(), TR_PIN.to_string()])
        );
        assert!(err.to_string().contains("TR_PIN"));
    }

    #[test]
    fn missing_and_incomplete_groups_are_reported_together() {
        let mut map = full();
        map.remove(TR_PIN);
        map.remove(NC_AUTH_PASS);
        let err = load(&map).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingAndIncomplete {
                missing: vec![TR_PIN.to_string()],
                nextcloud: vec![NC_AUTH_PASS.to_string()],
            }
        );
        let message = err.to_string();
        assert!(message.contains("TR_PIN"), "{message}");
        assert!(message.contains("NC_AUTH_PASS"), "{message}");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut map = full();
        map.insert(PYTR_COMMAND, "/opt/pytr/bin/pytr");
        let settings = load(&map).unwrap();
        let printed = format!("{settings:?}");
        assert!(!printed.contains("1234"));
        assert!(!printed.contains("secret"));
        assert!(printed.contains("/opt/pytr/bin/pytr"));
    }
}
