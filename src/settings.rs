use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::models::auth::AuthError;
use crate::validation::{PasswordPolicy, DEFAULT_MIN_PASSWORD_LENGTH};

/// Port used for a bare `localhost` subdomain
pub const DEFAULT_LOCALHOST_PORT: u16 = 1337;

static LOCALHOST_SUBDOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^localhost(?::(\d+))?$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    pub client: ClientSettings,
    pub backend: BackendSettings,
    pub session: SessionSettings,
    pub credentials: CredentialSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientSettings {
    /// Frontend origin and default path relative redirects are anchored on
    pub client_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendSettings {
    /// Full backend URL, used when self-hosting
    pub backend_url: Option<String>,
    /// Project subdomain, or `localhost[:port]` during local development
    pub subdomain: Option<String>,
    /// Project region, required for any subdomain other than localhost
    pub region: Option<String>,
    /// Admin secret for backend implementations that need elevated access
    pub admin_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Refresh the access token automatically before it expires
    pub auto_refresh_token: bool,
    /// How long before expiry a refresh is due
    pub refresh_margin_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            refresh_margin_seconds: 300,
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the backend services live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendLocation {
    /// Self-hosted backend at an explicit URL
    BackendUrl(String),
    /// Local development backend
    Localhost { port: u16 },
    /// Hosted project
    Hosted { subdomain: String, region: String },
}

impl BackendLocation {
    /// Resolve the backend location from settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if neither a backend URL nor a subdomain
    /// is set, or if a hosted subdomain has no region.
    pub fn from_settings(backend: &BackendSettings) -> Result<Self, AuthError> {
        if let Some(url) = non_empty(backend.backend_url.as_deref()) {
            return Ok(Self::BackendUrl(url.trim_end_matches('/').to_string()));
        }

        let subdomain = non_empty(backend.subdomain.as_deref()).ok_or_else(|| {
            AuthError::Configuration("Either `backend_url` or `subdomain` must be set".to_string())
        })?;

        if let Some(captures) = LOCALHOST_SUBDOMAIN.captures(subdomain) {
            let port = match captures.get(1) {
                Some(port) => port.as_str().parse::<u16>().map_err(|e| {
                    AuthError::Configuration(format!("Invalid localhost port '{}': {e}", port.as_str()))
                })?,
                None => DEFAULT_LOCALHOST_PORT,
            };
            return Ok(Self::Localhost { port });
        }

        let region = non_empty(backend.region.as_deref()).ok_or_else(|| {
            AuthError::Configuration(
                "`region` must be set when using a `subdomain` other than \"localhost\"".to_string(),
            )
        })?;

        Ok(Self::Hosted {
            subdomain: subdomain.to_string(),
            region: region.to_string(),
        })
    }

    /// URL of a backend service such as `auth`
    #[must_use]
    pub fn service_url(&self, service: &str) -> String {
        match self {
            Self::BackendUrl(url) => format!("{url}/v1/{service}"),
            Self::Localhost { port } => format!("http://localhost:{port}/v1/{service}"),
            Self::Hosted { subdomain, region } => {
                format!("https://{subdomain}.{service}.{region}.nhost.run/v1")
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AuthSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging);
        Ok(settings)
    }

    /// Initialize `env_logger` with the configured filter
    fn initialize_logging(logging: &LoggingSettings) {
        let result = env_logger::Builder::new()
            .parse_filters(&logging.level)
            .try_init();
        if result.is_err() {
            log::debug!("Logger already initialized, keeping existing configuration");
        }
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `AUTHFLOW_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::load_file(default_config_path)?;
            log::info!("✓ Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("AUTHFLOW_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::load_file(&secrets_path)?;
                log::info!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ℹ AUTHFLOW_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        if let Ok(client_url) = std::env::var("CLIENT_URL") {
            settings.client.client_url = client_url;
        }
        Self::apply_backend_env_overrides(&mut settings.backend);
        Self::apply_parsed_env_override(
            "AUTO_REFRESH_TOKEN",
            &mut settings.session.auto_refresh_token,
        );
        Self::apply_parsed_env_override(
            "REFRESH_MARGIN_SECONDS",
            &mut settings.session.refresh_margin_seconds,
        );
        Self::apply_parsed_env_override(
            "MIN_PASSWORD_LENGTH",
            &mut settings.credentials.min_password_length,
        );
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            settings.logging.level = log_level;
        }
    }

    /// Apply environment overrides for backend settings
    fn apply_backend_env_overrides(backend: &mut BackendSettings) {
        let overrides = [
            ("BACKEND_URL", &mut backend.backend_url),
            ("SUBDOMAIN", &mut backend.subdomain),
            ("REGION", &mut backend.region),
            ("ADMIN_SECRET", &mut backend.admin_secret),
        ];
        for (env_var, target) in overrides {
            if let Ok(value) = std::env::var(env_var) {
                *target = Some(value);
            }
        }
    }

    /// Helper function to apply parsed environment variable overrides
    fn apply_parsed_env_override<T: FromStr>(env_var: &str, target: &mut T) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<T>() {
                *target = value;
            } else {
                log::warn!("Ignoring unparseable {env_var}={value_str}");
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Client URL, if one is configured
    #[must_use]
    pub fn client_url(&self) -> Option<&str> {
        non_empty(Some(self.client.client_url.as_str()))
    }

    /// Resolved backend location
    ///
    /// # Errors
    ///
    /// See [`BackendLocation::from_settings`].
    pub fn backend_location(&self) -> Result<BackendLocation, AuthError> {
        BackendLocation::from_settings(&self.backend)
    }

    /// URL of the auth service
    ///
    /// # Errors
    ///
    /// See [`BackendLocation::from_settings`].
    pub fn auth_url(&self) -> Result<String, AuthError> {
        Ok(self.backend_location()?.service_url("auth"))
    }

    #[must_use]
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::new(self.credentials.min_password_length)
    }

    /// Refresh margin, or `None` when automatic refresh is disabled
    #[must_use]
    pub fn refresh_margin(&self) -> Option<chrono::Duration> {
        self.session.auto_refresh_token.then(|| {
            let seconds = i64::try_from(self.session.refresh_margin_seconds)
                .unwrap_or(i64::MAX)
                .min(i64::MAX / 1000);
            chrono::Duration::seconds(seconds)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "CLIENT_URL",
            "BACKEND_URL",
            "SUBDOMAIN",
            "REGION",
            "ADMIN_SECRET",
            "AUTO_REFRESH_TOKEN",
            "REFRESH_MARGIN_SECONDS",
            "MIN_PASSWORD_LENGTH",
            "AUTHFLOW_SECRETS_DIR",
            "RUST_LOG",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = AuthSettings::default();
        assert_eq!(settings.client_url(), None);
        assert_eq!(settings.password_policy(), PasswordPolicy::new(3));
        assert_eq!(settings.refresh_margin(), Some(chrono::Duration::seconds(300)));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_backend_url_takes_precedence() {
        let backend = BackendSettings {
            backend_url: Some("https://auth.example.com/".to_string()),
            subdomain: Some("ignored".to_string()),
            ..Default::default()
        };

        let location = BackendLocation::from_settings(&backend).unwrap();
        assert_eq!(location.service_url("auth"), "https://auth.example.com/v1/auth");
    }

    #[test]
    fn test_localhost_subdomain() {
        let backend = BackendSettings {
            subdomain: Some("localhost".to_string()),
            ..Default::default()
        };
        assert_eq!(
            BackendLocation::from_settings(&backend).unwrap(),
            BackendLocation::Localhost { port: 1337 }
        );

        let backend = BackendSettings {
            subdomain: Some("localhost:8080".to_string()),
            ..Default::default()
        };
        let location = BackendLocation::from_settings(&backend).unwrap();
        assert_eq!(location.service_url("auth"), "http://localhost:8080/v1/auth");
    }

    #[test]
    fn test_hosted_subdomain_requires_region() {
        let backend = BackendSettings {
            subdomain: Some("ieingiwnginwnfnegqwvdqwdwq".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            BackendLocation::from_settings(&backend),
            Err(AuthError::Configuration(_))
        ));

        let backend = BackendSettings {
            subdomain: Some("ieingiwnginwnfnegqwvdqwdwq".to_string()),
            region: Some("eu-central-1".to_string()),
            ..Default::default()
        };
        let location = BackendLocation::from_settings(&backend).unwrap();
        assert_eq!(
            location.service_url("auth"),
            "https://ieingiwnginwnfnegqwvdqwdwq.auth.eu-central-1.nhost.run/v1"
        );
    }

    #[test]
    fn test_missing_backend_is_a_configuration_error() {
        let settings = AuthSettings::default();
        assert!(matches!(settings.auth_url(), Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_disabled_auto_refresh_has_no_margin() {
        let mut settings = AuthSettings::default();
        settings.session.auto_refresh_token = false;
        assert_eq!(settings.refresh_margin(), None);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env_vars();

        std::env::set_var("CLIENT_URL", "https://frontend.com/main/");
        std::env::set_var("SUBDOMAIN", "localhost:4000");
        std::env::set_var("MIN_PASSWORD_LENGTH", "8");
        std::env::set_var("REFRESH_MARGIN_SECONDS", "not-a-number");

        let mut settings = AuthSettings::default();
        AuthSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.client_url(), Some("https://frontend.com/main/"));
        assert_eq!(settings.auth_url().unwrap(), "http://localhost:4000/v1/auth");
        assert_eq!(settings.password_policy(), PasswordPolicy::new(8));
        // Unparseable values leave the default in place
        assert_eq!(settings.session.refresh_margin_seconds, 300);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_secrets_dir_settings_file() {
        clean_env_vars();

        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("Settings.toml")).unwrap();
        writeln!(
            file,
            r#"
[client]
client_url = "https://frontend.com"

[backend]
subdomain = "myproject"
region = "eu-central-1"

[credentials]
min_password_length = 6
"#
        )
        .unwrap();

        std::env::set_var("AUTHFLOW_SECRETS_DIR", dir.path());
        let settings = AuthSettings::load_base_settings().unwrap();

        assert_eq!(settings.client_url(), Some("https://frontend.com"));
        assert_eq!(
            settings.auth_url().unwrap(),
            "https://myproject.auth.eu-central-1.nhost.run/v1"
        );
        assert_eq!(settings.password_policy(), PasswordPolicy::new(6));
        // Sections missing from the file keep their defaults
        assert!(settings.session.auto_refresh_token);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_combines_file_and_environment() {
        clean_env_vars();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Settings.toml"),
            r#"
[client]
client_url = "https://frontend.com"

[backend]
subdomain = "localhost"
admin_secret = "from-file"

[session]
refresh_margin_seconds = 120
"#,
        )
        .unwrap();

        std::env::set_var("AUTHFLOW_SECRETS_DIR", dir.path());
        std::env::set_var("SUBDOMAIN", "localhost:4000");
        std::env::set_var("ADMIN_SECRET", "from-env");
        std::env::set_var("RUST_LOG", "authflow=debug");

        let settings = AuthSettings::load().unwrap();

        assert_eq!(settings.client_url(), Some("https://frontend.com"));
        assert_eq!(settings.auth_url().unwrap(), "http://localhost:4000/v1/auth");
        assert_eq!(settings.backend.admin_secret.as_deref(), Some("from-env"));
        assert_eq!(settings.refresh_margin(), Some(chrono::Duration::seconds(120)));
        assert_eq!(settings.password_policy(), PasswordPolicy::new(3));
        assert_eq!(settings.logging.level, "authflow=debug");

        // Loading twice keeps the logger installed by the first call
        assert!(AuthSettings::load().is_ok());

        clean_env_vars();
    }

    #[test]
    fn test_invalid_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Settings.toml");
        std::fs::write(&path, "[credentials]\nmin_password_length = \"six\"\n").unwrap();

        assert!(AuthSettings::load_file(&path).is_err());
    }
}
