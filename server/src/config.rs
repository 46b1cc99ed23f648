//! Server configuration exposed to the frontend.
//!
//! Read once at startup from `FS_*` environment variables (a `.env` file is
//! honored by `main`) and threaded through the assembler as `Arc<Config>`.

use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    InvalidBool { key: String, value: String },
    InvalidNumber { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidBool { key, value } => {
                write!(f, "{key}: expected true/false, got '{value}'")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key}: expected an integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Build stamps of the running binary.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub version: String,
    pub commit: String,
    /// Unix seconds.
    pub buildstamp: i64,
    /// `production` or `development`.
    pub env: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: "unknown-dev".to_string(),
            buildstamp: 0,
            env: "production".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub build: BuildConfig,

    pub app_url: String,
    pub app_sub_url: String,
    pub min_refresh_interval: String,

    // users
    pub allow_user_sign_up: bool,
    pub allow_user_org_create: bool,
    pub auto_assign_org: bool,
    pub verify_email_enabled: bool,
    pub viewers_can_edit: bool,
    pub editors_can_admin: bool,
    pub login_hint: String,
    pub password_hint: String,
    pub external_user_mng_info: String,
    pub external_user_mng_link_url: String,
    pub external_user_mng_link_name: String,

    // auth
    pub disable_login_form: bool,
    pub auth_proxy_enabled: bool,
    pub ldap_enabled: bool,
    pub anonymous_enabled: bool,
    pub anonymous_org_id: i64,
    pub anonymous_hide_version: bool,

    // alerting
    pub alerting_enabled: bool,
    pub alerting_error_or_timeout: String,
    pub alerting_no_data_or_null_values: String,
    pub alerting_min_interval: i64,

    pub explore_enabled: bool,
    pub google_analytics_id: String,
    pub disable_sanitize_html: bool,
    pub feature_toggles: BTreeMap<String, bool>,

    // plugins
    pub plugins_enable_alpha: bool,
    pub plugins_manifest: Option<PathBuf>,
    pub datasource_permissions: bool,

    /// Remote image renderer; rendering is available when set.
    pub renderer_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            app_url: "http://localhost:3000/".to_string(),
            app_sub_url: String::new(),
            min_refresh_interval: "5s".to_string(),
            allow_user_sign_up: false,
            allow_user_org_create: false,
            auto_assign_org: true,
            verify_email_enabled: false,
            viewers_can_edit: false,
            editors_can_admin: false,
            login_hint: "email or username".to_string(),
            password_hint: "password".to_string(),
            external_user_mng_info: String::new(),
            external_user_mng_link_url: String::new(),
            external_user_mng_link_name: String::new(),
            disable_login_form: false,
            auth_proxy_enabled: false,
            ldap_enabled: false,
            anonymous_enabled: false,
            anonymous_org_id: 1,
            anonymous_hide_version: false,
            alerting_enabled: true,
            alerting_error_or_timeout: "alerting".to_string(),
            alerting_no_data_or_null_values: "no_data".to_string(),
            alerting_min_interval: 1,
            explore_enabled: true,
            google_analytics_id: String::new(),
            disable_sanitize_html: false,
            feature_toggles: BTreeMap::new(),
            plugins_enable_alpha: false,
            plugins_manifest: None,
            datasource_permissions: false,
            renderer_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let d = Config::default();

        Ok(Self {
            build: BuildConfig {
                version: env.string("FS_BUILD_VERSION", d.build.version),
                commit: env.string("FS_BUILD_COMMIT", d.build.commit),
                buildstamp: env.int("FS_BUILD_STAMP", d.build.buildstamp)?,
                env: env.string("FS_ENV", d.build.env),
            },
            app_url: env.string("FS_APP_URL", d.app_url),
            app_sub_url: env.string("FS_APP_SUB_URL", d.app_sub_url),
            min_refresh_interval: env.string("FS_MIN_REFRESH_INTERVAL", d.min_refresh_interval),
            allow_user_sign_up: env.bool("FS_ALLOW_USER_SIGN_UP", d.allow_user_sign_up)?,
            allow_user_org_create: env
                .bool("FS_ALLOW_USER_ORG_CREATE", d.allow_user_org_create)?,
            auto_assign_org: env.bool("FS_AUTO_ASSIGN_ORG", d.auto_assign_org)?,
            verify_email_enabled: env.bool("FS_VERIFY_EMAIL_ENABLED", d.verify_email_enabled)?,
            viewers_can_edit: env.bool("FS_VIEWERS_CAN_EDIT", d.viewers_can_edit)?,
            editors_can_admin: env.bool("FS_EDITORS_CAN_ADMIN", d.editors_can_admin)?,
            login_hint: env.string("FS_LOGIN_HINT", d.login_hint),
            password_hint: env.string("FS_PASSWORD_HINT", d.password_hint),
            external_user_mng_info: env
                .string("FS_EXTERNAL_USER_MNG_INFO", d.external_user_mng_info),
            external_user_mng_link_url: env
                .string("FS_EXTERNAL_USER_MNG_LINK_URL", d.external_user_mng_link_url),
            external_user_mng_link_name: env
                .string("FS_EXTERNAL_USER_MNG_LINK_NAME", d.external_user_mng_link_name),
            disable_login_form: env.bool("FS_DISABLE_LOGIN_FORM", d.disable_login_form)?,
            auth_proxy_enabled: env.bool("FS_AUTH_PROXY_ENABLED", d.auth_proxy_enabled)?,
            ldap_enabled: env.bool("FS_LDAP_ENABLED", d.ldap_enabled)?,
            anonymous_enabled: env.bool("FS_ANONYMOUS_ENABLED", d.anonymous_enabled)?,
            anonymous_org_id: env.int("FS_ANONYMOUS_ORG_ID", d.anonymous_org_id)?,
            anonymous_hide_version: env
                .bool("FS_ANONYMOUS_HIDE_VERSION", d.anonymous_hide_version)?,
            alerting_enabled: env.bool("FS_ALERTING_ENABLED", d.alerting_enabled)?,
            alerting_error_or_timeout: env
                .string("FS_ALERTING_ERROR_OR_TIMEOUT", d.alerting_error_or_timeout),
            alerting_no_data_or_null_values: env.string(
                "FS_ALERTING_NODATA_OR_NULLVALUES",
                d.alerting_no_data_or_null_values,
            ),
            alerting_min_interval: env.int("FS_ALERTING_MIN_INTERVAL", d.alerting_min_interval)?,
            explore_enabled: env.bool("FS_EXPLORE_ENABLED", d.explore_enabled)?,
            google_analytics_id: env.string("FS_GOOGLE_ANALYTICS_ID", d.google_analytics_id),
            disable_sanitize_html: env.bool("FS_DISABLE_SANITIZE_HTML", d.disable_sanitize_html)?,
            feature_toggles: env
                .get("FS_FEATURE_TOGGLES")
                .map(|v| parse_feature_toggles(&v))
                .unwrap_or(d.feature_toggles),
            plugins_enable_alpha: env.bool("FS_PLUGINS_ENABLE_ALPHA", d.plugins_enable_alpha)?,
            plugins_manifest: env.get("FS_PLUGINS_MANIFEST").map(PathBuf::from),
            datasource_permissions: env
                .bool("FS_DATASOURCE_PERMISSIONS", d.datasource_permissions)?,
            renderer_url: env.get("FS_RENDERER_URL"),
        })
    }
}

/// `"a, b ,c"` → `{a: true, b: true, c: true}`.
pub fn parse_feature_toggles(raw: &str) -> BTreeMap<String, bool> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| (s.to_string(), true))
        .collect()
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Unset and blank values both count as absent.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: String) -> String {
        self.get(key).unwrap_or(default)
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool {
                    key: key.to_string(),
                    value: v,
                }),
            },
        }
    }

    fn int(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: key.to_string(),
                value: v,
            }),
        }
    }
}
