//! Wire shape of the bootstrap settings. Keys may be added; existing keys keep
//! their name and type.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::datasources::ResolvedDataSource;
use crate::panels::PanelDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendSettings {
    pub default_datasource: String,
    pub datasources: BTreeMap<String, ResolvedDataSource>,
    pub min_refresh_interval: String,
    pub panels: BTreeMap<String, PanelDescriptor>,
    pub app_url: String,
    pub app_sub_url: String,
    pub allow_org_create: bool,
    pub auth_proxy_enabled: bool,
    pub ldap_enabled: bool,
    pub alerting_enabled: bool,
    pub alerting_error_or_timeout: String,
    pub alerting_no_data_or_null_values: String,
    pub alerting_min_interval: i64,
    pub auto_assign_org: bool,
    // misspelled on the wire, frontends read this exact key
    #[serde(rename = "verfiyEmailEnabled")]
    pub verify_email_enabled: bool,
    pub explore_enabled: bool,
    pub google_analytics_id: String,
    pub disable_login_form: bool,
    pub disable_user_sign_up: bool,
    pub login_hint: String,
    pub password_hint: String,
    pub external_user_mng_info: String,
    pub external_user_mng_link_url: String,
    pub external_user_mng_link_name: String,
    pub viewers_can_edit: bool,
    pub editors_can_admin: bool,
    pub disable_sanitize_html: bool,
    pub plugins_to_preload: Vec<String>,
    pub build_info: BuildInfo,
    pub license_info: LicenseInfo,
    pub feature_toggles: BTreeMap<String, bool>,
    pub renderer_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub hide_version: bool,
    pub version: String,
    pub commit: String,
    pub buildstamp: i64,
    pub edition: String,
    pub latest_version: String,
    pub has_update: bool,
    pub env: String,
    pub is_enterprise: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    pub has_license: bool,
    pub expiry: i64,
    pub state_info: String,
    pub license_url: String,
}
