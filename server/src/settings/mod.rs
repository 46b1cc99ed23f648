//! Builds the settings object a frontend loads at bootstrap.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::context::RequestUser;
use crate::datasources::{
    self, DataSourcePermissionFilter, DataSourceResolver, FilterOutcome, PermissionError,
    TypeOverrides,
};
use crate::licensing::Licensing;
use crate::panels::PanelCatalog;
use crate::plugins::{PluginCatalog, PluginError};

pub mod payload;

pub use payload::{BuildInfo, FrontendSettings, LicenseInfo};

/// Shown as the default data source when the org has none flagged default.
pub const FALLBACK_DEFAULT_DATASOURCE: &str = "-- Grafana --";

#[derive(Debug)]
pub enum SettingsError {
    Query(sea_orm::DbErr),
    Permission(PermissionError),
    Plugins(PluginError),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Query(e) => write!(f, "Failed to load data sources: {e}"),
            SettingsError::Permission(e) => write!(f, "{e}"),
            SettingsError::Plugins(e) => write!(f, "Failed to load plugins: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

pub struct SettingsAssembler {
    db: DatabaseConnection,
    config: Arc<Config>,
    master_key: [u8; 32],
    plugins: Arc<dyn PluginCatalog>,
    permissions: Arc<dyn DataSourcePermissionFilter>,
    licensing: Arc<dyn Licensing>,
    overrides: Arc<TypeOverrides>,
}

impl SettingsAssembler {
    pub fn new(
        db: DatabaseConnection,
        config: Arc<Config>,
        master_key: [u8; 32],
        plugins: Arc<dyn PluginCatalog>,
        permissions: Arc<dyn DataSourcePermissionFilter>,
        licensing: Arc<dyn Licensing>,
    ) -> Self {
        Self {
            db,
            config,
            master_key,
            plugins,
            permissions,
            licensing,
            overrides: Arc::new(TypeOverrides::default()),
        }
    }

    pub fn with_overrides(mut self, overrides: Arc<TypeOverrides>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Assemble the settings for `user`. Either the whole object is built or
    /// the first fatal error is returned.
    pub async fn assemble(&self, user: &RequestUser) -> Result<FrontendSettings, SettingsError> {
        let cfg = &*self.config;

        let org_data_sources = if user.org_id == 0 {
            Vec::new()
        } else {
            let all = datasources::find_by_org(&self.db, user.org_id)
                .await
                .map_err(SettingsError::Query)?;

            match self
                .permissions
                .filter(user, &all)
                .await
                .map_err(SettingsError::Permission)?
            {
                FilterOutcome::Filtered(visible) => visible,
                FilterOutcome::Unavailable => all,
            }
        };

        let enabled = self
            .plugins
            .enabled_plugins(user.org_id)
            .await
            .map_err(SettingsError::Plugins)?;

        let built_ins = self.plugins.built_in_data_sources();
        let resolved = DataSourceResolver::new(&self.master_key, &self.overrides).resolve(
            &enabled,
            &built_ins,
            &org_data_sources,
        );

        let mut plugins_to_preload = resolved.plugins_to_preload;
        let panels = PanelCatalog::new(cfg.plugins_enable_alpha)
            .build(&enabled.panels, &mut plugins_to_preload);

        let default_datasource = if resolved.default_data_source.is_empty() {
            FALLBACK_DEFAULT_DATASOURCE.to_string()
        } else {
            resolved.default_data_source
        };

        let hide_version = cfg.anonymous_hide_version && !user.is_signed_in;
        let (version, commit, buildstamp) = if hide_version {
            (String::new(), String::new(), 0)
        } else {
            (
                cfg.build.version.clone(),
                cfg.build.commit.clone(),
                cfg.build.buildstamp,
            )
        };
        let update = self.plugins.update_info(&cfg.build.version);

        tracing::debug!(
            org_id = user.org_id,
            datasources = resolved.data_sources.len(),
            panels = panels.len(),
            preload = plugins_to_preload.len(),
            "assembled frontend settings"
        );

        Ok(FrontendSettings {
            default_datasource,
            datasources: resolved.data_sources,
            min_refresh_interval: cfg.min_refresh_interval.clone(),
            panels,
            app_url: cfg.app_url.clone(),
            app_sub_url: cfg.app_sub_url.clone(),
            allow_org_create: (cfg.allow_user_org_create && user.is_signed_in)
                || user.is_server_admin,
            auth_proxy_enabled: cfg.auth_proxy_enabled,
            ldap_enabled: cfg.ldap_enabled,
            alerting_enabled: cfg.alerting_enabled,
            alerting_error_or_timeout: cfg.alerting_error_or_timeout.clone(),
            alerting_no_data_or_null_values: cfg.alerting_no_data_or_null_values.clone(),
            alerting_min_interval: cfg.alerting_min_interval,
            auto_assign_org: cfg.auto_assign_org,
            verify_email_enabled: cfg.verify_email_enabled,
            explore_enabled: cfg.explore_enabled,
            google_analytics_id: cfg.google_analytics_id.clone(),
            disable_login_form: cfg.disable_login_form,
            disable_user_sign_up: !cfg.allow_user_sign_up,
            login_hint: cfg.login_hint.clone(),
            password_hint: cfg.password_hint.clone(),
            external_user_mng_info: cfg.external_user_mng_info.clone(),
            external_user_mng_link_url: cfg.external_user_mng_link_url.clone(),
            external_user_mng_link_name: cfg.external_user_mng_link_name.clone(),
            viewers_can_edit: cfg.viewers_can_edit,
            editors_can_admin: cfg.editors_can_admin,
            disable_sanitize_html: cfg.disable_sanitize_html,
            plugins_to_preload,
            build_info: BuildInfo {
                hide_version,
                version,
                commit,
                buildstamp,
                edition: self.licensing.edition(),
                latest_version: update.latest_version,
                has_update: update.has_update,
                env: cfg.build.env.clone(),
                is_enterprise: self.licensing.has_valid_license(),
            },
            license_info: LicenseInfo {
                has_license: self.licensing.has_license(),
                expiry: self.licensing.expiry(),
                state_info: self.licensing.state_info(),
                license_url: self.licensing.license_url(user),
            },
            feature_toggles: cfg.feature_toggles.clone(),
            renderer_available: cfg.renderer_url.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::{AssignmentPermissionFilter, NewDataSource, NoPermissionFilter};
    use crate::entity::data_source::{self, Access};
    use crate::licensing::OssLicensing;
    use crate::plugins::registry::parse_manifest;
    use crate::plugins::{DbPluginCatalog, PluginRegistry};
    use async_trait::async_trait;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use uuid::Uuid;

    const KEY: [u8; 32] = [8u8; 32];

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn registry() -> Arc<PluginRegistry> {
        let manifest = parse_manifest(
            r#"{
                "apps": [{"id": "app", "name": "App", "module": "plugins/app/module", "preload": true, "autoEnabled": true}],
                "panels": [
                    {"id": "piechart", "name": "Pie", "module": "plugins/piechart/module", "preload": true},
                    {"id": "experimental", "name": "Exp", "module": "plugins/exp/module", "state": "alpha"}
                ]
            }"#,
        )
        .unwrap();
        Arc::new(PluginRegistry::core().merge(manifest))
    }

    fn assembler(db: DatabaseConnection, config: Config) -> SettingsAssembler {
        SettingsAssembler::new(
            db.clone(),
            Arc::new(config),
            KEY,
            Arc::new(DbPluginCatalog::new(registry(), db)),
            Arc::new(NoPermissionFilter),
            Arc::new(OssLicensing::new("")),
        )
    }

    async fn add(db: &DatabaseConnection, org_id: i64, name: &str, ds_type: &str, is_default: bool) -> data_source::Model {
        let mut input = NewDataSource::new(org_id, name, ds_type);
        input.url = "http://prom:9090".to_string();
        input.is_default = is_default;
        datasources::create(db, &KEY, input).await.unwrap()
    }

    #[tokio::test]
    async fn end_to_end_prometheus_default() {
        let db = setup_db().await;
        let prod = add(&db, 1, "prod", "prometheus", true).await;

        let user = RequestUser::signed_in(Uuid::now_v7(), "alice", 1);
        let settings = assembler(db, Config::default()).assemble(&user).await.unwrap();

        assert_eq!(settings.default_datasource, "prod");
        let entry = &settings.datasources["prod"];
        assert_eq!(entry.url, Some(format!("/api/datasources/proxy/{}", prod.id)));
        assert_eq!(entry.json_data.as_ref().unwrap()["directUrl"], "http://prom:9090");
        assert!(settings.datasources.contains_key("-- Grafana --"));
        assert!(settings.datasources.contains_key("-- Mixed --"));
    }

    #[tokio::test]
    async fn org_zero_has_only_built_ins() {
        let db = setup_db().await;
        add(&db, 1, "prod", "prometheus", true).await;

        let settings = assembler(db, Config::default())
            .assemble(&RequestUser::anonymous(0))
            .await
            .unwrap();

        assert_eq!(settings.default_datasource, FALLBACK_DEFAULT_DATASOURCE);
        assert!(!settings.datasources.contains_key("prod"));
        assert!(settings.datasources.values().all(|d| d.meta.built_in));
    }

    #[tokio::test]
    async fn records_of_other_orgs_are_ignored() {
        let db = setup_db().await;
        add(&db, 2, "theirs", "prometheus", true).await;

        let settings = assembler(db, Config::default())
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap();
        assert!(!settings.datasources.contains_key("theirs"));
        assert_eq!(settings.default_datasource, FALLBACK_DEFAULT_DATASOURCE);
    }

    #[tokio::test]
    async fn preload_order_and_alpha_panels() {
        let db = setup_db().await;
        let settings = assembler(db.clone(), Config::default())
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap();

        assert_eq!(
            settings.plugins_to_preload,
            vec!["plugins/app/module".to_string(), "plugins/piechart/module".to_string()]
        );
        assert!(!settings.panels.contains_key("experimental"));
        assert_eq!(settings.panels["graph"].sort, 1);
        assert_eq!(settings.panels["piechart"].sort, 100);

        let alpha = Config {
            plugins_enable_alpha: true,
            ..Config::default()
        };
        let settings = assembler(db, alpha)
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap();
        assert!(settings.panels.contains_key("experimental"));
    }

    #[tokio::test]
    async fn hide_version_for_anonymous() {
        let db = setup_db().await;
        let mut config = Config::default();
        config.anonymous_hide_version = true;
        config.build.commit = "abc123".to_string();
        config.build.buildstamp = 1_570_000_000;
        let assembler = assembler(db, config);

        let anon = assembler.assemble(&RequestUser::anonymous(1)).await.unwrap();
        assert!(anon.build_info.hide_version);
        assert_eq!(anon.build_info.version, "");
        assert_eq!(anon.build_info.commit, "");
        assert_eq!(anon.build_info.buildstamp, 0);

        let user = RequestUser::signed_in(Uuid::now_v7(), "alice", 1);
        let signed = assembler.assemble(&user).await.unwrap();
        assert!(!signed.build_info.hide_version);
        assert_eq!(signed.build_info.commit, "abc123");
        assert_eq!(signed.build_info.buildstamp, 1_570_000_000);
    }

    #[tokio::test]
    async fn allow_org_create_rules() {
        let db = setup_db().await;
        let config = Config {
            allow_user_org_create: true,
            ..Config::default()
        };
        let assembler = assembler(db, config);

        let anon = assembler.assemble(&RequestUser::anonymous(1)).await.unwrap();
        assert!(!anon.allow_org_create);

        let user = RequestUser::signed_in(Uuid::now_v7(), "alice", 1);
        assert!(assembler.assemble(&user).await.unwrap().allow_org_create);

        let db = setup_db().await;
        let strict = super::tests::assembler(db, Config::default());
        let admin = RequestUser::signed_in(Uuid::now_v7(), "root", 1).with_server_admin(true);
        let out = strict.assemble(&admin).await.unwrap();
        assert!(out.allow_org_create);
        assert_eq!(out.license_info.license_url, "/admin/upgrading");
    }

    #[tokio::test]
    async fn permission_filter_is_applied() {
        let db = setup_db().await;
        add(&db, 1, "open", "prometheus", false).await;
        let secret = add(&db, 1, "secret", "prometheus", true).await;
        datasources::grant(&db, secret.id, Uuid::now_v7()).await.unwrap();

        let assembler = assembler(db.clone(), Config::default());
        let filtered = SettingsAssembler {
            permissions: Arc::new(AssignmentPermissionFilter::new(db)),
            ..assembler
        };

        let user = RequestUser::signed_in(Uuid::now_v7(), "bob", 1);
        let out = filtered.assemble(&user).await.unwrap();
        assert!(out.datasources.contains_key("open"));
        assert!(!out.datasources.contains_key("secret"));
        assert_eq!(out.default_datasource, FALLBACK_DEFAULT_DATASOURCE);
    }

    struct FailingFilter;

    #[async_trait]
    impl DataSourcePermissionFilter for FailingFilter {
        async fn filter(
            &self,
            _user: &RequestUser,
            _data_sources: &[data_source::Model],
        ) -> Result<FilterOutcome, PermissionError> {
            Err(PermissionError::Db(sea_orm::DbErr::Custom("boom".to_string())))
        }
    }

    #[tokio::test]
    async fn filter_failure_is_fatal() {
        let db = setup_db().await;
        add(&db, 1, "prod", "prometheus", true).await;

        let failing = SettingsAssembler {
            permissions: Arc::new(FailingFilter),
            ..assembler(db, Config::default())
        };
        let err = failing
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Permission(_)));
    }

    #[tokio::test]
    async fn filter_not_consulted_for_org_zero() {
        let db = setup_db().await;
        let failing = SettingsAssembler {
            permissions: Arc::new(FailingFilter),
            ..assembler(db, Config::default())
        };
        assert!(failing.assemble(&RequestUser::anonymous(0)).await.is_ok());
    }

    #[tokio::test]
    async fn direct_influx_credentials_in_payload() {
        let db = setup_db().await;
        let mut input = NewDataSource::new(1, "influx", "influxdb");
        input.access = Access::Direct;
        input.url = "http://influx:8086".to_string();
        input.database = "metrics".to_string();
        input.user = "reader".to_string();
        input.password = Some("pw".to_string());
        datasources::create(&db, &KEY, input).await.unwrap();

        let settings = assembler(db, Config::default())
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        let influx = &json["datasources"]["influx"];

        assert_eq!(influx["url"], "http://influx:8086");
        assert_eq!(influx["username"], "reader");
        assert_eq!(influx["password"], "pw");
        assert_eq!(influx["database"], "metrics");
    }

    #[tokio::test]
    async fn payload_keys() {
        let db = setup_db().await;
        let mut config = Config::default();
        config.feature_toggles.insert("live".to_string(), true);
        config.renderer_url = Some("http://renderer:8081/render".to_string());

        let settings = assembler(db, config)
            .assemble(&RequestUser::anonymous(1))
            .await
            .unwrap();
        let json = serde_json::to_value(&settings).unwrap();

        assert_eq!(json["defaultDatasource"], FALLBACK_DEFAULT_DATASOURCE);
        assert_eq!(json["verfiyEmailEnabled"], false);
        assert_eq!(json["disableUserSignUp"], true);
        assert_eq!(json["featureToggles"]["live"], true);
        assert_eq!(json["rendererAvailable"], true);
        assert_eq!(json["buildInfo"]["edition"], "Open Source");
        assert_eq!(json["buildInfo"]["isEnterprise"], false);
        assert_eq!(json["licenseInfo"]["hasLicense"], false);
        assert_eq!(json["minRefreshInterval"], "5s");
        assert!(json["pluginsToPreload"].is_array());
    }
}
