use crate::context::RequestUser;

const ENTERPRISE_URL: &str = "https://grafana.com/products/enterprise/?utm_source=grafana_footer";

/// License/entitlement state shown in the frontend.
pub trait Licensing: Send + Sync {
    fn edition(&self) -> String;
    fn has_valid_license(&self) -> bool;
    fn has_license(&self) -> bool;
    /// Unix seconds, 0 when unlicensed.
    fn expiry(&self) -> i64;
    fn state_info(&self) -> String;
    fn license_url(&self, user: &RequestUser) -> String;
}

/// Open-source build: never licensed.
pub struct OssLicensing {
    app_sub_url: String,
}

impl OssLicensing {
    pub fn new(app_sub_url: impl Into<String>) -> Self {
        Self {
            app_sub_url: app_sub_url.into(),
        }
    }
}

impl Licensing for OssLicensing {
    fn edition(&self) -> String {
        "Open Source".to_string()
    }

    fn has_valid_license(&self) -> bool {
        false
    }

    fn has_license(&self) -> bool {
        false
    }

    fn expiry(&self) -> i64 {
        0
    }

    fn state_info(&self) -> String {
        String::new()
    }

    fn license_url(&self, user: &RequestUser) -> String {
        if user.is_server_admin {
            format!("{}/admin/upgrading", self.app_sub_url)
        } else {
            ENTERPRISE_URL.to_string()
        }
    }
}
