use uuid::Uuid;

/// The caller a settings payload is built for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestUser {
    /// `None` for anonymous callers.
    pub user_id: Option<Uuid>,
    pub login: String,
    /// 0 means "no organization": no data sources are loaded.
    pub org_id: i64,
    pub is_signed_in: bool,
    pub is_server_admin: bool,
}

impl RequestUser {
    pub fn anonymous(org_id: i64) -> Self {
        Self {
            org_id,
            ..Default::default()
        }
    }

    pub fn signed_in(user_id: Uuid, login: impl Into<String>, org_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            login: login.into(),
            org_id,
            is_signed_in: true,
            is_server_admin: false,
        }
    }

    pub fn with_server_admin(mut self, is_server_admin: bool) -> Self {
        self.is_server_admin = is_server_admin;
        self
    }
}
