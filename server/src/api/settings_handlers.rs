use axum::{extract::State, response::Json};

use crate::settings::FrontendSettings;

use super::{ApiErr, AppState, jwt::CurrentUser};

pub async fn get_frontend_settings(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<FrontendSettings>, ApiErr> {
    let settings = state.assembler.assemble(&user).await.map_err(|e| {
        tracing::error!(org_id = user.org_id, error = %e, "failed to assemble frontend settings");
        ApiErr::internal(e)
    })?;

    Ok(Json(settings))
}
