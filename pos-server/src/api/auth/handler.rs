//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use validator::Validate;

use shared::models::staff::{LoginRequest, LoginResponse, StaffResponse};

use crate::auth::verify_password;
use crate::core::ServerState;
use crate::db::repository::staff;
use crate::security_log;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/login - 用户登录
///
/// 校验用户名/密码，签发 JWT。失败时统一返回
/// "Invalid username or password"，避免用户名枚举。
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    req.validate()?;

    let user = staff::find_by_username(state.pool(), &req.username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Check authentication result - unified error message to prevent username enumeration
    let user = match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            if !verify_password(&req.password, &u.password_hash) {
                security_log!(
                    "WARN",
                    "login_failed",
                    username = req.username.clone(),
                    reason = "invalid_credentials"
                );
                tracing::warn!(username = %req.username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            security_log!(
                "WARN",
                "login_failed",
                username = req.username.clone(),
                reason = "user_not_found"
            );
            tracing::warn!(username = %req.username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    // Generate JWT token
    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.username, &user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        role = %user.role,
        "User logged in successfully"
    );

    Ok(ok(LoginResponse {
        token,
        user: StaffResponse::from(user),
    }))
}
