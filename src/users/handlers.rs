use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AdminLoginUser, BuddyUpdate, LoginRequest, LoginResponse, LoginUser, LookupQuery,
        LookupResponse, MessageResponse, PatchByNameRequest, ProfileUpdate, SignupRequest,
        TaskRequest, UserMessageResponse, UserSummary,
    },
    repo_types::{NewTask, User, UserUpdate},
    services::{authenticate, check_admin_update, issue_token, parse_datetime, register},
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::{ApiError, ApiResult},
    extract::{parse_id, present, ApiJson},
    state::AppState,
};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup).patch(patch_buddy))
        .route("/me", get(get_me).put(update_me))
        .route("/me/tasks", post(add_task))
        .route("/update/:id", put(update_by_id))
        .route("/delete/:id", delete(delete_by_id))
        .route("/login", post(login).get(lookup).patch(patch_login))
        .route("/loginAdmin", post(login_admin))
        .route("/alluser", get(list_users))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

#[instrument(skip(state, admin, payload))]
pub async fn signup(
    State(state): State<AppState>,
    admin: Result<AdminUser, ApiError>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    // Anonymous and non-admin callers may still sign up; a failed lookup may not.
    let caller_is_admin = match admin {
        Ok(_) => true,
        Err(ApiError::Internal(e)) => return Err(ApiError::Internal(e)),
        Err(_) => false,
    };
    let user = register(&state, payload, caller_is_admin).await?;
    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".into(),
        }),
    ))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

#[instrument(skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let update: UserUpdate = payload.into();
    let user = state
        .users
        .update(claims.sub, &update)
        .await?
        .ok_or_else(user_not_found)?;
    info!("profile updated");
    Ok(Json(user))
}

#[instrument(skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn add_task(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<TaskRequest>,
) -> ApiResult<Json<User>> {
    let (Some(title), Some(datetime)) = (present(payload.title), present(payload.datetime)) else {
        return Err(ApiError::BadRequest("Title and datetime required".into()));
    };
    let datetime = parse_datetime(&datetime)?;

    let user = state
        .users
        .push_task(claims.sub, NewTask { title, datetime })
        .await?
        .ok_or_else(user_not_found)?;
    info!(tasks = user.tasks.len(), "task added");
    Ok(Json(user))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn update_by_id(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(mut payload): ApiJson<UserUpdate>,
) -> ApiResult<Json<UserMessageResponse<User>>> {
    let id = parse_id(&id)?;
    check_admin_update(&mut payload)?;

    let user = state
        .users
        .update(id, &payload)
        .await?
        .ok_or_else(user_not_found)?;
    info!(user_id = %user.id, "user updated by admin");
    Ok(Json(UserMessageResponse {
        message: "User updated successfully".into(),
        user,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_by_id(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserMessageResponse<User>>> {
    let id = parse_id(&id)?;
    let user = state.users.delete(id).await?.ok_or_else(user_not_found)?;
    info!(user_id = %user.id, "user deleted by admin");
    Ok(Json(UserMessageResponse {
        message: "User deleted successfully".into(),
        user,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse<LoginUser>>> {
    let user = authenticate(&state, payload.name, payload.password).await?;
    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Logged in".into(),
        token,
        user: LoginUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse<AdminLoginUser>>> {
    let user = authenticate(&state, payload.name, payload.password).await?;
    if !user.is_admin() {
        warn!(user_id = %user.id, "admin login by non-admin");
        return Err(ApiError::Forbidden("Only ADMIN accounts can sign in here".into()));
    }
    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, "admin logged in");
    Ok(Json(LoginResponse {
        message: "Logged in".into(),
        token,
        user: AdminLoginUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<LookupResponse>> {
    let name = present(query.name).ok_or_else(|| ApiError::BadRequest("name is required".into()))?;
    let user = state
        .users
        .find_by_name(&name)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(LookupResponse {
        user: LoginUser::from(&user),
    }))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn patch_login(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<PatchByNameRequest>,
) -> ApiResult<Json<UserMessageResponse<LoginUser>>> {
    let (Some(name), Some(mut updates)) = (present(payload.name), payload.updates) else {
        return Err(ApiError::BadRequest("name and updates are required".into()));
    };
    check_admin_update(&mut updates)?;

    let user = state
        .users
        .update_by_name(&name, &updates)
        .await?
        .ok_or_else(user_not_found)?;
    info!(user_id = %user.id, "user updated by name");
    Ok(Json(UserMessageResponse {
        message: "User updated".into(),
        user: LoginUser::from(&user),
    }))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn patch_buddy(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<BuddyUpdate>,
) -> ApiResult<Json<UserMessageResponse<User>>> {
    let name = present(payload.name).ok_or_else(|| ApiError::BadRequest("name is required".into()))?;
    let update = UserUpdate {
        buddy_url: payload.buddy_url,
        buddy_name: payload.buddy_name,
        ..Default::default()
    };

    let user = state
        .users
        .update_by_name(&name, &update)
        .await?
        .ok_or_else(user_not_found)?;
    info!(user_id = %user.id, "buddy updated");
    Ok(Json(UserMessageResponse {
        message: "Buddy updated".into(),
        user,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = state.users.list_accounts().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}
