//! Board membership and user profiles.

pub mod model;

pub use model::{Member, Profile};

use std::collections::HashMap;

use serde_json::json;

use kanban_db::profiles::{self, ProfileRow};
use kanban_db::{members, DbPool};

use crate::access::{self, Role};
use crate::activity;
use crate::error::{required, KanbanError, KanbanResult};

/// Return the profile of `user_id`, creating it on first sight.
pub async fn ensure_profile(
    pool: &DbPool,
    user_id: &str,
    email: Option<&str>,
    display_name: Option<&str>,
) -> KanbanResult<Profile> {
    if let Some(row) = profiles::get_profiles(pool, &[user_id.to_string()]).await?.pop() {
        return Ok(row.into());
    }

    let display_name = display_name
        .map(str::to_string)
        .or_else(|| email.and_then(|e| e.split('@').next()).map(str::to_string))
        .unwrap_or_else(|| "User".to_string());
    let row = ProfileRow {
        id: user_id.to_string(),
        display_name,
        avatar_url: None,
        email: email.map(str::to_string),
    };
    tracing::debug!(user_id, "Creating profile");
    Ok(profiles::upsert_profile(pool, &row).await?.into())
}

/// Fetch a single profile.
pub async fn get_profile(pool: &DbPool, user_id: &str) -> KanbanResult<Profile> {
    match profiles::get_profiles(pool, &[user_id.to_string()]).await?.pop() {
        Some(row) => Ok(row.into()),
        None => Err(KanbanError::UserNotFound(user_id.to_string())),
    }
}

pub(crate) async fn profiles_by_id(pool: &DbPool, user_ids: &[String]) -> KanbanResult<HashMap<String, Profile>> {
    let rows = profiles::get_profiles(pool, user_ids).await?;
    Ok(rows.into_iter().map(|row| (row.id.clone(), Profile::from(row))).collect())
}

/// Members of a board. The creator is always listed, as owner, first.
pub async fn list_members(pool: &DbPool, user_id: &str, board_id: &str) -> KanbanResult<Vec<Member>> {
    let access = access::authorize_read(pool, board_id, user_id).await?;
    board_members(pool, &access.board.id, &access.board.created_by).await
}

pub(crate) async fn board_members(pool: &DbPool, board_id: &str, created_by: &str) -> KanbanResult<Vec<Member>> {
    let rows = members::list_members(pool, board_id).await?;
    let mut ids: Vec<String> = rows.iter().map(|m| m.user_id.clone()).collect();
    ids.push(created_by.to_string());
    let profiles = profiles_by_id(pool, &ids).await?;

    let mut result: Vec<Member> = rows
        .into_iter()
        .filter_map(|row| {
            let profile = profiles.get(&row.user_id)?.clone();
            let role = Role::from_str(&row.role).unwrap_or(Role::Viewer);
            Some(Member { profile, role })
        })
        .collect();

    if !result.iter().any(|m| m.profile.id == created_by) {
        if let Some(creator) = profiles.get(created_by) {
            result.insert(
                0,
                Member {
                    profile: creator.clone(),
                    role: Role::Owner,
                },
            );
        }
    }
    Ok(result)
}

/// Invite the user registered under `email` as an editor.
pub async fn add_member(pool: &DbPool, user_id: &str, board_id: &str, email: &str) -> KanbanResult<Member> {
    let email = required("Email", email)?;
    let access = access::authorize_read(pool, board_id, user_id).await?;
    access.require_member_management()?;

    let invitee = profiles::find_profile_by_email(pool, &email)
        .await?
        .ok_or_else(|| KanbanError::UserNotFound(email.clone()))?;
    if invitee.id == user_id {
        return Err(KanbanError::validation("Cannot invite yourself"));
    }

    let role = Role::Editor;
    if let Err(e) = members::add_member(pool, board_id, &invitee.id, role.as_str()).await {
        return Err(match KanbanError::from(e) {
            KanbanError::Conflict(_) => KanbanError::Conflict("User is already a member".to_string()),
            other => other,
        });
    }

    activity::record(
        pool,
        board_id,
        user_id,
        "member.added",
        json!({ "member_id": invitee.id, "email": email, "role": role.as_str() }),
    )
    .await;

    tracing::info!(board_id, member_id = %invitee.id, "Member added");
    Ok(Member {
        profile: invitee.into(),
        role,
    })
}

/// Remove a member. Returns the removed member's user id.
pub async fn remove_member(pool: &DbPool, user_id: &str, board_id: &str, member_id: &str) -> KanbanResult<String> {
    let member_id = required("Member ID", member_id)?;
    let access = access::authorize_read(pool, board_id, user_id).await?;
    access.require_member_management()?;

    if member_id == user_id {
        return Err(KanbanError::validation("Cannot remove yourself from the board"));
    }

    members::remove_member(pool, board_id, &member_id).await?;

    activity::record(pool, board_id, user_id, "member.removed", json!({ "member_id": member_id })).await;

    tracing::info!(board_id, member_id = %member_id, "Member removed");
    Ok(member_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_db::boards::{self, Visibility};

    async fn setup() -> (DbPool, String) {
        let pool = kanban_db::in_memory();
        ensure_profile(&pool, "owner", Some("owner@example.com"), Some("Olive")).await.unwrap();
        ensure_profile(&pool, "guest", Some("guest@example.com"), None).await.unwrap();
        let board = boards::create_board(&pool, "Team", Visibility::Workspace, None, "owner")
            .await
            .unwrap();
        (pool, board.id)
    }

    #[tokio::test]
    async fn test_ensure_profile_defaults_name_from_email() {
        let pool = kanban_db::in_memory();
        let profile = ensure_profile(&pool, "u1", Some("sam@example.com"), None).await.unwrap();
        assert_eq!(profile.display_name, "sam");

        // Existing profile is returned untouched.
        let again = ensure_profile(&pool, "u1", None, Some("Other")).await.unwrap();
        assert_eq!(again.display_name, "sam");
    }

    #[tokio::test]
    async fn test_creator_listed_as_owner() {
        let (pool, board_id) = setup().await;
        let members = list_members(&pool, "owner", &board_id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].profile.id, "owner");
        assert_eq!(members[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn test_add_and_remove_member() {
        let (pool, board_id) = setup().await;

        let member = add_member(&pool, "owner", &board_id, "guest@example.com").await.unwrap();
        assert_eq!(member.profile.id, "guest");
        assert_eq!(member.role, Role::Editor);

        assert!(matches!(
            add_member(&pool, "owner", &board_id, "guest@example.com").await,
            Err(KanbanError::Conflict(_))
        ));
        assert_eq!(list_members(&pool, "owner", &board_id).await.unwrap().len(), 2);

        assert_eq!(remove_member(&pool, "owner", &board_id, "guest").await.unwrap(), "guest");
        assert!(matches!(
            remove_member(&pool, "owner", &board_id, "guest").await,
            Err(KanbanError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invite_rules() {
        let (pool, board_id) = setup().await;

        assert!(matches!(
            add_member(&pool, "owner", &board_id, "owner@example.com").await,
            Err(KanbanError::ValidationError(_))
        ));
        assert!(matches!(
            add_member(&pool, "owner", &board_id, "nobody@example.com").await,
            Err(KanbanError::UserNotFound(_))
        ));
        assert!(matches!(
            add_member(&pool, "guest", &board_id, "owner@example.com").await,
            Err(KanbanError::Forbidden(_))
        ));
        assert!(matches!(
            remove_member(&pool, "owner", &board_id, "owner").await,
            Err(KanbanError::ValidationError(_))
        ));
    }
}
