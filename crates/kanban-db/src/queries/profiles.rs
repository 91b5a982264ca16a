//! User profiles.

use serde::{Deserialize, Serialize};

use super::{decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn get_profile(pool: &DbPool, user_id: &str) -> DbResult<ProfileRow> {
    match pool.select(Table::Profiles, &Filter::by_id(user_id)).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("User: {}", user_id))),
    }
}

pub async fn get_profiles(pool: &DbPool, user_ids: &[String]) -> DbResult<Vec<ProfileRow>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::all().is_in("id", user_ids.iter().map(String::as_str));
    decode_all(pool.select(Table::Profiles, &filter).await?)
}

pub async fn find_profile_by_email(pool: &DbPool, email: &str) -> DbResult<Option<ProfileRow>> {
    let filter = Filter::all().eq("email", email);
    pool.select(Table::Profiles, &filter).await?.pop().map(decode).transpose()
}

/// Insert or refresh a profile.
pub async fn upsert_profile(pool: &DbPool, profile: &ProfileRow) -> DbResult<ProfileRow> {
    let mut rows = pool.upsert(Table::Profiles, vec![encode(profile)?]).await?;
    match rows.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("User: {}", profile.id))),
    }
}
