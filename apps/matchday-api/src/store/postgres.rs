//! Diesel-backed implementations of the store interfaces.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use matchday_common::id::{prefix, prefixed_ulid};

use crate::db::pool::DbPool;
use crate::db::schema::{friendships, notifications, user_matches, users};
use crate::models::friendship::status as friendship_status;
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::User;
use crate::models::user_match::{status as participation_status, UserMatch};

use super::{
    preferences_from_json, NotificationStore, ParticipationStore, RelationshipStore, StoreError,
    UserDirectory,
};

/// Postgres-backed store. One instance implements every store interface.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipationStore for PgStore {
    async fn find_confirmed(
        &self,
        user_id: &str,
        match_id: &str,
    ) -> Result<Option<UserMatch>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<UserMatch> = diesel_async::RunQueryDsl::get_result(
            user_matches::table
                .filter(user_matches::user_id.eq(user_id))
                .filter(user_matches::match_id.eq(match_id))
                .filter(user_matches::participation_status.eq(participation_status::CONFIRMED))
                .select(UserMatch::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row)
    }

    async fn list_confirmed_participants(
        &self,
        match_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.get().await?;

        let ids: Vec<String> = diesel_async::RunQueryDsl::load(
            user_matches::table
                .filter(user_matches::match_id.eq(match_id))
                .filter(user_matches::participation_status.eq(participation_status::CONFIRMED))
                .select(user_matches::user_id),
            &mut conn,
        )
        .await?;

        Ok(ids)
    }
}

#[async_trait]
impl RelationshipStore for PgStore {
    async fn any_blocked_with(
        &self,
        user_id: &str,
        others: &[String],
    ) -> Result<bool, StoreError> {
        if others.is_empty() {
            return Ok(false);
        }

        let mut conn = self.pool.get().await?;

        let row: Option<String> = diesel_async::RunQueryDsl::get_result(
            friendships::table
                .filter(friendships::status.eq(friendship_status::BLOCKED))
                .filter(
                    friendships::sender_id
                        .eq(user_id)
                        .and(friendships::receiver_id.eq_any(others))
                        .or(friendships::receiver_id
                            .eq(user_id)
                            .and(friendships::sender_id.eq_any(others))),
                )
                .select(friendships::id)
                .limit(1),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row.is_some())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<User> = diesel_async::RunQueryDsl::get_result(
            users::table.find(user_id).select(User::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row.map(|user| user.display_name()))
    }

    async fn notification_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<HashMap<String, bool>>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<Option<serde_json::Value>> = diesel_async::RunQueryDsl::get_result(
            users::table
                .find(user_id)
                .select(users::notification_preferences),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row.map(|value| preferences_from_json(value.as_ref())))
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(
        &self,
        user_id: &str,
        kind: &str,
        message: &str,
    ) -> Result<Notification, StoreError> {
        let mut conn = self.pool.get().await?;
        let id = prefixed_ulid(prefix::NOTIFICATION);

        let row: Notification = diesel_async::RunQueryDsl::get_result(
            diesel::insert_into(notifications::table)
                .values(NewNotification {
                    id: &id,
                    user_id,
                    kind,
                    message,
                    is_read: false,
                    is_dismissed: false,
                    created_at: Utc::now(),
                })
                .returning(Notification::as_returning()),
            &mut conn,
        )
        .await?;

        Ok(row)
    }

    async fn find(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<Notification> = diesel_async::RunQueryDsl::get_result(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::user_id.eq(user_id))
                .select(Notification::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.pool.get().await?;

        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .select(Notification::as_select())
            .into_boxed();

        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }

        let rows: Vec<Notification> = diesel_async::RunQueryDsl::load(query, &mut conn).await?;

        Ok(rows)
    }

    async fn mark_read(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Notification>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<Notification> = diesel_async::RunQueryDsl::get_result(
            diesel::update(
                notifications::table
                    .filter(notifications::id.eq(id))
                    .filter(notifications::user_id.eq(user_id)),
            )
            .set(notifications::is_read.eq(true))
            .returning(Notification::as_returning()),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row)
    }

    async fn dismiss(&self, id: &str, user_id: &str) -> Result<Option<Notification>, StoreError> {
        let mut conn = self.pool.get().await?;

        let row: Option<Notification> = diesel_async::RunQueryDsl::get_result(
            diesel::update(
                notifications::table
                    .filter(notifications::id.eq(id))
                    .filter(notifications::user_id.eq(user_id)),
            )
            .set(notifications::is_dismissed.eq(true))
            .returning(Notification::as_returning()),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel_async::RunQueryDsl::execute(
            diesel::delete(
                notifications::table
                    .filter(notifications::id.eq(id))
                    .filter(notifications::user_id.eq(user_id)),
            ),
            &mut conn,
        )
        .await?;

        Ok(deleted > 0)
    }
}
