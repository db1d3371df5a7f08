use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::client::Client;
use crate::models::post::PostRow;
use crate::models::user::{User, UserType};

/// Variants generated by one request, stored together.
pub struct NewPosts<'a> {
    pub user_id: &'a str,
    pub client_id: Option<&'a str>,
    pub query: &'a str,
    pub contents: Vec<&'a str>,
}

pub async fn get_user(pool: &PgPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Returns the user, creating it on the default tier if it does not exist.
pub async fn get_or_create_user(pool: &PgPool, user_id: &str) -> Result<User, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (user_id, user_type)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(UserType::default().as_str())
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        info!("Created user {user_id}");
    }

    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Stores every variant and bumps the owner's post count in one transaction,
/// so a request either persists all of its posts or none. Returns the new
/// post ids in input order.
pub async fn save_posts(pool: &PgPool, posts: NewPosts<'_>) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut post_ids = Vec::with_capacity(posts.contents.len());

    for content in &posts.contents {
        let post_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO posts (post_id, user_id, client_id, query, content)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&post_id)
        .bind(posts.user_id)
        .bind(posts.client_id)
        .bind(posts.query)
        .bind(*content)
        .execute(&mut *tx)
        .await?;
        post_ids.push(post_id);
    }

    sqlx::query("UPDATE users SET post_count = post_count + $1 WHERE user_id = $2")
        .bind(post_ids.len() as i32)
        .bind(posts.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(post_ids)
}

pub async fn find_post(pool: &PgPool, post_id: &str) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE post_id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Flags a post as the one the user picked. Returns false if it does not exist.
pub async fn mark_post_chosen(pool: &PgPool, post_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE posts SET chosen = TRUE WHERE post_id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_clients(pool: &PgPool, user_id: &str) -> Result<Vec<Client>, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "SELECT * FROM clients WHERE user_id = $1 ORDER BY created_at, client_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Creates a client for an existing (or newly created) user.
pub async fn create_client(
    pool: &PgPool,
    user_id: &str,
    name: &str,
    industry: Option<&str>,
) -> Result<Client> {
    get_or_create_user(pool, user_id).await?;

    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (client_id, user_id, name, industry)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(name)
    .bind(industry)
    .fetch_one(pool)
    .await?;

    info!("Created client {} for user {}", client.client_id, client.user_id);
    Ok(client)
}
