use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::auth::AuthError;

/// Posts shown per page on the home feed.
pub const POSTS_PER_PAGE: i64 = 5;

#[derive(Debug, Clone)]
pub struct Post {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub user_id: i64,
}

/// A post joined with the author fields the feed renders.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author_username: String,
    pub author_image: String,
}

/// One page of the newest-first feed.
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<PostWithAuthor>,
    pub page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

impl PostPage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

fn post_from_row(row: &SqliteRow) -> Post {
    Post {
        post_id: row.get("post_id"),
        title: row.get("title"),
        content: row.get("content"),
        date_posted: row.get("date_posted"),
        user_id: row.get("user_id"),
    }
}

impl Post {
    pub async fn create(
        pool: &SqlitePool,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Post, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, content, date_posted, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(post_from_row(&row))
    }

    pub async fn get_by_id(pool: &SqlitePool, post_id: i64) -> Result<Option<Post>, AuthError> {
        let row = sqlx::query("SELECT * FROM posts WHERE post_id = $1")
            .bind(post_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| post_from_row(&r)))
    }

    pub async fn update(
        pool: &SqlitePool,
        post_id: i64,
        title: &str,
        content: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE posts SET title = $1, content = $2 WHERE post_id = $3")
            .bind(title)
            .bind(content)
            .bind(post_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, post_id: i64) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    /// Fetch one page of the feed, newest first. Pages are 1-based; an
    /// out-of-range page comes back empty rather than failing.
    pub async fn recent_page(pool: &SqlitePool, page: i64) -> Result<PostPage, AuthError> {
        let page = page.max(1);

        let total_posts: i64 = sqlx::query("SELECT COUNT(*) AS n FROM posts")
            .fetch_one(pool)
            .await?
            .get("n");
        let total_pages = ((total_posts + POSTS_PER_PAGE - 1) / POSTS_PER_PAGE).max(1);

        let rows = sqlx::query(
            r#"
            SELECT p.*, u.username, u.image_file
            FROM posts p
            JOIN users u ON u.user_id = p.user_id
            ORDER BY p.date_posted DESC, p.post_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(POSTS_PER_PAGE)
        .bind((page - 1) * POSTS_PER_PAGE)
        .fetch_all(pool)
        .await?;

        let posts = rows
            .iter()
            .map(|r| PostWithAuthor {
                post: post_from_row(r),
                author_username: r.get("username"),
                author_image: r.get("image_file"),
            })
            .collect();

        Ok(PostPage {
            posts,
            page,
            total_pages,
            total_posts,
        })
    }
}
