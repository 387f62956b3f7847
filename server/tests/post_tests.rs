mod common;

use quill::auth::{self, AuthError};
use quill::posts::{Post, POSTS_PER_PAGE};
use quill::user::User;

use common::test_pool;

async fn seed_user(pool: &sqlx::SqlitePool) -> User {
    auth::register(pool, "author", "author@example.com", "password")
        .await
        .expect("seeding user failed")
}

#[tokio::test]
async fn feed_paginates_newest_first() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;

    for i in 1..=12 {
        Post::create(&pool, user.user_id, &format!("post-{i}"), "body")
            .await
            .expect("creating post failed");
    }

    let first = Post::recent_page(&pool, 1).await.unwrap();
    assert_eq!(first.posts.len(), POSTS_PER_PAGE as usize);
    assert_eq!(first.total_posts, 12);
    assert_eq!(first.total_pages, 3);
    assert!(!first.has_prev());
    assert!(first.has_next());
    assert_eq!(first.posts[0].post.title, "post-12");
    assert_eq!(first.posts[0].author_username, "author");

    let last = Post::recent_page(&pool, 3).await.unwrap();
    assert_eq!(last.posts.len(), 2);
    assert!(last.has_prev());
    assert!(!last.has_next());
    assert_eq!(last.posts[1].post.title, "post-1");

    // Pages past the end come back empty instead of failing
    let past_the_end = Post::recent_page(&pool, 99).await.unwrap();
    assert!(past_the_end.posts.is_empty());

    // Page numbers below one are clamped
    let clamped = Post::recent_page(&pool, -3).await.unwrap();
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.posts[0].post.title, "post-12");
}

#[tokio::test]
async fn empty_feed_still_has_one_page() {
    let pool = test_pool().await;

    let feed = Post::recent_page(&pool, 1).await.unwrap();
    assert!(feed.posts.is_empty());
    assert_eq!(feed.total_pages, 1);
    assert!(!feed.has_prev());
    assert!(!feed.has_next());
}

#[tokio::test]
async fn update_and_delete_round_trip() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;

    let post = Post::create(&pool, user.user_id, "draft", "first version")
        .await
        .unwrap();

    Post::update(&pool, post.post_id, "published", "final version")
        .await
        .expect("update failed");

    let updated = Post::get_by_id(&pool, post.post_id)
        .await
        .unwrap()
        .expect("post vanished");
    assert_eq!(updated.title, "published");
    assert_eq!(updated.content, "final version");
    assert_eq!(updated.user_id, user.user_id);

    Post::delete(&pool, post.post_id).await.expect("delete failed");
    assert!(Post::get_by_id(&pool, post.post_id).await.unwrap().is_none());
}

#[tokio::test]
async fn operations_on_missing_posts_fail_with_not_found() {
    let pool = test_pool().await;

    assert!(Post::get_by_id(&pool, 4242).await.unwrap().is_none());
    assert!(matches!(
        Post::update(&pool, 4242, "t", "c").await,
        Err(AuthError::NotFound)
    ));
    assert!(matches!(
        Post::delete(&pool, 4242).await,
        Err(AuthError::NotFound)
    ));
}
