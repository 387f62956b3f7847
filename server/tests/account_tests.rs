mod common;

use quill::auth::{self, AuthError};
use quill::user::{User, DEFAULT_IMAGE_FILE};

use common::test_pool;

#[tokio::test]
async fn new_accounts_start_with_the_default_picture() {
    let pool = test_pool().await;

    let user = auth::register(&pool, "corey", "corey@example.com", "password")
        .await
        .unwrap();

    assert_eq!(user.image_file, DEFAULT_IMAGE_FILE);
}

#[tokio::test]
async fn profile_update_changes_fields_and_keeps_picture_when_absent() {
    let pool = test_pool().await;
    let user = auth::register(&pool, "corey", "corey@example.com", "password")
        .await
        .unwrap();

    User::update_profile(&pool, user.user_id, "coreyja", "new@example.com", None)
        .await
        .expect("profile update failed");

    let updated = User::get_by_id(&pool, user.user_id)
        .await
        .unwrap()
        .expect("user vanished");
    assert_eq!(updated.username, "coreyja");
    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.image_file, DEFAULT_IMAGE_FILE);

    User::update_profile(
        &pool,
        user.user_id,
        "coreyja",
        "new@example.com",
        Some("abc123.png"),
    )
    .await
    .expect("picture update failed");

    let with_picture = User::get_by_id(&pool, user.user_id)
        .await
        .unwrap()
        .expect("user vanished");
    assert_eq!(with_picture.image_file, "abc123.png");
}

#[tokio::test]
async fn profile_update_rejects_taken_username_or_email() {
    let pool = test_pool().await;
    auth::register(&pool, "corey", "corey@example.com", "password")
        .await
        .unwrap();
    let other = auth::register(&pool, "other", "other@example.com", "password")
        .await
        .unwrap();

    let result =
        User::update_profile(&pool, other.user_id, "corey", "other@example.com", None).await;
    assert!(matches!(result, Err(AuthError::DuplicateKey)));

    let result =
        User::update_profile(&pool, other.user_id, "other", "corey@example.com", None).await;
    assert!(matches!(result, Err(AuthError::DuplicateKey)));
}

#[tokio::test]
async fn updates_to_a_vanished_identity_fail_with_not_found() {
    let pool = test_pool().await;

    let result = User::update_profile(&pool, 4242, "ghost", "ghost@example.com", None).await;
    assert!(matches!(result, Err(AuthError::NotFound)));

    let hash = quill::password::hash("anything").unwrap();
    let result = User::update_password(&pool, 4242, &hash).await;
    assert!(matches!(result, Err(AuthError::NotFound)));
}
