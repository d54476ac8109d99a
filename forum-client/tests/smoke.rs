use std::time::{SystemTime, UNIX_EPOCH};

use forum_client::{ForumClient, ForumClientError, Submission};

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

#[tokio::test]
#[ignore = "requires running HTTP server"]
async fn http_smoke_flow() {
    let base_url =
        std::env::var("FORUM_HTTP_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let mut client = ForumClient::new(base_url).expect("client must build");

    let suffix = unique_suffix();
    let username = format!("user_{suffix}");
    let email = format!("user_{suffix}@example.com");
    let password = "password123";

    let anonymous = client.create_post("nope", None).await;
    assert!(matches!(anonymous, Err(ForumClientError::Unauthorized)));

    let register = client
        .register(&username, &email, password)
        .await
        .expect("register must succeed");
    assert_eq!(register.user.username, username);

    let login = client
        .login(&username, password)
        .await
        .expect("login must succeed");
    assert!(!login.access_token.is_empty());

    let rejected = client
        .create_post("   ", None)
        .await
        .expect("rejected form is not an error");
    match rejected {
        Submission::Rejected(form) => assert!(form.errors.contains_key("text")),
        Submission::Redirected(to) => panic!("blank post accepted, redirected to {to}"),
    }

    let created = client
        .create_post("smoke text", None)
        .await
        .expect("create_post must succeed");
    assert!(matches!(created, Submission::Redirected(ref to) if to == "/"));

    let profile = client
        .profile(&username, None)
        .await
        .expect("profile must load");
    assert_eq!(profile.post_count, 1);
    let post_id = profile.page.posts[0].id;

    let edited = client
        .edit_post(&username, post_id, "smoke text edited", None)
        .await
        .expect("edit must succeed");
    let expected = format!("/{username}/{post_id}/");
    assert!(matches!(edited, Submission::Redirected(ref to) if *to == expected));

    let post = client
        .get_post(&username, post_id)
        .await
        .expect("get_post must succeed");
    assert_eq!(post.post.text, "smoke text edited");

    let index = client.index(None).await.expect("index must load");
    assert!(index.page.posts.iter().any(|post| post.id == post_id));

    let missing = client.get_post("nobody_by_that_name", post_id).await;
    assert!(matches!(missing, Err(ForumClientError::NotFound)));
}
