use serde_json::json;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use libmembercheck::config::DirectoryGroup;

use crate::helpers::{
    checkbox_column, spawn_app, spawn_app_with, text_column, CHAIR_COLUMN, DRIVE_COLUMN,
    DRIVE_GROUP, GITHUB_COLUMN, JIRA_TOKEN, LFX_COLUMN, MEMBER_COLUMN, ORG, SEARCH_GROUP,
    SUPPORT_EMAIL, TEAM_SLUG,
};

const ALICE: &str = "alice@example.org";

#[tokio::test]
async fn invalid_emails_are_rejected_without_calling_any_upstream() {
    let test_app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.groups_io_server)
        .await;

    let test_cases = [
        "",
        "definitely-not-an-email",
        "alice@example",
        "<b>alice</b>@example.org",
    ];
    for invalid_email in test_cases {
        let response = test_app.check_membership(invalid_email).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the email was {:?}.",
            invalid_email
        );
        let html_page = response.text().await.unwrap();
        assert!(html_page.contains("Enter a valid email address to proceed!"));
        assert!(html_page.contains(r#"class="result warning""#));
    }
}

#[tokio::test]
async fn a_missing_email_field_is_rejected() {
    let test_app = spawn_app().await;

    let response = test_app.post_form("/", &[("name", "alice")]).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn a_member_whose_login_is_on_the_team_gets_every_check_positive() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    let columns = json!([
        text_column(GITHUB_COLUMN, "alice-gh"),
        text_column(DRIVE_COLUMN, ALICE),
    ]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_team(&["someone-else", "alice-gh"]).await;
    test_app.mount_directory_token().await;
    // Directory addresses are compared without regard to case.
    test_app.mount_directory_members(DRIVE_GROUP, &["ALICE@example.org"]).await;
    test_app.mount_jira_users(&[ALICE]).await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("RISC-V Groups.io Account ✅"));
    assert!(html_page.contains("GitHub ID is set in Groups.io ✅"));
    assert!(html_page.contains("RISC-V GitHub Team Access ✅"));
    assert!(html_page.contains("Google Drive Email is set in Groups.io ✅"));
    assert!(html_page.contains("Google Drive Member Access ✅"));
    assert!(html_page.contains("Jira Access ✅"));
    assert!(html_page.contains("LFX Email is set in Groups.io ❌"));
    assert!(html_page.contains(r#"class="result success""#));
}

#[tokio::test]
async fn an_email_absent_from_the_group_is_reported_not_found() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;

    let body = json!({ "data": [], "next_page_token": 0 });
    Mock::given(path("/api/v1/searchmembers"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&test_app.groups_io_server)
        .await;
    let other_servers = [
        &test_app.github_server,
        &test_app.jira_server,
        &test_app.directory_server,
    ];
    for server in other_servers {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    let response = test_app.check_membership("bob@example.org").await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("NOT found in RISC-V Groups.io!"));
    assert!(html_page.contains(&format!("mailto:{}", SUPPORT_EMAIL)));
    assert!(html_page.contains(r#"class="result failure""#));
}

#[tokio::test]
async fn a_member_search_only_matches_the_exact_address() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;

    Mock::given(path("/api/v1/searchmembers"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "email": "bob.smith@example.org", "extra_member_data": [] }],
            "next_page_token": 0
        })))
        .mount(&test_app.groups_io_server)
        .await;

    let response = test_app.check_membership("bob@example.org").await;

    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("NOT found in RISC-V Groups.io!"));
}

#[tokio::test]
async fn a_failing_team_listing_is_reported_as_not_a_member() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    let columns = json!([text_column(GITHUB_COLUMN, "alice-gh")]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_jira_users(&[]).await;

    Mock::given(path(format!("/orgs/{}/teams/{}/members", ORG, TEAM_SLUG)))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&test_app.github_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("GitHub ID is set in Groups.io ✅"));
    assert!(html_page.contains("RISC-V GitHub Team Access ❌"));
}

#[tokio::test]
async fn team_members_on_a_later_page_are_found() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    let columns = json!([text_column(GITHUB_COLUMN, "alice-gh")]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_jira_users(&[]).await;

    let base = test_app.github_server.uri();
    let next_page = format!("{}/organizations/1/team/2/members?page=2", base);
    let link = format!(r#"<{0}>; rel="next", <{0}>; rel="last""#, next_page);
    Mock::given(path(format!("/orgs/{}/teams/{}/members", ORG, TEAM_SLUG)))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", link.as_str())
                .set_body_json(json!([{ "login": "someone-else" }])),
        )
        .expect(1)
        .mount(&test_app.github_server)
        .await;
    let body = json!([{ "login": "alice-gh" }]);
    Mock::given(path("/organizations/1/team/2/members"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&test_app.github_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("RISC-V GitHub Team Access ✅"));
}

#[tokio::test]
async fn jira_failures_are_reported_as_an_error() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    test_app.mount_groups_io_member(SEARCH_GROUP, ALICE, json!([])).await;

    Mock::given(path("/rest/api/2/user/search"))
        .and(header("Authorization", format!("Bearer {}", JIRA_TOKEN).as_str()))
        .and(query_param("username", ALICE))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.jira_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Jira Access Error"));
}

#[tokio::test]
async fn the_directory_listing_is_attempted_three_times_before_giving_up() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, json!([text_column(DRIVE_COLUMN, ALICE)]))
        .await;
    test_app.mount_jira_users(&[ALICE]).await;
    test_app.mount_directory_token().await;

    Mock::given(path(format!("/admin/directory/v1/groups/{}/members", DRIVE_GROUP)))
        .and(header("Authorization", "Bearer directory-token"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&test_app.directory_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Google Drive Email is set in Groups.io ✅"));
    assert!(html_page.contains("Google Drive Member Access ❌"));
}

#[tokio::test]
async fn directory_groups_are_paged_through() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, json!([text_column(DRIVE_COLUMN, ALICE)]))
        .await;
    test_app.mount_jira_users(&[]).await;
    test_app.mount_directory_token().await;

    let members_path = format!("/admin/directory/v1/groups/{}/members", DRIVE_GROUP);
    let last_page = json!({ "members": [{ "email": ALICE }] });
    Mock::given(path(members_path.as_str()))
        .and(query_param("pageToken", "second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(last_page))
        .expect(1)
        .mount(&test_app.directory_server)
        .await;
    Mock::given(path(members_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [{ "email": "someone@example.org" }],
            "nextPageToken": "second"
        })))
        .expect(1)
        .mount(&test_app.directory_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Google Drive Member Access ✅"));
}

#[tokio::test]
async fn members_without_a_drive_email_skip_the_directory() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    test_app.mount_groups_io_member(SEARCH_GROUP, ALICE, json!([])).await;
    test_app.mount_jira_users(&[ALICE]).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.directory_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.github_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Google Drive Member Access ❌"));
    assert!(html_page.contains("Jira Access ✅"));
}

#[tokio::test]
async fn a_rejected_groups_login_renders_the_support_contact() {
    let test_app = spawn_app().await;

    let body = json!({ "object": "error", "type": "bad_request", "extra": "password" });
    Mock::given(path("/api/v1/login"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(body))
        .expect(1)
        .mount(&test_app.groups_io_server)
        .await;
    Mock::given(path("/api/v1/searchmembers"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.groups_io_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(500, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Could not sign in to Groups.io"));
    assert!(html_page.contains(&format!("mailto:{}", SUPPORT_EMAIL)));
}

#[tokio::test]
async fn a_failing_member_search_renders_the_support_contact() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;

    Mock::given(path("/api/v1/searchmembers"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&test_app.groups_io_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(500, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Failed to search Groups.io members"));
    assert!(html_page.contains(&format!("mailto:{}", SUPPORT_EMAIL)));
}

#[tokio::test]
async fn profile_columns_are_reported_as_credentials() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    let columns = json!([
        text_column(LFX_COLUMN, ALICE),
        checkbox_column(MEMBER_COLUMN, true),
        checkbox_column(CHAIR_COLUMN, false),
    ]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_jira_users(&[]).await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("LFX Email is set in Groups.io ✅"));
    assert!(html_page.contains("Member checkbox is ticked in Groups.io ✅"));
    assert!(html_page.contains("Chair / Vice-Chair is ticked in Groups.io ❌"));
    assert!(html_page.contains("GitHub ID is set in Groups.io ❌"));
    assert!(html_page.contains("Google Drive Email is set in Groups.io ❌"));
}

#[tokio::test]
async fn a_failed_directory_sign_in_marks_every_directory_group_as_an_error() {
    let test_app = spawn_app_with(|config| {
        config.directory.groups.push(DirectoryGroup {
            key: "tsc@example.org".into(),
            label: "Google Drive TSC".into(),
        })
    })
    .await;
    test_app.mount_groups_io_login().await;
    let columns = json!([text_column(DRIVE_COLUMN, ALICE)]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_jira_users(&[ALICE]).await;

    Mock::given(path("/token"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.directory_server)
        .await;
    Mock::given(path(format!("/admin/directory/v1/groups/{}/members", DRIVE_GROUP)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.directory_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("Google Drive Email is set in Groups.io ✅"));
    assert!(html_page.contains("Google Drive Member Access Error"));
    assert!(html_page.contains("Google Drive TSC Access Error"));
    assert!(html_page.contains("Jira Access ✅"));
}

#[tokio::test]
async fn a_team_listing_longer_than_the_page_bound_is_an_error() {
    let test_app = spawn_app_with(|config| config.pagination.max_pages = 1).await;
    test_app.mount_groups_io_login().await;
    let columns = json!([text_column(GITHUB_COLUMN, "alice-gh")]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_jira_users(&[]).await;

    let base = test_app.github_server.uri();
    let next_page = format!("{}/organizations/1/team/2/members?page=2", base);
    let link = format!(r#"<{}>; rel="next""#, next_page);
    Mock::given(path(format!("/orgs/{}/teams/{}/members", ORG, TEAM_SLUG)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", link.as_str())
                .set_body_json(json!([{ "login": "someone-else" }])),
        )
        .expect(1)
        .mount(&test_app.github_server)
        .await;
    Mock::given(path("/organizations/1/team/2/members"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.github_server)
        .await;

    let response = test_app.check_membership(ALICE).await;

    assert_eq!(200, response.status().as_u16());
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("GitHub ID is set in Groups.io ✅"));
    assert!(html_page.contains("RISC-V GitHub Team Access Error"));
}

#[tokio::test]
async fn surrounding_whitespace_in_the_profile_login_is_ignored() {
    let test_app = spawn_app().await;
    test_app.mount_groups_io_login().await;
    let columns = json!([text_column(GITHUB_COLUMN, " alice-gh ")]);
    test_app
        .mount_groups_io_member(SEARCH_GROUP, ALICE, columns)
        .await;
    test_app.mount_team(&["alice-gh"]).await;
    test_app.mount_jira_users(&[]).await;

    let response = test_app.check_membership(ALICE).await;

    let html_page = response.text().await.unwrap();
    assert!(html_page.contains("RISC-V GitHub Team Access ✅"));
}
