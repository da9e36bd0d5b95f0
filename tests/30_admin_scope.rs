mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

// Scenario: an admin scoped to organization X creates a manager (allowed,
// and the new user lands in X) but may not create another admin.
#[tokio::test]
async fn admin_creates_staff_but_never_admins() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let org = common::create_org(&supreme, &server.base_url, &common::unique("org")).await?;
    let org_id = org["id"].as_str().unwrap().to_string();

    let admin_email = format!("{}@example.com", common::unique("admin"));
    common::create_user(
        &supreme,
        &server.base_url,
        &admin_email,
        "AdminPass123",
        "admin",
        Some(org_id.as_str()),
    )
    .await?;

    let admin_token = common::login(&server.base_url, &admin_email, "AdminPass123").await?;
    let admin = common::authed(&admin_token);

    // Creating a manager succeeds and is forced into the admin's org.
    let manager_email = format!("{}@example.com", common::unique("manager"));
    let res = admin
        .post(format!("{}/api/admin/users", server.base_url))
        .json(&serde_json::json!({
            "name": "Manager",
            "email": manager_email,
            "password": "ManagerPass1",
            "role": "manager",
            // Deliberately omitted organization_id: scope decides.
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let manager = common::data(&body);
    assert_eq!(manager["organization_id"].as_str(), Some(org_id.as_str()));
    assert_eq!(manager["role"], "manager");

    // Creating an admin is rejected.
    let res = admin
        .post(format!("{}/api/admin/users", server.base_url))
        .json(&serde_json::json!({
            "name": "Another Admin",
            "email": format!("{}@example.com", common::unique("evil")),
            "password": "AdminPass123",
            "role": "admin",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);

    // So is a supreme admin.
    let res = admin
        .post(format!("{}/api/admin/users", server.base_url))
        .json(&serde_json::json!({
            "name": "Usurper",
            "email": format!("{}@example.com", common::unique("usurper")),
            "password": "AdminPass123",
            "role": "supreme_admin",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

// Every row an admin can list must belong to their organization, and no
// admin-level records may ever appear.
#[tokio::test]
async fn admin_listings_stay_inside_their_scope() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let org_a = common::create_org(&supreme, &server.base_url, &common::unique("org-a")).await?;
    let org_b = common::create_org(&supreme, &server.base_url, &common::unique("org-b")).await?;
    let org_a_id = org_a["id"].as_str().unwrap().to_string();
    let org_b_id = org_b["id"].as_str().unwrap().to_string();

    let admin_email = format!("{}@example.com", common::unique("admin-a"));
    let admin_user = common::create_user(
        &supreme,
        &server.base_url,
        &admin_email,
        "AdminPass123",
        "admin",
        Some(org_a_id.as_str()),
    )
    .await?;
    let admin_id = admin_user["id"].as_str().unwrap().to_string();

    // Users in both organizations.
    for (org_id, tag) in [(&org_a_id, "a"), (&org_b_id, "b")] {
        common::create_user(
            &supreme,
            &server.base_url,
            &format!("{}@example.com", common::unique(&format!("member-{tag}"))),
            "MemberPass1",
            "team_member",
            Some(org_id.as_str()),
        )
        .await?;
    }

    let admin = common::authed(&common::login(&server.base_url, &admin_email, "AdminPass123").await?);

    let res = admin
        .get(format!("{}/api/admin/users", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let users = common::data(&body).as_array().unwrap().clone();
    assert!(!users.is_empty());
    for user in &users {
        assert_eq!(
            user["organization_id"].as_str(),
            Some(org_a_id.as_str()),
            "out-of-scope row leaked: {user}"
        );
        let role = user["role"].as_str().unwrap();
        assert!(
            role != "admin" && role != "supreme_admin",
            "admin-level row leaked: {user}"
        );
    }

    // Organization listing: only the admin's own org or ones they created.
    let res = admin
        .get(format!("{}/api/organizational/organizations", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    for org in common::data(&body).as_array().unwrap() {
        let in_scope = org["id"].as_str() == Some(org_a_id.as_str())
            || org["created_by"].as_str() == Some(admin_id.as_str());
        assert!(in_scope, "out-of-scope organization leaked: {org}");
    }

    // System-wide user listing stays supreme-only.
    let res = admin
        .get(format!("{}/api/organizational/users", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

// Cross-scope targets read as nonexistent, not forbidden.
#[tokio::test]
async fn cross_scope_user_reads_as_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let org_a = common::create_org(&supreme, &server.base_url, &common::unique("scope-a")).await?;
    let org_b = common::create_org(&supreme, &server.base_url, &common::unique("scope-b")).await?;

    let admin_email = format!("{}@example.com", common::unique("admin"));
    common::create_user(
        &supreme,
        &server.base_url,
        &admin_email,
        "AdminPass123",
        "admin",
        Some(org_a["id"].as_str().unwrap()),
    )
    .await?;

    let outsider = common::create_user(
        &supreme,
        &server.base_url,
        &format!("{}@example.com", common::unique("outsider")),
        "MemberPass1",
        "team_member",
        Some(org_b["id"].as_str().unwrap()),
    )
    .await?;

    let admin = common::authed(&common::login(&server.base_url, &admin_email, "AdminPass123").await?);

    let res = admin
        .delete(format!(
            "{}/api/admin/users/{}",
            server.base_url,
            outsider["id"].as_str().unwrap()
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

// Deleting an organization is blocked while active users reference it and
// allowed once none do.
#[tokio::test]
async fn organization_delete_guarded_by_active_users() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let org = common::create_org(&supreme, &server.base_url, &common::unique("doomed")).await?;
    let org_id = org["id"].as_str().unwrap().to_string();

    let member = common::create_user(
        &supreme,
        &server.base_url,
        &format!("{}@example.com", common::unique("member")),
        "MemberPass1",
        "team_member",
        Some(org_id.as_str()),
    )
    .await?;

    // Blocked while the member is active.
    let res = supreme
        .delete(format!("{}/api/organizational/organizations/{}", server.base_url, org_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Deactivate the member; the delete now goes through.
    let res = supreme
        .put(format!(
            "{}/api/admin/users/{}",
            server.base_url,
            member["id"].as_str().unwrap()
        ))
        .json(&serde_json::json!({ "status": "inactive" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = supreme
        .delete(format!("{}/api/organizational/organizations/{}", server.base_url, org_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

// Role strings outside the enumeration are refused; the legacy `staff`
// value maps to team_member at the boundary.
#[tokio::test]
async fn role_enumeration_is_closed_with_legacy_mapping() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let res = supreme
        .post(format!("{}/api/organizational/users", server.base_url))
        .json(&serde_json::json!({
            "name": "Invalid",
            "email": format!("{}@example.com", common::unique("invalid")),
            "password": "SomePass123",
            "role": "superuser",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let legacy = common::create_user(
        &supreme,
        &server.base_url,
        &format!("{}@example.com", common::unique("legacy")),
        "SomePass123",
        "staff",
        None,
    )
    .await?;
    assert_eq!(legacy["role"], "team_member");

    Ok(())
}

// The supreme admin account can never be modified or deleted.
#[tokio::test]
async fn supreme_admin_account_is_untouchable() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let token = common::login_supreme(&server.base_url).await?;
    let supreme = common::authed(&token);

    let res = supreme
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await?;
    let body: Value = res.json().await?;
    let me_id = common::data(&body)["id"].as_str().unwrap().to_string();

    let res = supreme
        .delete(format!("{}/api/organizational/users/{}", server.base_url, me_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = supreme
        .put(format!("{}/api/admin/users/{}", server.base_url, me_id))
        .json(&serde_json::json!({ "role": "team_member" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::db_ready(server).await? {
        eprintln!("skipping: database unavailable");
        return Ok(());
    }

    let supreme = common::authed(&common::login_supreme(&server.base_url).await?);

    let email = format!("{}@example.com", common::unique("dup"));
    common::create_user(&supreme, &server.base_url, &email, "SomePass123", "dean", None).await?;

    let res = supreme
        .post(format!("{}/api/organizational/users", server.base_url))
        .json(&serde_json::json!({
            "name": "Duplicate",
            "email": email,
            "password": "SomePass123",
            "role": "dean",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
