//! Role-based permission checks. Skipped when DATABASE_URL is not configured.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{ensure_server, hire, register_account, register_company};

#[tokio::test]
async fn members_without_role_are_read_only() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Gamma").await?;
    let (member, _) = register_account(server, "Mia").await?;
    hire(&owner, &member, &organization_id, json!({})).await?;

    let (status, _) = member.get("/api/departments").await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = member.get("/api/employees").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = member.post("/api/departments", json!({ "name": "Shadow IT" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = member.get("/api/statistics").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = member.patch("/api/organization", json!({ "name": "Mine now" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = member.delete("/api/organization").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn granted_role_unlocks_its_area_only() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Delta").await?;

    let (status, role) = owner
        .post("/api/roles", json!({ "name": "Editor", "can_post_news": true }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = role["data"]["id"].as_str().unwrap().to_string();

    let (editor, editor_id) = register_account(server, "Eddie").await?;
    hire(&owner, &editor, &organization_id, json!({ "role_id": role_id })).await?;

    let (status, _) = editor
        .post("/api/news", json!({ "title": "Welcome", "body": "Hello team" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, pinned) = owner
        .post("/api/news", json!({ "title": "Rules", "body": "Read me", "pinned": true }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, feed) = editor.get("/api/news").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["data"][0]["id"], pinned["data"]["id"]);

    let (status, _) = editor.post("/api/tasks", json!({ "title": "Not mine to give" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Role in use cannot be deleted
    let (status, _) = owner.delete(&format!("/api/roles/{}", role_id)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Nobody dismisses the owner or themselves
    let owner_id = {
        let (_, me) = owner.get("/api/auth/whoami").await?;
        me["data"]["user"]["id"].as_str().unwrap().to_string()
    };
    let (status, _) = owner.delete(&format!("/api/employees/{}", owner_id)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = editor.post("/api/employees/leave", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = owner.get(&format!("/api/employees/{}", editor_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = owner.delete(&format!("/api/roles/{}", role_id)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn events_must_not_end_before_they_start() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, _) = register_company(server, "Epsilon").await?;

    let (status, body) = owner
        .post(
            "/api/events",
            json!({
                "title": "Offsite",
                "starts_at": "2030-05-01T10:00:00Z",
                "ends_at": "2030-05-01T09:00:00Z"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["ends_at"], "Event cannot end before it starts");

    let (status, _) = owner
        .post(
            "/api/events",
            json!({ "title": "Offsite", "starts_at": "2030-05-01T10:00:00Z", "ends_at": "2030-05-01T18:00:00Z" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, upcoming) = owner.get("/api/events?upcoming=true").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming["data"].as_array().map(|e| e.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn owner_role_keeps_administrator_rights() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, _) = register_company(server, "Iota").await?;

    let (_, me) = owner.get("/api/auth/whoami").await?;
    let admin_role = format!("/api/roles/{}", me["data"]["role"]["id"].as_str().unwrap());

    let (status, body) = owner.patch(&admin_role, json!({ "is_admin": false })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, role) = owner.patch(&admin_role, json!({ "name": "Founders" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["data"]["is_admin"], true);
    Ok(())
}

#[tokio::test]
async fn attendance_is_private_without_the_permission() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Kappa").await?;
    let (first, _) = register_account(server, "Finn").await?;
    let (second, second_id) = register_account(server, "Sara").await?;
    hire(&owner, &first, &organization_id, json!({})).await?;
    hire(&owner, &second, &organization_id, json!({})).await?;

    // Nothing to close before a check-in
    let (status, body) = first.post("/api/attendance/check-out", json!({})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = second.post("/api/attendance/check-in", json!({})).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = first.get(&format!("/api/attendance?user_id={}", second_id)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Without a filter a member only sees their own rows
    let (status, own) = first.get("/api/attendance").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["data"], json!([]));

    let (status, all) = owner.get(&format!("/api/attendance?user_id={}", second_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["data"].as_array().map(|r| r.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn managers_cannot_promote_themselves() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Lambda").await?;

    let (_, me) = owner.get("/api/auth/whoami").await?;
    let admin_role_id = me["data"]["role"]["id"].as_str().unwrap().to_string();

    let (_, hr_role) = owner
        .post("/api/roles", json!({ "name": "HR", "can_manage_employees": true, "can_manage_roles": true }))
        .await?;
    let hr_role_id = hr_role["data"]["id"].as_str().unwrap().to_string();
    let (_, staff_role) = owner.post("/api/roles", json!({ "name": "Staff" })).await?;
    let staff_role_id = staff_role["data"]["id"].as_str().unwrap().to_string();

    let (hr, hr_id) = register_account(server, "Hana").await?;
    let (clerk, clerk_id) = register_account(server, "Carl").await?;
    hire(&owner, &hr, &organization_id, json!({ "role_id": hr_role_id })).await?;
    hire(&owner, &clerk, &organization_id, json!({})).await?;

    let (status, _) = hr
        .patch(&format!("/api/employees/{}", hr_id), json!({ "role_id": admin_role_id }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = hr
        .patch(&format!("/api/employees/{}", hr_id), json!({ "role_id": staff_role_id }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = hr
        .patch(&format!("/api/employees/{}", clerk_id), json!({ "role_id": admin_role_id }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, clerk_row) = hr
        .patch(&format!("/api/employees/{}", clerk_id), json!({ "role_id": staff_role_id, "position": "Clerk" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", clerk_row);
    assert_eq!(clerk_row["data"]["role_id"], staff_role_id.as_str());

    // Role editing cannot be used as a side door either
    let (status, _) = hr
        .patch(&format!("/api/roles/{}", hr_role_id), json!({ "can_manage_tasks": true }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = hr
        .patch(&format!("/api/roles/{}", staff_role_id), json!({ "is_admin": true }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = hr.post("/api/roles", json!({ "name": "Root", "is_admin": true })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = hr
        .patch(&format!("/api/roles/{}", staff_role_id), json!({ "can_post_news": true }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    // The owner can still promote
    let (status, _) = owner
        .patch(&format!("/api/employees/{}", hr_id), json!({ "role_id": admin_role_id }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
