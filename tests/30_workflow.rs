//! End-to-end organization lifecycle against a real database. Skipped when
//! DATABASE_URL is not configured.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{ensure_server, hire, register_account, register_company, Api};

#[tokio::test]
async fn login_rejects_wrong_password_like_unknown_email() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let api = Api::anonymous(server);

    let email = common::unique_email("login");
    let (status, _) = api
        .post(
            "/auth/register",
            json!({ "email": email, "password": "correct-horse", "first_name": "Lena", "last_name": "Login" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = api.post("/auth/login", json!({ "email": email, "password": "correct-horse" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"].get("password_hash").is_none());

    let (wrong_password, a) = api.post("/auth/login", json!({ "email": email, "password": "nope-nope" })).await?;
    let (unknown_email, b) = api
        .post("/auth/login", json!({ "email": common::unique_email("ghost"), "password": "nope-nope" }))
        .await?;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(a["message"], b["message"]);

    let (status, body) = api
        .post(
            "/auth/register",
            json!({ "email": email, "password": "another-pass", "first_name": "Dup", "last_name": "Licate" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    Ok(())
}

#[tokio::test]
async fn hire_assign_attend_and_dismiss() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Acme").await?;

    // Owner holds every permission through the built-in administrator role
    let (status, me) = owner.get("/api/auth/whoami").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["is_owner"], true);
    assert_eq!(me["data"]["permissions"].as_array().map(|p| p.len()), Some(9));

    let (status, department) = owner
        .post("/api/departments", json!({ "name": "Engineering", "description": "Builds things" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let department_id = department["data"]["id"].as_str().unwrap().to_string();

    // Account without organization sees the company and asks to join
    let (worker, worker_id) = register_account(server, "Walter").await?;
    let (status, _) = worker.get("/api/tasks").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, organization) = owner.get("/api/organization").await?;
    let name = organization["data"]["name"].as_str().unwrap().to_string();
    let (status, found) = worker
        .get(&format!("/api/organizations?search={}", name.replace(' ', "%20")))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(found["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["id"] == organization_id.as_str()));

    let outcome = hire(
        &owner,
        &worker,
        &organization_id,
        json!({ "department_id": department_id, "position": "Engineer" }),
    )
    .await?;
    assert_eq!(outcome["request"]["status"], "approved");

    let (status, me) = worker.get("/api/auth/whoami").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["organization"]["id"], organization_id.as_str());
    assert_eq!(me["data"]["user"]["department_id"], department_id.as_str());
    assert_eq!(me["data"]["permissions"], json!([]));

    // A task for the worker lands in the worker's department
    let (status, task) = owner
        .post(
            "/api/tasks",
            json!({ "title": "Write onboarding notes", "priority": "high", "assignee_id": worker_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    assert_eq!(task["data"]["department_id"], department_id.as_str());
    let task_id = task["data"]["id"].as_str().unwrap().to_string();

    let (status, mine) = worker.get("/api/tasks?mine=true").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"].as_array().map(|t| t.len()), Some(1));

    // Assignee may progress their own task without the task permission
    let (status, done) = worker
        .put(&format!("/api/tasks/{}/status", task_id), json!({ "status": "done" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(done["data"]["completed_at"].is_string());

    let (status, reopened) = worker
        .put(&format!("/api/tasks/{}/status", task_id), json!({ "status": "in_progress" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(reopened["data"]["completed_at"].is_null());

    // One check-in per day
    let (status, record) = worker.post("/api/attendance/check-in", json!({})).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", record);
    let (status, _) = worker.post("/api/attendance/check-in", json!({})).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = worker.post("/api/attendance/check-out", json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = worker.post("/api/attendance/check-out", json!({})).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, stats) = owner.get("/api/statistics").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["employee_count"], 2);
    assert_eq!(stats["data"]["tasks"]["total"], 1);

    // Dismissal cleans up in one go
    let (status, report) = owner.delete(&format!("/api/employees/{}", worker_id)).await?;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["data"]["attendance_removed"], 1);
    assert_eq!(report["data"]["tasks_unassigned"], 1);

    let (status, me) = worker.get("/api/auth/whoami").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(me["data"]["organization"].is_null());

    let (status, task) = owner.get(&format!("/api/tasks/{}", task_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(task["data"]["assignee_id"].is_null());
    Ok(())
}

#[tokio::test]
async fn join_request_rules() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner_a, org_a) = register_company(server, "Alpha").await?;
    let (_owner_b, org_b) = register_company(server, "Beta").await?;
    let (applicant, _) = register_account(server, "Ada").await?;

    let (status, _) = applicant.post("/api/join-requests", json!({ "organization_id": org_a })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = applicant.post("/api/join-requests", json!({ "organization_id": org_a })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = applicant.post("/api/join-requests", json!({ "organization_id": org_b })).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, pending) = owner_a.get("/api/join-requests?status=pending").await?;
    assert_eq!(status, StatusCode::OK);
    let request_id = pending["data"][0]["id"].as_str().unwrap().to_string();

    let (status, outcome) = owner_a
        .post(&format!("/api/join-requests/{}/approve", request_id), json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["data"]["other_requests_rejected"], 1);

    let (status, _) = owner_a
        .post(&format!("/api/join-requests/{}/reject", request_id), json!({}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, mine) = applicant.get("/api/join-requests/mine").await?;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<&str> = mine["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["status"].as_str())
        .collect();
    assert!(statuses.contains(&"approved"));
    assert!(statuses.contains(&"rejected"));

    // Members cannot send join requests
    let (status, _) = applicant.post("/api/join-requests", json!({ "organization_id": org_b })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn relocated_task_follows_assignee_department() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Zeta").await?;

    let (_, sales) = owner.post("/api/departments", json!({ "name": "Sales" })).await?;
    let (_, support) = owner.post("/api/departments", json!({ "name": "Support" })).await?;
    let sales_id = sales["data"]["id"].as_str().unwrap().to_string();
    let support_id = support["data"]["id"].as_str().unwrap().to_string();

    let (worker, worker_id) = register_account(server, "Sam").await?;
    hire(&owner, &worker, &organization_id, json!({ "department_id": support_id })).await?;

    let (status, task) = owner
        .post("/api/tasks", json!({ "title": "Call the client", "department_id": sales_id }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["data"]["department_id"], sales_id.as_str());
    let relocate = format!("/api/tasks/{}/relocate", task["data"]["id"].as_str().unwrap());

    let (status, moved) = owner.post(&relocate, json!({ "assignee_id": worker_id })).await?;
    assert_eq!(status, StatusCode::OK, "{}", moved);
    assert_eq!(moved["data"]["assignee_id"], worker_id.as_str());
    assert_eq!(moved["data"]["department_id"], support_id.as_str());

    let (status, moved) = owner.post(&relocate, json!({ "department_id": null })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(moved["data"]["department_id"].is_null());
    assert_eq!(moved["data"]["assignee_id"], worker_id.as_str());

    let (status, moved) = owner
        .post(&relocate, json!({ "assignee_id": worker_id, "department_id": sales_id }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"]["department_id"], sales_id.as_str());

    let (status, body) = owner.post(&relocate, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["assignee_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn deleting_a_department_keeps_its_people_and_tasks() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Eta").await?;

    let (_, department) = owner.post("/api/departments", json!({ "name": "Legal" })).await?;
    let department_id = department["data"]["id"].as_str().unwrap().to_string();

    let (worker, worker_id) = register_account(server, "Lou").await?;
    hire(&owner, &worker, &organization_id, json!({ "department_id": department_id })).await?;

    let (status, task) = owner
        .post("/api/tasks", json!({ "title": "Review contract", "assignee_id": worker_id }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["data"]["department_id"], department_id.as_str());
    let task_id = task["data"]["id"].as_str().unwrap().to_string();

    let (status, removal) = owner.delete(&format!("/api/departments/{}", department_id)).await?;
    assert_eq!(status, StatusCode::OK, "{}", removal);
    assert_eq!(removal["data"]["employees_moved"], 1);
    assert_eq!(removal["data"]["tasks_moved"], 1);

    let (status, _) = owner.get(&format!("/api/departments/{}", department_id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, employee) = owner.get(&format!("/api/employees/{}", worker_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(employee["data"]["department_id"].is_null());

    let (status, task) = owner.get(&format!("/api/tasks/{}", task_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(task["data"]["department_id"].is_null());
    assert_eq!(task["data"]["assignee_id"], worker_id.as_str());
    Ok(())
}

#[tokio::test]
async fn deleting_the_organization_detaches_every_member() -> Result<()> {
    if !common::database_configured() {
        return Ok(());
    }
    let server = ensure_server().await?;
    let (owner, organization_id) = register_company(server, "Theta").await?;

    let (_, role) = owner.post("/api/roles", json!({ "name": "Staff" })).await?;
    let (_, department) = owner.post("/api/departments", json!({ "name": "Ops" })).await?;
    let (worker, _) = register_account(server, "Wim").await?;
    hire(
        &owner,
        &worker,
        &organization_id,
        json!({ "role_id": role["data"]["id"], "department_id": department["data"]["id"] }),
    )
    .await?;
    let (status, _) = owner.post("/api/tasks", json!({ "title": "Inventory" })).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (applicant, _) = register_account(server, "Pia").await?;
    let (status, _) = applicant
        .post("/api/join-requests", json!({ "organization_id": organization_id }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, organization) = owner.get("/api/organization").await?;
    let name = organization["data"]["name"].as_str().unwrap().to_string();

    // Only the owner may delete
    let (status, _) = worker.delete("/api/organization").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, removal) = owner.delete("/api/organization").await?;
    assert_eq!(status, StatusCode::OK, "{}", removal);
    assert_eq!(removal["data"]["organization_id"], organization_id.as_str());
    assert_eq!(removal["data"]["members_detached"], 2);

    for account in [&owner, &worker] {
        let (status, me) = account.get("/api/auth/whoami").await?;
        assert_eq!(status, StatusCode::OK);
        assert!(me["data"]["organization"].is_null());
        assert!(me["data"]["user"]["organization_id"].is_null());
        assert!(me["data"]["user"]["role_id"].is_null());
        assert!(me["data"]["user"]["department_id"].is_null());

        let (status, _) = account.get("/api/tasks").await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, mine) = applicant.get("/api/join-requests/mine").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"], json!([]));

    let (status, found) = applicant
        .get(&format!("/api/organizations?search={}", name.replace(' ', "%20")))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["data"], json!([]));
    Ok(())
}
