//! Service implementations for the fixture contracts.

#![allow(dead_code)]

use hermes_core::fixtures::{profile_contract, repository_contract};
use hermes_core::HermesError;
use hermes_server::{Call, ServiceImpl};
use hermes_test::TestServer;
use serde_json::{json, Value};

pub fn profile_service() -> ServiceImpl {
    ServiceImpl::new()
        .method("getName", |call: Call| async move {
            let id: i64 = call.arg("id")?;
            if id == 0 {
                return Err(HermesError::not_found("no user 0"));
            }
            Ok(json!(format!("user {id}")))
        })
        .method("setName", |call: Call| async move {
            let name: String = call.arg("name")?;
            if name.is_empty() {
                return Err(HermesError::validation("name must not be empty"));
            }
            Ok(Value::Null)
        })
        .method("getInfo", |_call: Call| async { Ok(json!({"version": 1})) })
        .method("index", |_call: Call| async { Ok(json!("home")) })
}

pub fn issue_service() -> ServiceImpl {
    ServiceImpl::new()
        .method("getIssue", |call: Call| async move {
            let number: u32 = call.arg("_number")?;
            Ok(json!({"number": number, "title": format!("issue {number}")}))
        })
        .method("getOpen", |call: Call| async move {
            let limit: u32 = call.arg("limit")?;
            Ok(json!({"limit": limit, "issues": []}))
        })
        .method("createIssue", |call: Call| async move {
            let title: String = call.arg("title")?;
            let body: Option<String> = call.arg("body_").ok();
            Ok(json!(title.len() + body.map_or(0, |b| b.len())))
        })
        .method("deleteIssue", |_call: Call| async { Ok(Value::Null) })
}

pub fn repository_service() -> ServiceImpl {
    ServiceImpl::new()
        .method("getPullRequests", |call: Call| async move {
            let owner: String = call.arg("_owner")?;
            let repo: String = call.arg("_repo")?;
            let state: String = call.arg("state")?;
            let caller: Value = call.arg("caller")?;
            Ok(json!({
                "repo": format!("{owner}/{repo}"),
                "state": state,
                "caller": caller,
            }))
        })
        .resolver("caller", |ctx| {
            Ok(json!(ctx.header("x-user").unwrap_or("anonymous")))
        })
        .method("updateTopics", |call: Call| async move {
            let topics: Vec<String> = call.arg("topics")?;
            if !topics.is_empty() {
                call.set_output("revision", topics.len())?;
            }
            Ok(Value::Null)
        })
        .method("getReadme", |call: Call| async move {
            let repo: String = call.arg("_repo")?;
            Ok(json!(format!("# {repo}")))
        })
        .nested("tracker", issue_service())
}

pub fn server() -> TestServer {
    TestServer::builder()
        .mount(&profile_contract(), profile_service())
        .unwrap()
        .mount(&repository_contract(), repository_service())
        .unwrap()
        .build()
}
