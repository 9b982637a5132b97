//! Sample contracts shared by tests across the workspace.
//!
//! ```
//! use hermes_core::fixtures;
//!
//! let contract = fixtures::profile_contract();
//! assert!(contract.method("getName").is_some());
//! ```

use crate::contract::{MethodDecl, ParamDecl, ServiceContract, TypeDesc};

/// A small profile service.
///
/// - `getName(id)` - GET `/:id/name`
/// - `setName(id, name)` - PUT `/:id/name`, `name` in the body
/// - `getInfo()` - GET `/info`
/// - `index()` - GET `/`
#[must_use]
pub fn profile_contract() -> ServiceContract {
    ServiceContract::builder("Profile")
        .method(
            MethodDecl::builder("getName")
                .param(ParamDecl::new("id", TypeDesc::Integer))
                .returns(TypeDesc::String)
                .build(),
        )
        .method(
            MethodDecl::builder("setName")
                .param(ParamDecl::new("id", TypeDesc::Integer))
                .param(ParamDecl::new("name", TypeDesc::String))
                .build(),
        )
        .method(MethodDecl::builder("getInfo").returns(TypeDesc::Json).build())
        .method(MethodDecl::builder("index").returns(TypeDesc::String).build())
        .build()
}

/// An issue tracker, mounted under `issues`.
///
/// - `getIssue(_number)` - GET `issues/:number`
/// - `getOpen(limit = 20)` - GET `issues/open?limit=`
/// - `createIssue(title, body_?)` - POST `issues/issue`
/// - `deleteIssue(_number)` - DELETE `issues/:number`
#[must_use]
pub fn issue_tracker_contract() -> ServiceContract {
    ServiceContract::builder("Issues")
        .base_path("issues")
        .method(
            MethodDecl::builder("getIssue")
                .path(":number")
                .param(ParamDecl::new("_number", TypeDesc::Integer))
                .returns(TypeDesc::Json)
                .build(),
        )
        .method(
            MethodDecl::builder("getOpen")
                .param(ParamDecl::new("limit", TypeDesc::Integer).default_value(20))
                .returns(TypeDesc::Json)
                .build(),
        )
        .method(
            MethodDecl::builder("createIssue")
                .param(ParamDecl::new("title", TypeDesc::String))
                .param(ParamDecl::new("body_", TypeDesc::String).optional())
                .returns(TypeDesc::Integer)
                .build(),
        )
        .method(
            MethodDecl::builder("deleteIssue")
                .path(":number")
                .param(ParamDecl::new("_number", TypeDesc::Integer))
                .build(),
        )
        .build()
}

/// A repository service exercising every origin, output headers and a
/// nested contract.
///
/// - `getPullRequests(_owner, _repo, state = "open", etag <-> ETag, caller*)`
///   - GET `/repos/:owner/:repo/pulls`
/// - `updateTopics(_owner, _repo, topics, revision -> X-Revision)`
///   - PATCH `/repos/:owner/:repo/topics`
/// - `getReadme(_owner, _repo)` - GET `/repos/:owner/:repo/readme`, `text/markdown`
/// - `tracker()` - nests [`issue_tracker_contract`] at `/repos/tracker/issues`
#[must_use]
pub fn repository_contract() -> ServiceContract {
    ServiceContract::builder("Repos")
        .base_path("repos")
        .method(
            MethodDecl::builder("getPullRequests")
                .path(":owner/:repo/pulls")
                .param(ParamDecl::new("_owner", TypeDesc::String))
                .param(ParamDecl::new("_repo", TypeDesc::String))
                .param(ParamDecl::new("state", TypeDesc::String).default_value("open"))
                .param(ParamDecl::new("etag", TypeDesc::String).optional().in_out())
                .param(ParamDecl::new("caller", TypeDesc::Json))
                .header("etag", "ETag")
                .computed("caller")
                .returns(TypeDesc::Json)
                .build(),
        )
        .method(
            MethodDecl::builder("updateTopics")
                .path(":owner/:repo/topics")
                .param(ParamDecl::new("_owner", TypeDesc::String))
                .param(ParamDecl::new("_repo", TypeDesc::String))
                .param(ParamDecl::new("topics", TypeDesc::Json))
                .param(ParamDecl::new("revision", TypeDesc::Integer).output())
                .header("revision", "X-Revision")
                .build(),
        )
        .method(
            MethodDecl::builder("getReadme")
                .path(":owner/:repo/readme")
                .param(ParamDecl::new("_owner", TypeDesc::String))
                .param(ParamDecl::new("_repo", TypeDesc::String))
                .content_type("text/markdown")
                .returns(TypeDesc::String)
                .build(),
        )
        .method(
            MethodDecl::builder("tracker")
                .returns_contract(issue_tracker_contract())
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{CompilerConfig, ContractCompiler};

    #[test]
    fn test_fixtures_compile() {
        let compiler = ContractCompiler::new(CompilerConfig::default());
        for contract in [profile_contract(), issue_tracker_contract(), repository_contract()] {
            let report = compiler.validate(&contract);
            assert!(report.is_ok(), "{}: {report}", contract.name());
        }
    }

    #[test]
    fn test_repository_layout() {
        let compiled = ContractCompiler::default()
            .compile(&repository_contract())
            .unwrap();
        let patterns: Vec<String> = compiled
            .all_routes()
            .iter()
            .map(|r| format!("{} {}", r.http_method(), r.full_pattern()))
            .collect();
        assert_eq!(
            patterns,
            vec![
                "GET /repos/:owner/:repo/pulls",
                "PATCH /repos/:owner/:repo/topics",
                "GET /repos/:owner/:repo/readme",
                "GET /repos/tracker/issues/:number",
                "GET /repos/tracker/issues/open",
                "POST /repos/tracker/issues/issue",
                "DELETE /repos/tracker/issues/:number",
            ]
        );
    }
}
