//! Blocking client for the production REST service.
//!
//! Covers login, registration and the project endpoints. Authenticated calls
//! carry `Authorization: Bearer <token>`; without a token they fail before any
//! request is sent.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::fields::ProjectType;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    username: &'a str,
    password: &'a str,
    active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: Option<String>,
    pub username: String,
    pub active: bool,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub count: u32,
}

impl TeamMember {
    /// Parse `NAME:COUNT` (count defaults to 1 when omitted).
    pub fn parse(s: &str) -> Option<Self> {
        let (name, count) = match s.rsplit_once(':') {
            Some((name, count)) => (name, count.trim().parse().ok()?),
            None => (s, 1),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(TeamMember { name: name.to_string(), count })
    }
}

/// Body of `POST /api/projects`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub name: String,
    pub description: String,
    pub project_type: ProjectType,
    pub team_members: Vec<TeamMember>,
}

/// A project as returned by the service. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub project_type: Option<ProjectType>,
    pub team_members: Vec<TeamMember>,
    pub active: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("Bearer {t}"))
            .ok_or(ApiError::NotAuthenticated)
    }

    /// `POST /api/auth/login`; returns the issued token.
    pub fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        require(&credentials.username, "username")?;
        require(&credentials.password, "password")?;
        debug!(username = %credentials.username, "logging in");
        let resp = self.agent.post(&self.url("/api/auth/login")).send_json(credentials)?;
        let body = resp.into_string().map_err(|e| ApiError::Decode { message: e.to_string() })?;
        token_from_body(&body)
    }

    /// `POST /register`.
    pub fn register(&self, credentials: &Credentials) -> Result<RegisteredUser, ApiError> {
        require(&credentials.username, "username")?;
        require(&credentials.password, "password")?;
        let body = Registration {
            username: &credentials.username,
            password: &credentials.password,
            active: true,
        };
        let resp = self.agent.post(&self.url("/register")).send_json(&body)?;
        decode(resp)
    }

    /// `GET /api/projects/my-projects`.
    pub fn my_projects(&self) -> Result<Vec<Project>, ApiError> {
        let auth = self.bearer()?;
        let resp = self
            .agent
            .get(&self.url("/api/projects/my-projects"))
            .set("Authorization", &auth)
            .call()?;
        decode(resp)
    }

    /// `GET /api/projects/has-active-projects`.
    pub fn has_active_projects(&self) -> Result<bool, ApiError> {
        let auth = self.bearer()?;
        let resp = self
            .agent
            .get(&self.url("/api/projects/has-active-projects"))
            .set("Authorization", &auth)
            .call()?;
        decode(resp)
    }

    /// `POST /api/projects`.
    pub fn create_project(&self, request: &ProjectRequest) -> Result<Project, ApiError> {
        require(&request.name, "project name")?;
        let auth = self.bearer()?;
        let resp = self
            .agent
            .post(&self.url("/api/projects"))
            .set("Authorization", &auth)
            .send_json(request)?;
        decode(resp)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::MissingField { field })
    } else {
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(resp: ureq::Response) -> Result<T, ApiError> {
    resp.into_json().map_err(|e| {
        warn!(error = %e, "undecodable response body");
        ApiError::Decode { message: e.to_string() }
    })
}

// The login endpoint answers with the bare token, either as plain text or as
// a JSON string.
fn token_from_body(body: &str) -> Result<String, ApiError> {
    let trimmed = body.trim();
    let token = match serde_json::from_str::<String>(trimmed) {
        Ok(s) => s,
        Err(_) => trimmed.to_string(),
    };
    if token.is_empty() {
        return Err(ApiError::Decode { message: "empty token in login response".into() });
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9/", Duration::from_millis(50))
    }

    #[test]
    fn authenticated_calls_need_a_token() {
        let api = client();
        assert!(matches!(api.my_projects(), Err(ApiError::NotAuthenticated)));
        assert!(matches!(api.has_active_projects(), Err(ApiError::NotAuthenticated)));
        let req = ProjectRequest {
            name: "Doc".into(),
            description: String::new(),
            project_type: ProjectType::FullLengthVideo,
            team_members: vec![],
        };
        assert!(matches!(api.create_project(&req), Err(ApiError::NotAuthenticated)));

        let blank = client().with_token(Some(" "));
        assert!(matches!(blank.my_projects(), Err(ApiError::NotAuthenticated)));
    }

    #[test]
    fn required_fields_are_checked_before_sending() {
        let api = client().with_token(Some("t"));
        let req = ProjectRequest {
            name: "  ".into(),
            description: String::new(),
            project_type: ProjectType::ShortFormContent,
            team_members: vec![],
        };
        assert!(matches!(api.create_project(&req), Err(ApiError::MissingField { field: "project name" })));

        let creds = Credentials { username: String::new(), password: "x".into() };
        assert!(matches!(api.login(&creds), Err(ApiError::MissingField { field: "username" })));
    }

    #[test]
    fn base_url_is_normalised() {
        assert_eq!(client().url("/register"), "http://127.0.0.1:9/register");
    }

    #[test]
    fn token_body_variants() {
        assert_eq!(token_from_body("abc\n").unwrap(), "abc");
        assert_eq!(token_from_body("\"abc\"").unwrap(), "abc");
        assert!(token_from_body("  ").is_err());
    }

    #[test]
    fn project_request_wire_shape() {
        let req = ProjectRequest {
            name: "Feature".into(),
            description: "Indie feature".into(),
            project_type: ProjectType::FullLengthVideo,
            team_members: vec![TeamMember { name: "Editor".into(), count: 2 }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["projectType"], "FULL_LENGTH_VIDEO");
        assert_eq!(json["teamMembers"][0]["count"], 2);
    }

    #[test]
    fn project_response_ignores_extra_fields() {
        let json = r#"{"id": "p1", "name": "Short", "projectType": "SHORT_FORM_CONTENT",
                       "teamMembers": [{"name": "Colorist", "count": 1}], "active": true,
                       "kanbanBoards": [], "metadataConfig": null, "createdAt": 1700000000000}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id.as_deref(), Some("p1"));
        assert_eq!(project.project_type, Some(ProjectType::ShortFormContent));
        assert!(project.active);
    }

    #[test]
    fn team_member_parsing() {
        assert_eq!(TeamMember::parse("Editor:3"), Some(TeamMember { name: "Editor".into(), count: 3 }));
        assert_eq!(TeamMember::parse("Sound"), Some(TeamMember { name: "Sound".into(), count: 1 }));
        assert_eq!(TeamMember::parse(":2"), None);
        assert_eq!(TeamMember::parse("VFX:many"), None);
    }
}
