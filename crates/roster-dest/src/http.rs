//! REST client for the destination (ManageBac v2 API).

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use roster_model::{
    AcademicCatalog, ChildRelationship, DestClass, DestParent, DestStudent, DestTeacher,
    EntityId, Membership, Operation, YearGroup,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::destination::Destination;
use crate::error::DestinationError;

const USER_AGENT_VALUE: &str = concat!("roster-sync/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const PER_PAGE: u32 = 200;

#[derive(Debug, Clone)]
pub struct DestinationCredentials {
    /// API root, e.g. `https://api.managebac.com`.
    pub base_url: String,
    pub auth_token: String,
}

#[derive(Debug, Clone)]
pub struct HttpDestination {
    client: Client,
    base_url: String,
}

impl HttpDestination {
    pub fn new(credentials: &DestinationCredentials) -> Result<Self, DestinationError> {
        let token = HeaderValue::from_str(&credentials.auth_token).map_err(|e| {
            DestinationError::Transport {
                url: credentials.base_url.clone(),
                message: format!("invalid auth token: {e}"),
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("auth-token", token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DestinationError::Transport {
                url: credentials.base_url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, DestinationError> {
        let raw = format!("{}/v2/{path}", self.base_url);
        let mut url = Url::parse(&raw).map_err(|e| DestinationError::Transport {
            url: raw.clone(),
            message: format!("invalid URL: {e}"),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, DestinationError> {
        tracing::debug!(%method, url = %url, "destination request");

        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(|e| DestinationError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        handle_response(&url, response)
    }

    /// Walk every page of a listing and collect the `collection` arrays.
    fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        collection: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, DestinationError> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut query = filters.to_vec();
            query.push(("page", page.to_string()));
            query.push(("per_page", PER_PAGE.to_string()));
            let url = self.url(path, &query)?;
            let mut body = self.send(Method::GET, url.clone(), None)?;

            let batch = body
                .get_mut(collection)
                .map(Value::take)
                .unwrap_or(Value::Array(Vec::new()));
            let batch: Vec<T> =
                serde_json::from_value(batch).map_err(|e| DestinationError::Malformed {
                    url: url.to_string(),
                    message: format!("`{collection}`: {e}"),
                })?;
            items.extend(batch);

            let total_pages = body
                .pointer("/meta/total_pages")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            if u64::from(page) >= total_pages {
                break;
            }
            page += 1;
        }
        tracing::debug!(path, count = items.len(), "listing complete");
        Ok(items)
    }

    /// Active records followed by archived ones, flagged accordingly.
    fn list_with_archived<T: DeserializeOwned>(
        &self,
        path: &str,
        collection: &str,
        mark: impl Fn(&mut T),
    ) -> Result<Vec<T>, DestinationError> {
        let mut items: Vec<T> = self.list(path, collection, &[])?;
        let mut archived: Vec<T> = self.list(path, collection, &[("archived", "true".into())])?;
        archived.iter_mut().for_each(&mark);
        items.append(&mut archived);
        Ok(items)
    }
}

/// HTTP method and path of the endpoint serving `operation`.
fn route(operation: &Operation) -> (Method, String) {
    match operation {
        Operation::CreateStudent { .. } => (Method::POST, "students".into()),
        Operation::UnarchiveStudent { id, .. } => (Method::PUT, format!("students/{id}/unarchive")),
        Operation::ArchiveStudent { id, .. } => (Method::PUT, format!("students/{id}/archive")),
        Operation::UpdateStudentField { id, .. } => (Method::PATCH, format!("students/{id}")),
        Operation::AddToYearGroup { year_group, .. } => {
            (Method::POST, format!("year-groups/{year_group}/students"))
        }
        Operation::RemoveFromYearGroup { year_group, .. } => {
            (Method::DELETE, format!("year-groups/{year_group}/students"))
        }
        Operation::CreateTeacher { .. } => (Method::POST, "teachers".into()),
        Operation::CreateParent { .. } => (Method::POST, "parents".into()),
        Operation::UnarchiveParent { id, .. } => (Method::PUT, format!("parents/{id}/unarchive")),
        Operation::LinkChild { parent, .. } => (Method::POST, format!("parents/{parent}/children")),
        Operation::UpdateChildRelationship { parent, child, .. } => {
            (Method::PATCH, format!("parents/{parent}/children/{child}"))
        }
        Operation::AddStudentToClass { class_id, .. } => {
            (Method::POST, format!("classes/{class_id}/students"))
        }
        Operation::RemoveStudentFromClass { class_id, .. } => {
            (Method::DELETE, format!("classes/{class_id}/students"))
        }
    }
}

fn handle_response(url: &Url, response: Response) -> Result<Value, DestinationError> {
    let status = response.status();
    let text = response.text().map_err(|e| DestinationError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(DestinationError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(&text).map_err(|e| DestinationError::Malformed {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// The catalogue is keyed by program code, either at the top level or
/// under `academic_years`.
fn parse_catalog(mut body: Value) -> Result<AcademicCatalog, serde_json::Error> {
    let inner = match body.get_mut("academic_years") {
        Some(inner) if inner.is_object() => inner.take(),
        _ => body,
    };
    serde_json::from_value(inner)
}

impl Destination for HttpDestination {
    fn year_groups(&self) -> Result<Vec<YearGroup>, DestinationError> {
        self.list("year-groups", "year_groups", &[])
    }

    fn students(&self) -> Result<Vec<DestStudent>, DestinationError> {
        self.list_with_archived("students", "students", |student: &mut DestStudent| {
            student.archived = true;
        })
    }

    fn teachers(&self) -> Result<Vec<DestTeacher>, DestinationError> {
        self.list("teachers", "teachers", &[])
    }

    fn parents(&self) -> Result<Vec<DestParent>, DestinationError> {
        self.list_with_archived("parents", "parents", |parent: &mut DestParent| {
            parent.archived = true;
        })
    }

    fn classes(&self, archived: bool) -> Result<Vec<DestClass>, DestinationError> {
        let filters = if archived {
            vec![("archived", "true".to_string())]
        } else {
            Vec::new()
        };
        let mut classes: Vec<DestClass> = self.list("classes", "classes", &filters)?;
        for class in &mut classes {
            class.archived = archived;
        }
        Ok(classes)
    }

    fn memberships(&self, on: NaiveDate) -> Result<Vec<Membership>, DestinationError> {
        self.list(
            "memberships",
            "memberships",
            &[
                ("class_happens_on", on.format("%Y-%m-%d").to_string()),
                ("classes", "active".to_string()),
                ("users", "active".to_string()),
            ],
        )
    }

    fn child_relationships(
        &self,
        parent: EntityId,
    ) -> Result<Vec<ChildRelationship>, DestinationError> {
        self.list(&format!("parents/{parent}/children"), "children", &[])
    }

    fn academic_years(&self) -> Result<AcademicCatalog, DestinationError> {
        let url = self.url("school/academic-years", &[])?;
        let body = self.send(Method::GET, url.clone(), None)?;
        parse_catalog(body).map_err(|e| DestinationError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn apply(&mut self, operation: &Operation) -> Result<Value, DestinationError> {
        let (method, path) = route(operation);
        let url = self.url(&path, &[])?;
        self.send(method, url, operation.payload().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use roster_model::StudentNumber;
    use serde_json::json;

    use super::*;

    #[test]
    fn routes_follow_operation_targets() {
        let op = Operation::RemoveStudentFromClass {
            student: StudentNumber::new("1001").unwrap(),
            student_id: EntityId(5),
            class: roster_model::ClassUid::new("MATH7").unwrap(),
            class_id: EntityId(40),
        };
        assert_eq!(route(&op), (Method::DELETE, "classes/40/students".to_string()));
    }

    #[test]
    fn catalog_accepts_wrapped_and_bare_layouts() {
        let years = json!({"ib": {"academic_years": [
            {"id": 1, "academic_terms": [{"id": 3, "starts_on": "2024-08-14"}]}
        ]}});
        let bare = parse_catalog(years.clone()).unwrap();
        let wrapped = parse_catalog(json!({ "academic_years": years })).unwrap();
        assert_eq!(bare, wrapped);
        assert!(bare.term_start("ib", 3).is_some());
    }
}
