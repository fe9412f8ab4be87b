//! Public data portal (data.go.kr) endpoints.
//!
//! Each job names its own endpoint and query parameters. The service key is
//! never stored in job files: a parameter whose value is
//! `{{DATA_GO_KR_SERVICE_KEY}}` is filled in from the environment.

use serde_json::{Map, Value};

use super::{body_head, HttpFetcher};
use crate::config::Settings;
use crate::error::{FetchError, FetchResult};
use crate::extract::{extract_items, normalize_to_list};
use crate::jobs::JobSpec;
use crate::logs::{log_info_indent, log_warning};

pub const SERVICE_KEY_PLACEHOLDER: &str = "{{DATA_GO_KR_SERVICE_KEY}}";

/// Endpoint URL and query parameters for a data.go.kr job.
pub fn build_request(
    job: &JobSpec,
    service_key: Option<&str>,
) -> FetchResult<(String, Vec<(String, String)>)> {
    let base_url = job
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FetchError::InvalidJob("data_go_kr job requires base_url".into()))?;

    let empty = Map::new();
    let raw = match &job.params {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(FetchError::InvalidJob(
                "data_go_kr params must be an object".into(),
            ))
        }
    };

    let mut params = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let text = match value {
            Value::Null => continue,
            Value::String(s) if s.trim() == SERVICE_KEY_PLACEHOLDER => service_key
                .ok_or_else(|| FetchError::MissingCredential("DATA_GO_KR_SERVICE_KEY".into()))?
                .to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((key.clone(), text));
    }

    Ok((base_url.to_string(), params))
}

/// Items of a data.go.kr response body.
///
/// With `item_path` the items are read from that path; without it the
/// body itself must be a JSON array.
pub fn items_from_response(body: &str, item_path: Option<&str>) -> FetchResult<Vec<Value>> {
    let doc: Value = serde_json::from_str(body).map_err(|_| {
        FetchError::NotJson("data.go.kr response is not JSON; check the type/json params".into())
    })?;

    match item_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Ok(extract_items(&doc, path)),
        None if doc.is_array() => Ok(normalize_to_list(doc)),
        None => Err(FetchError::InvalidJob(
            "data_go_kr job requires item_path (e.g. response.body.items.item)".into(),
        )),
    }
}

pub async fn fetch(job: &JobSpec, settings: &Settings, fetcher: &HttpFetcher) -> FetchResult<Vec<Value>> {
    let (url, params) = build_request(job, settings.data_go_kr_service_key.as_deref())?;
    let response = fetcher.get(&url, &params).await?;

    log_info_indent(format!("status: {}", response.status), 1);
    log_info_indent(
        format!(
            "content-type: {}",
            response.content_type.as_deref().unwrap_or("-")
        ),
        1,
    );
    log_info_indent(format!("body: {}", body_head(&response.body)), 1);

    let items = items_from_response(&response.body, job.item_path.as_deref())?;
    if items.is_empty() {
        log_warning(format!(
            "data.go.kr returned 0 items (item_path={})",
            job.item_path.as_deref().unwrap_or("")
        ));
    }
    Ok(items)
}
