//! KOSIS statistics parameter API.
//!
//! One GET per job; the response is a flat JSON array of records
//! (`C1_NM`, `PRD_DE`, `DT`, ...). Error responses come back as an object.

use serde_json::Value;

use super::{body_head, HttpFetcher};
use crate::config::Settings;
use crate::error::{FetchError, FetchResult};
use crate::jobs::JobSpec;
use crate::logs::log_info_indent;

pub const BASE_URL: &str = "https://kosis.kr/openapi/Param/statisticsParameterData.do";

/// Optional parameters copied through when set
const PASSTHROUGH: [&str; 9] = [
    "itmId", "objL1", "objL2", "objL3", "objL4", "objL5", "objL6", "objL7", "objL8",
];

/// Query parameters for a KOSIS job.
///
/// `newEstPrdCnt` (latest N periods) wins over an explicit
/// `startPrdDe`/`endPrdDe` window.
pub fn build_params(job: &JobSpec, api_key: Option<&str>) -> FetchResult<Vec<(String, String)>> {
    let api_key = api_key.ok_or_else(|| FetchError::MissingCredential("KOSIS_API_KEY".into()))?;
    let required = |key: &str| {
        job.field_str(key)
            .ok_or_else(|| FetchError::InvalidJob(format!("kosis job requires {}", key)))
    };

    let mut params = vec![
        ("method".to_string(), "getList".to_string()),
        ("apiKey".to_string(), api_key.to_string()),
        ("orgId".to_string(), required("orgId")?),
        ("tblId".to_string(), required("tblId")?),
        ("prdSe".to_string(), job.field_str("prdSe").unwrap_or_else(|| "M".into())),
        ("format".to_string(), job.field_str("format").unwrap_or_else(|| "json".into())),
        ("jsonVD".to_string(), job.field_str("jsonVD").unwrap_or_else(|| "Y".into())),
    ];

    match job.field_str("newEstPrdCnt") {
        Some(count) => params.push(("newEstPrdCnt".to_string(), count)),
        None => {
            for key in ["startPrdDe", "endPrdDe"] {
                if let Some(v) = job.field_str(key) {
                    params.push((key.to_string(), v));
                }
            }
        }
    }

    for key in PASSTHROUGH {
        if let Some(v) = job.field_str(key) {
            params.push((key.to_string(), v));
        }
    }

    Ok(params)
}

/// Records of a KOSIS response body.
pub fn items_from_response(body: &str) -> FetchResult<Vec<Value>> {
    let doc: Value = serde_json::from_str(body).map_err(|e| FetchError::NotJson(e.to_string()))?;
    match doc {
        Value::Array(items) => Ok(items),
        other => Err(FetchError::Api(body_head(&other.to_string()))),
    }
}

pub async fn fetch(job: &JobSpec, settings: &Settings, fetcher: &HttpFetcher) -> FetchResult<Vec<Value>> {
    let params = build_params(job, settings.kosis_api_key.as_deref())?;
    log_info_indent(
        format!(
            "request: orgId={} tblId={}",
            job.field_str("orgId").unwrap_or_default(),
            job.field_str("tblId").unwrap_or_default()
        ),
        1,
    );

    let response = fetcher.get(BASE_URL, &params).await?;
    let items = items_from_response(&response.body)?;
    log_info_indent(format!("received {} records", items.len()), 1);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(v: Value) -> JobSpec {
        serde_json::from_value(v).unwrap()
    }

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_build_params_defaults() {
        let params = build_params(&job(json!({"orgId": 101, "tblId": "DT_1"})), Some("KEY")).unwrap();
        assert_eq!(get(&params, "method"), Some("getList"));
        assert_eq!(get(&params, "apiKey"), Some("KEY"));
        assert_eq!(get(&params, "orgId"), Some("101"));
        assert_eq!(get(&params, "prdSe"), Some("M"));
        assert_eq!(get(&params, "format"), Some("json"));
        assert_eq!(get(&params, "jsonVD"), Some("Y"));
        assert_eq!(get(&params, "itmId"), None);
    }

    #[test]
    fn test_build_params_optional_fields() {
        let params = build_params(
            &job(json!({
                "orgId": "101", "tblId": "DT_1", "prdSe": "Y",
                "itmId": "T20", "objL1": "ALL", "objL2": " ", "objL8": "00",
                "newEstPrdCnt": 3, "startPrdDe": "2020"
            })),
            Some("KEY"),
        )
        .unwrap();
        assert_eq!(get(&params, "prdSe"), Some("Y"));
        assert_eq!(get(&params, "itmId"), Some("T20"));
        assert_eq!(get(&params, "objL1"), Some("ALL"));
        assert_eq!(get(&params, "objL2"), None);
        assert_eq!(get(&params, "objL8"), Some("00"));
        assert_eq!(get(&params, "newEstPrdCnt"), Some("3"));
        assert_eq!(get(&params, "startPrdDe"), None);
    }

    #[test]
    fn test_build_params_period_window() {
        let params = build_params(
            &job(json!({"orgId": "101", "tblId": "DT_1", "startPrdDe": "202001", "endPrdDe": "202012"})),
            Some("KEY"),
        )
        .unwrap();
        assert_eq!(get(&params, "startPrdDe"), Some("202001"));
        assert_eq!(get(&params, "endPrdDe"), Some("202012"));
    }

    #[test]
    fn test_build_params_requires_key_and_ids() {
        let j = job(json!({"orgId": "101", "tblId": "DT_1"}));
        assert!(matches!(
            build_params(&j, None),
            Err(FetchError::MissingCredential(_))
        ));

        let j = job(json!({"orgId": "101"}));
        match build_params(&j, Some("KEY")) {
            Err(FetchError::InvalidJob(msg)) => assert!(msg.contains("tblId")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_items_from_response() {
        let items = items_from_response(r#"[{"C1_NM": "Seoul", "DT": "10"}]"#).unwrap();
        assert_eq!(items, vec![json!({"C1_NM": "Seoul", "DT": "10"})]);

        match items_from_response(r#"{"err": "20", "errMsg": "bad key"}"#) {
            Err(FetchError::Api(msg)) => assert!(msg.contains("bad key")),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(
            items_from_response("<html>"),
            Err(FetchError::NotJson(_))
        ));
    }
}
