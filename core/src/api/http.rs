//! REST backend.
//!
//! Every response body is deserialized into the typed model and then passed
//! through `Validate` before it reaches the caller.

use super::{
    wire::{
        CaseEnvelope, ClauseList, CreateCaseRequest, DocumentEnvelope, DocumentList,
        FraudSignalsEnvelope, PolicyEnvelope, PolicyList, StartDebateRequest, StartDebateResponse,
    },
    CourtroomApi,
};
use crate::{
    config::ApiConfig,
    error::{CourtroomError, CourtroomResult},
    model::{
        ApplicantPayload, AuditEvent, Case, CaseList, DashboardStats, DecisionBundle, Document,
        DocumentUpload, FraudSignals, Policy, PolicyClause, PolicyType, RunStatus, Transcript,
    },
    store::CaseQuery,
    validation::Validate,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub struct HttpBackend {
    client: Client,
    origin: Url,
    base_path: String,
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}

fn checked<T: Validate>(value: T) -> CourtroomResult<T> {
    value.validate()?;
    Ok(value)
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> CourtroomResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            origin: Url::parse(&config.api_origin)?,
            base_path: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL of an endpoint under the base path. Each segment is
    /// percent-encoded, so ids never add path levels or a query.
    pub fn url(&self, segments: &[&str]) -> CourtroomResult<Url> {
        let mut url = self.origin.join(&self.base_path)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> CourtroomResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("{} {} from {}", status.as_u16(), status_text(status), response.url());
            return Err(CourtroomError::Transport {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> CourtroomResult<T> {
        let response = self.send(self.client.get(self.url(segments)?)).await?;
        Ok(response.json().await?)
    }

    async fn upload<T: DeserializeOwned>(&self, segments: &[&str], form: Form) -> CourtroomResult<T> {
        let response = self.client.post(self.url(segments)?).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CourtroomError::UploadFailed {
                status_text: status_text(status),
            });
        }
        Ok(response.json().await?)
    }

    fn file_part(upload: DocumentUpload) -> CourtroomResult<Part> {
        Ok(Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)?)
    }
}

#[async_trait]
impl CourtroomApi for HttpBackend {
    async fn create_case(&self, request: CreateCaseRequest) -> CourtroomResult<Case> {
        let response = self
            .send(self.client.post(self.url(&["cases"])?).json(&request))
            .await?;
        let envelope: CaseEnvelope = response.json().await?;
        checked(envelope.case)
    }

    async fn list_cases(&self, query: CaseQuery) -> CourtroomResult<CaseList> {
        let response = self
            .send(self.client.get(self.url(&["cases"])?).query(&query))
            .await?;
        checked(response.json::<CaseList>().await?)
    }

    async fn get_case(&self, case_id: &str) -> CourtroomResult<Case> {
        let envelope: CaseEnvelope = self.get(&["cases", case_id]).await?;
        checked(envelope.case)
    }

    async fn update_applicant(&self, case_id: &str, patch: ApplicantPayload) -> CourtroomResult<Case> {
        patch.validate()?;
        let url = self.url(&["cases", case_id, "applicant"])?;
        let response = self.send(self.client.patch(url).json(&patch)).await?;
        let envelope: CaseEnvelope = response.json().await?;
        checked(envelope.case)
    }

    async fn upload_document(&self, case_id: &str, upload: DocumentUpload) -> CourtroomResult<Document> {
        let form = Form::new().part("file", Self::file_part(upload)?);
        let envelope: DocumentEnvelope = self.upload(&["cases", case_id, "documents"], form).await?;
        checked(envelope.document)
    }

    async fn list_documents(&self, case_id: &str) -> CourtroomResult<Vec<Document>> {
        let list: DocumentList = self.get(&["cases", case_id, "documents"]).await?;
        checked(list.items)
    }

    async fn start_debate(
        &self,
        case_id: &str,
        request: StartDebateRequest,
    ) -> CourtroomResult<StartDebateResponse> {
        let url = self.url(&["cases", case_id, "run"])?;
        let response = self.send(self.client.post(url).json(&request)).await?;
        checked(response.json::<StartDebateResponse>().await?)
    }

    async fn run_status(&self, run_id: &str) -> CourtroomResult<RunStatus> {
        checked(self.get(&["runs", run_id, "status"]).await?)
    }

    async fn transcript(&self, run_id: &str) -> CourtroomResult<Transcript> {
        checked(self.get(&["runs", run_id, "transcript"]).await?)
    }

    async fn decision(&self, run_id: &str) -> CourtroomResult<DecisionBundle> {
        checked(self.get(&["runs", run_id, "decision"]).await?)
    }

    async fn audit_events(&self, case_id: &str) -> CourtroomResult<Vec<AuditEvent>> {
        checked(self.get(&["cases", case_id, "audit"]).await?)
    }

    async fn dashboard_stats(&self) -> CourtroomResult<DashboardStats> {
        self.get(&["dashboard", "stats"]).await
    }

    async fn export_report(&self, case_id: &str) -> CourtroomResult<Vec<u8>> {
        let url = self.url(&["cases", case_id, "export.pdf"])?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn fraud_signals(&self, case_id: &str) -> CourtroomResult<FraudSignals> {
        let envelope: FraudSignalsEnvelope = self.get(&["cases", case_id, "fraud-signals"]).await?;
        checked(envelope.fraud_signals)
    }

    async fn list_policies(&self) -> CourtroomResult<PolicyList> {
        let list: PolicyList = self.get(&["policies"]).await?;
        list.items.validate()?;
        Ok(list)
    }

    async fn get_policy(&self, policy_id: &str) -> CourtroomResult<Policy> {
        let envelope: PolicyEnvelope = self.get(&["policies", policy_id]).await?;
        checked(envelope.policy)
    }

    async fn upload_policy(
        &self,
        upload: DocumentUpload,
        name: &str,
        document_type: PolicyType,
    ) -> CourtroomResult<Policy> {
        let document_type = serde_json::to_value(document_type)?
            .as_str()
            .unwrap_or_default()
            .to_string();
        let form = Form::new()
            .part("file", Self::file_part(upload)?)
            .text("name", name.to_string())
            .text("document_type", document_type);
        checked(self.upload(&["policies", "upload"], form).await?)
    }

    async fn policy_evidence(&self, case_id: &str) -> CourtroomResult<Vec<PolicyClause>> {
        let list: ClauseList = self.get(&["cases", case_id, "policy-evidence"]).await?;
        checked(list.clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls_join_origin_and_base() {
        let backend = HttpBackend::new(&ApiConfig {
            api_origin: "http://localhost:8000".into(),
            api_base_url: "/api/v1/".into(),
            ..ApiConfig::default()
        })
        .expect("backend");
        let url = backend.url(&["cases", "case_001", "audit"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/cases/case_001/audit");
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let backend = HttpBackend::new(&ApiConfig {
            api_origin: "http://localhost:8000".into(),
            api_base_url: "/api/v1".into(),
            ..ApiConfig::default()
        })
        .expect("backend");
        let url = backend.url(&["cases", "a/b?c#d", "audit"]).unwrap();
        assert_eq!(url.path(), "/api/v1/cases/a%2Fb%3Fc%23d/audit");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn empty_base_path_sits_at_the_origin_root() {
        let backend = HttpBackend::new(&ApiConfig {
            api_origin: "http://localhost:8000".into(),
            api_base_url: "/".into(),
            ..ApiConfig::default()
        })
        .expect("backend");
        let url = backend.url(&["policies"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/policies");
    }

    #[test]
    fn bad_origin_is_rejected() {
        let result = HttpBackend::new(&ApiConfig {
            api_origin: "not a url".into(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(CourtroomError::Url(_))));
    }
}
