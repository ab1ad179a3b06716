use super::MockDataStore;
use crate::{
    error::{CourtroomError, CourtroomResult},
    model::{AuditEventType, Document, DocumentStatus, DocumentUpload, JsonMap},
    schedule::Transition,
};
use serde_json::{json, Value};

impl MockDataStore {
    /// Attach an upload to a case and schedule its parse lifecycle:
    /// uploaded → parsing → extracted.
    pub fn add_document(
        &mut self,
        case_id: &str,
        upload: DocumentUpload,
    ) -> CourtroomResult<Document> {
        self.case_record(case_id)?;
        let now = self.clock.now();
        let size = upload.size();
        let document = Document {
            document_id: self.rng.ids.next_id("doc"),
            case_id: case_id.to_string(),
            filename: upload.filename.clone(),
            content_type: upload.content_type,
            status: DocumentStatus::Uploaded,
            extracted_fields: None,
            created_at: now,
            size: Some(size),
        };
        let document_id = document.document_id.clone();

        let handle = self.schedule.new_handle();
        let base = self.clock.elapsed_ms;
        self.schedule.schedule(
            handle,
            case_id,
            base.saturating_add(self.config.parse_start_ms),
            Transition::DocumentStatus {
                document_id: document_id.clone(),
                status: DocumentStatus::Parsing,
            },
        );
        self.schedule.schedule(
            handle,
            case_id,
            base.saturating_add(self.config.extract_done_ms),
            Transition::DocumentStatus {
                document_id: document_id.clone(),
                status: DocumentStatus::Extracted,
            },
        );
        self.document_tasks.insert(document_id.clone(), handle);
        self.documents.insert(document_id.clone(), document.clone());

        let record = self.case_record_mut(case_id)?;
        record.document_ids.push(document_id.clone());
        record.updated_at = now;

        self.record(
            case_id,
            AuditEventType::UploadedDocs,
            json!({
                "document_id": document_id,
                "filename": upload.filename,
                "size": size,
            }),
        )?;
        log::info!("Uploaded {} to {case_id} as {document_id}", document.filename);
        Ok(document)
    }

    /// Documents of a case in upload order.
    pub fn documents(&self, case_id: &str) -> CourtroomResult<Vec<Document>> {
        let record = self.case_record(case_id)?;
        Ok(record
            .document_ids
            .iter()
            .filter_map(|id| self.documents.get(id).cloned())
            .collect())
    }

    pub fn document(&self, document_id: &str) -> CourtroomResult<Document> {
        self.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| CourtroomError::not_found("Document", document_id))
    }

    /// Mark a document as failed. Its pending parse transitions are dropped.
    pub fn fail_document(&mut self, document_id: &str, reason: &str) -> CourtroomResult<Document> {
        let document = self
            .documents
            .get_mut(document_id)
            .ok_or_else(|| CourtroomError::not_found("Document", document_id))?;
        document.status = DocumentStatus::Error;
        let mut fields = JsonMap::new();
        fields.insert("error".into(), Value::String(reason.to_string()));
        document.extracted_fields = Some(fields);
        let document = document.clone();

        if let Some(handle) = self.document_tasks.remove(document_id) {
            self.schedule.cancel(handle);
        }
        log::warn!("Document {document_id} failed: {reason}");
        Ok(document)
    }

    pub(super) fn apply_document_status(&mut self, document_id: &str, status: DocumentStatus) {
        let Some(document) = self.documents.get_mut(document_id) else {
            return;
        };
        document.status = status;
        if status == DocumentStatus::Extracted {
            let mut fields = JsonMap::new();
            fields.insert("processed".into(), Value::Bool(true));
            document.extracted_fields = Some(fields);
            self.document_tasks.remove(document_id);
        }
        log::debug!("Document {document_id} → {status:?}");
    }
}
