use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notify::NotificationSink;
use super::validation::{validate, ValidationError};
use super::StoreError;
use crate::api::RequestSource;
use crate::models::{
    Notice, Notification, Request, RequestDraft, RequestEdit, RequestStatus, StatusChange, User,
};
use crate::repository::{FetchError, RequestRepository, REQUESTS_KEY};
use crate::storage::KeyValueStore;
use crate::utils::format_date_range;
use crate::visibility::{can_edit, visible_requests, RequestSummary};

/// Key the request collection is persisted under
pub const STORAGE_KEY: &str = "leavedesk_requests";

/// Stored when a rejection comes without a reason
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

pub struct LifecycleStore<S> {
    repository: RequestRepository<S>,
    storage: Box<dyn KeyValueStore>,
    sink: Box<dyn NotificationSink>,
    requests: Vec<Request>,
}

impl<S: RequestSource> LifecycleStore<S> {
    /// Build a store, starting from whatever collection was persisted last.
    pub fn new(
        repository: RequestRepository<S>,
        storage: Box<dyn KeyValueStore>,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        let requests = Self::load_persisted(storage.as_ref());
        Self {
            repository,
            storage,
            sink,
            requests,
        }
    }

    fn load_persisted(storage: &dyn KeyValueStore) -> Vec<Request> {
        let contents = match storage.load(STORAGE_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted requests, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Request>>(&contents) {
            Ok(requests) => {
                debug!(count = requests.len(), "Loaded persisted requests");
                requests
            }
            Err(e) => {
                warn!(error = %e, "Persisted requests are unreadable, starting empty");
                Vec::new()
            }
        }
    }

    // ===== Reads =====

    /// The local collection as last loaded or mutated
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn get(&self, id: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn repository(&self) -> &RequestRepository<S> {
        &self.repository
    }

    pub fn visible(&self, viewer: &User) -> Vec<&Request> {
        visible_requests(&self.requests, viewer)
    }

    pub fn summary(&self, viewer: &User) -> RequestSummary {
        RequestSummary::from_requests(&self.visible(viewer))
    }

    /// Read through the repository, which serves from cache while fresh.
    /// The result replaces and persists the local collection.
    pub async fn load(&mut self) -> Result<&[Request], StoreError> {
        let requests = self.repository.fetch_requests().await?;
        self.replace_all(requests)?;
        Ok(&self.requests)
    }

    /// Like `load`, but always goes to the remote first.
    pub async fn refresh(&mut self) -> Result<&[Request], StoreError> {
        let requests = self.repository.force_refresh().await?;
        self.replace_all(requests)?;
        Ok(&self.requests)
    }

    pub async fn notifications(&mut self) -> Result<Vec<Notification>, StoreError> {
        Ok(self.repository.fetch_notifications().await?)
    }

    // ===== Mutations =====

    pub async fn add_request(&mut self, draft: RequestDraft) -> Result<Request, StoreError> {
        let valid = validate(&draft)?;
        let request = valid.into_request(Uuid::new_v4().to_string(), draft.employee, Utc::now());

        let created = match self.repository.create(&request).await {
            Ok(created) => created,
            Err(e) => return Err(self.sync_failed(e, "submit request")),
        };

        self.commit(created.clone())?;
        info!(
            id = %created.id,
            employee = %created.employee.id,
            kind = created.request_type.as_str(),
            "Request submitted"
        );
        self.sink.add_notification(Notice::success(format!(
            "{} request submitted for {}",
            created.request_type,
            format_date_range(created.start_date, created.end_date)
        )));
        Ok(created)
    }

    pub async fn update_request_status(
        &mut self,
        id: &str,
        new_status: RequestStatus,
        actor: &User,
        rejection_reason: Option<&str>,
    ) -> Result<Request, StoreError> {
        let request = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if request.status.is_terminal() || !new_status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: request.status,
                to: new_status,
            });
        }
        if request.is_owned_by(&actor.id) {
            return Err(StoreError::SelfApproval {
                id: id.to_string(),
                actor: actor.id.clone(),
            });
        }
        if !actor.role.is_reviewer() {
            return Err(StoreError::NotPermitted {
                id: id.to_string(),
                actor: actor.id.clone(),
                action: "review",
            });
        }

        let rejection_reason = match new_status {
            RequestStatus::Rejected => Some(resolve_rejection_reason(rejection_reason)?),
            _ => None,
        };

        let change = StatusChange {
            status: new_status,
            approved_by: actor.to_ref(),
            rejection_reason,
            updated_at: Utc::now(),
        };

        let updated = match self.repository.update_status(id, &change).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.sync_failed(e, "update request status")),
        };

        self.commit(updated.clone())?;
        info!(
            id = %updated.id,
            status = updated.status.as_str(),
            actor = %actor.id,
            "Request status updated"
        );

        let subject = format!("{} request for {}", updated.request_type, updated.employee.name);
        let notice = match new_status {
            RequestStatus::Rejected => {
                let reason = updated
                    .rejection_reason
                    .as_deref()
                    .unwrap_or(DEFAULT_REJECTION_REASON);
                Notice::warning(format!("{} rejected: {}", subject, reason))
            }
            _ => Notice::success(format!("{} approved", subject)),
        };
        self.sink.add_notification(notice);
        Ok(updated)
    }

    /// Change the fields of a pending request.
    pub async fn edit_request(
        &mut self,
        id: &str,
        edit: RequestEdit,
        actor: &User,
    ) -> Result<Request, StoreError> {
        let request = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !request.is_pending() {
            return Err(StoreError::NotPending {
                id: id.to_string(),
                status: request.status,
            });
        }
        if !can_edit(actor, request) {
            return Err(StoreError::NotPermitted {
                id: id.to_string(),
                actor: actor.id.clone(),
                action: "edit",
            });
        }
        if edit.is_empty() {
            return Err(ValidationError::EmptyEdit.into());
        }

        let valid = validate(&edit.apply(RequestDraft::from_request(request)))?;
        let edited = valid.apply_to(request.clone(), Utc::now());

        let updated = match self.repository.update(&edited).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.sync_failed(e, "edit request")),
        };

        self.commit(updated.clone())?;
        info!(id = %updated.id, actor = %actor.id, "Request edited");
        self.sink.add_notification(Notice::success(format!(
            "{} request updated",
            updated.request_type
        )));
        Ok(updated)
    }

    // ===== Internals =====

    /// Upsert `request`, persist the whole collection, then invalidate the
    /// cached collection. Invalidation happens even if persisting fails,
    /// since the remote already holds the write.
    fn commit(&mut self, request: Request) -> Result<(), StoreError> {
        match self.requests.iter_mut().find(|r| r.id == request.id) {
            Some(slot) => *slot = request,
            None => self.requests.push(request),
        }
        let persisted = self.persist();
        self.repository.invalidate(Some(&[REQUESTS_KEY][..]));
        persisted
    }

    fn replace_all(&mut self, requests: Vec<Request>) -> Result<(), StoreError> {
        self.requests = requests;
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(&self.requests)
            .map_err(|e| StoreError::Storage(e.into()))?;
        self.storage
            .save(STORAGE_KEY, &contents)
            .map_err(StoreError::Storage)
    }

    /// A mutation did not reach the remote. Nothing was committed locally;
    /// invalidating makes the next read resynchronize with the remote.
    fn sync_failed(&mut self, error: FetchError, action: &str) -> StoreError {
        warn!(error = %error, action = action, "Remote rejected mutation");
        self.repository.invalidate(Some(&[REQUESTS_KEY][..]));
        let message = if error.source.is_conflict() {
            format!(
                "Could not {}: the request was changed elsewhere, refresh to see the latest",
                action
            )
        } else {
            format!("Failed to {}: {}", action, error.source)
        };
        self.sink.add_notification(Notice::error(message));
        StoreError::Fetch(error)
    }
}

fn resolve_rejection_reason(reason: Option<&str>) -> Result<String, ValidationError> {
    match reason {
        None => Ok(DEFAULT_REJECTION_REASON.to_string()),
        Some(r) if r.trim().is_empty() => Err(ValidationError::MissingField("rejectionReason")),
        Some(r) => Ok(r.trim().to_string()),
    }
}
