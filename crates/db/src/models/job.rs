//! Job entity model and the serializable views built from it.

use pixbatch_core::types::{JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::item::Item;
use super::status::{ItemStatus, JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub status_id: StatusId,
    pub callback_url: Option<String>,
    /// Set once the completion webhook has been delivered successfully.
    pub webhook_delivered_at: Option<Timestamp>,
    /// Last delivery error after retries were exhausted, if any.
    pub webhook_error: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// One image entry in a [`JobView`] / webhook payload.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub input_url: String,
    pub output_url: Option<String>,
    pub status: &'static str,
}

/// Client-facing view of a job with all its items.
///
/// This is both the status-query response body and the webhook payload,
/// matching the wire contract:
/// `{job_id, status, images: [{input_url, output_url, status}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: JobId,
    pub status: &'static str,
    pub images: Vec<ItemView>,
}

impl JobView {
    /// Build the view from a job row and its item rows.
    pub fn from_parts(job: &Job, items: &[Item]) -> Self {
        Self {
            job_id: job.job_id,
            status: JobStatus::from_id(job.status_id)
                .map(JobStatus::as_str)
                .unwrap_or("unknown"),
            images: items
                .iter()
                .map(|item| ItemView {
                    input_url: item.input_url.clone(),
                    output_url: item.output_url.clone(),
                    status: ItemStatus::from_id(item.status_id)
                        .map(ItemStatus::as_str)
                        .unwrap_or("unknown"),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus) -> Job {
        Job {
            job_id: uuid::Uuid::new_v4(),
            status_id: status.id(),
            callback_url: None,
            webhook_delivered_at: None,
            webhook_error: None,
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    fn item(job_id: JobId, status: ItemStatus, output: Option<&str>) -> Item {
        Item {
            id: 1,
            job_id,
            label: "widget".to_string(),
            input_url: "https://cdn/a.png".to_string(),
            output_url: output.map(String::from),
            status_id: status.id(),
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn view_renders_status_names() {
        let j = job(JobStatus::Completed);
        let items = vec![item(j.job_id, ItemStatus::Processed, Some("out/x.jpg"))];
        let view = JobView::from_parts(&j, &items);

        assert_eq!(view.status, "completed");
        assert_eq!(view.images.len(), 1);
        assert_eq!(view.images[0].status, "processed");
        assert_eq!(view.images[0].output_url.as_deref(), Some("out/x.jpg"));
    }

    #[test]
    fn view_serializes_expected_shape() {
        let j = job(JobStatus::Processing);
        let items = vec![item(j.job_id, ItemStatus::Pending, None)];
        let json = serde_json::to_value(JobView::from_parts(&j, &items)).unwrap();

        assert_eq!(json["status"], "processing");
        assert!(json["images"].is_array());
        assert_eq!(json["images"][0]["output_url"], serde_json::Value::Null);
    }
}
