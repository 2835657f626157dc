use std::sync::Arc;

use poem_openapi::{OpenApi, param::Path, payload::Json};

use super::models::{
    ErrorDto, GetProgressResponse, NoItemsDto, PercentDto, ProgressReportDto,
    ReportProgressResponse, UserProgressResponse, ViewedDto, ViewedResponse,
};
use super::services::progress::{ProgressError, ProgressService};
use crate::storage::ProgressRepo;

pub struct ProgressApi {
    pub repo: Arc<dyn ProgressRepo>,
}

impl ProgressApi {
    fn service(&self) -> ProgressService<'_> {
        ProgressService::new(self.repo.as_ref())
    }
}

fn internal_error(e: &ProgressError) -> Json<ErrorDto> {
    tracing::error!(error = %format!("{:?}", e), "progress store failure");
    ErrorDto::json(format!("storage error: {}", e))
}

#[OpenApi]
impl ProgressApi {
    /// Report watch progress; creates or overwrites the record of (uid, vid)
    #[oai(path = "/progress", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn report_progress(&self, body: Json<ProgressReportDto>) -> ReportProgressResponse {
        let report = match body.0.into_report() {
            Ok(report) => report,
            Err(e) => return ReportProgressResponse::BadRequest(ErrorDto::json(e.to_string())),
        };
        tracing::debug!(uid = report.uid, vid = report.vid, "handling report_progress");
        match self.service().report(report).await {
            Ok(record) => ReportProgressResponse::Ok(Json(record.into())),
            Err(e) => ReportProgressResponse::InternalError(internal_error(&e)),
        }
    }

    /// Stored percent of a user on a video
    #[oai(path = "/progress/:uid/:vid", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, uid, vid))]
    async fn get_progress(&self, uid: Path<i64>, vid: Path<i64>) -> GetProgressResponse {
        tracing::debug!(uid = uid.0, vid = vid.0, "handling get_progress");
        match self.service().percent(uid.0, vid.0).await {
            Ok(percent) => GetProgressResponse::Ok(Json(PercentDto { percent })),
            Err(ProgressError::NotFound) => GetProgressResponse::NotFound,
            Err(e) => GetProgressResponse::InternalError(internal_error(&e)),
        }
    }

    /// Whether the user has any progress on the video
    #[oai(path = "/progress/:uid/:vid/viewed", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, uid, vid))]
    async fn get_viewed(&self, uid: Path<i64>, vid: Path<i64>) -> ViewedResponse {
        tracing::debug!(uid = uid.0, vid = vid.0, "handling get_viewed");
        match self.service().viewed(uid.0, vid.0).await {
            Ok(viewed) => ViewedResponse::Ok(Json(ViewedDto { viewed })),
            Err(e) => ViewedResponse::InternalError(internal_error(&e)),
        }
    }

    /// Every video of the user, most recently updated first
    #[oai(path = "/progress/:uid", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, uid))]
    async fn list_user_progress(&self, uid: Path<i64>) -> UserProgressResponse {
        tracing::debug!(uid = uid.0, "handling list_user_progress");
        match self.service().list_for_user(uid.0).await {
            Ok(progress) => UserProgressResponse::Ok(Json(progress.into())),
            Err(ProgressError::NoItems) => UserProgressResponse::NoItems(Json(NoItemsDto {
                error: "no items".into(),
            })),
            Err(e) => UserProgressResponse::InternalError(internal_error(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use poem::{http::StatusCode, test::TestClient};
    use serde_json::json;

    use super::*;
    use crate::domain::models::{ProgressRecord, ProgressReport};
    use crate::storage::{InMemoryProgressRepo, SeaOrmProgressRepo, database::memory_database};

    fn client_for(repo: Arc<dyn ProgressRepo>) -> TestClient<impl poem::Endpoint> {
        TestClient::new(crate::app(repo, "http://localhost:3000".into()))
    }

    fn client() -> TestClient<impl poem::Endpoint> {
        client_for(Arc::new(InMemoryProgressRepo::new()))
    }

    /// Store whose every call fails, as an unreachable database would.
    struct FailingRepo;

    #[async_trait::async_trait]
    impl ProgressRepo for FailingRepo {
        async fn find_by_uid_vid(&self, _: i64, _: i64) -> anyhow::Result<Option<ProgressRecord>> {
            Err(anyhow::anyhow!("database is locked"))
        }

        async fn insert(&self, _: ProgressReport, _: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
            Err(anyhow::anyhow!("database is locked"))
        }

        async fn update_by_uid_vid(
            &self,
            _: ProgressReport,
            _: DateTime<Utc>,
        ) -> anyhow::Result<Option<ProgressRecord>> {
            Err(anyhow::anyhow!("database is locked"))
        }

        async fn list_by_uid_ordered_by_update_desc(&self, _: i64) -> anyhow::Result<Vec<ProgressRecord>> {
            Err(anyhow::anyhow!("database is locked"))
        }

        async fn upsert(&self, _: ProgressReport, _: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
            Err(anyhow::anyhow!("database is locked"))
        }
    }

    #[tokio::test]
    async fn report_returns_the_full_record() {
        let cli = client();
        let resp = cli
            .post("/progress")
            .body_json(&json!({ "uid": 7, "vid": 3, "percent": "42" }))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let record = body.value().object();
        record.get("id").assert_i64(1);
        record.get("uid").assert_i64(7);
        record.get("vid").assert_i64(3);
        record.get("percent").assert_string("42");
        let created_at = record.get("created_at").string().to_string();
        assert!(created_at.parse::<DateTime<Utc>>().is_ok());
    }

    #[tokio::test]
    async fn report_then_get_round_trips() {
        let cli = client();
        cli.post("/progress")
            .body_json(&json!({ "uid": 7, "vid": 3, "percent": "42" }))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli.get("/progress/7/3").send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({ "percent": "42" })).await;
    }

    #[tokio::test]
    async fn numeric_percent_is_stored_as_text() {
        let cli = client();
        cli.post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 2, "percent": 12.5 }))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli.get("/progress/1/2").send().await;
        resp.assert_json(json!({ "percent": "12.5" })).await;

        let resp = cli
            .post("/progress")
            .header("content-type", "application/json")
            .body(r#"{ "uid": 1, "vid": 3, "percent": 1e2 }"#)
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        body.value().object().get("percent").assert_string("100");
    }

    #[tokio::test]
    async fn second_report_overwrites_percent() {
        let cli = client();
        let first = cli
            .post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 1, "percent": "10" }))
            .send()
            .await;
        let first = first.json().await;
        let second = cli
            .post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 1, "percent": "90" }))
            .send()
            .await;
        second.assert_status_is_ok();
        let second = second.json().await;

        let (first, second) = (first.value().object(), second.value().object());
        second.get("id").assert_i64(first.get("id").i64());
        second.get("percent").assert_string("90");

        let resp = cli.get("/progress/1").send().await;
        let body = resp.json().await;
        body.value().object().get("count").assert_i64(1);
    }

    #[tokio::test]
    async fn missing_progress_is_404_with_empty_body() {
        let resp = client().get("/progress/7/3").send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
        resp.assert_text("").await;
    }

    #[tokio::test]
    async fn viewed_flips_after_first_report() {
        let cli = client();
        let resp = cli.get("/progress/2/8/viewed").send().await;
        resp.assert_status_is_ok();
        resp.assert_json(json!({ "viewed": false })).await;

        cli.post("/progress")
            .body_json(&json!({ "uid": 2, "vid": 8, "percent": "0" }))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli.get("/progress/2/8/viewed").send().await;
        resp.assert_json(json!({ "viewed": true })).await;
    }

    #[tokio::test]
    async fn user_listing_and_no_items() {
        let cli = client();
        cli.post("/progress")
            .body_json(&json!({ "uid": 5, "vid": 9, "percent": "100" }))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli.get("/progress/5").send().await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let listing = body.value().object();
        listing.get("count").assert_i64(1);
        let videos = listing.get("videos").array();
        videos.assert_len(1);
        videos.get(0).object().get("percent").assert_string("100");
        videos.get(0).object().get("vid").assert_i64(9);

        let resp = cli.get("/progress/6").send().await;
        resp.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn invalid_percent_is_rejected() {
        let cli = client();
        let resp = cli
            .post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 1, "percent": true }))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let resp = cli
            .post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 1 }))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        cli.get("/progress/1/1/viewed")
            .send()
            .await
            .assert_json(json!({ "viewed": false }))
            .await;
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_by_the_framework() {
        let resp = client()
            .post("/progress")
            .body_json(&json!({ "uid": "seven", "vid": 3, "percent": "1" }))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn endpoints_work_against_sqlite() {
        let repo = Arc::new(SeaOrmProgressRepo::new(memory_database().await));
        let cli = client_for(repo);
        for percent in ["10", "90"] {
            cli.post("/progress")
                .body_json(&json!({ "uid": 1, "vid": 1, "percent": percent }))
                .send()
                .await
                .assert_status_is_ok();
        }

        cli.get("/progress/1/1")
            .send()
            .await
            .assert_json(json!({ "percent": "90" }))
            .await;
        let resp = cli.get("/progress/1").send().await;
        let body = resp.json().await;
        body.value().object().get("count").assert_i64(1);
        cli.get("/progress/2")
            .send()
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn storage_failures_are_500_with_a_message() {
        let cli = client_for(Arc::new(FailingRepo));

        let resp = cli
            .post("/progress")
            .body_json(&json!({ "uid": 1, "vid": 1, "percent": "10" }))
            .send()
            .await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        resp.assert_json(json!({ "message": "storage error: database is locked" }))
            .await;

        for path in ["/progress/1/1", "/progress/1/1/viewed", "/progress/1"] {
            let resp = cli.get(path).send().await;
            resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
            let body = resp.json().await;
            body.value()
                .object()
                .get("message")
                .assert_string("storage error: database is locked");
        }
    }

    #[tokio::test]
    async fn openapi_spec_is_served() {
        let resp = client().get("/spec").send().await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let paths = body.value().object().get("paths").object();
        paths.get("/progress").object().get("post").object();
        paths.get("/progress/{uid}/{vid}/viewed").object().get("get").object();
    }
}
