use chrono::{DateTime, Utc};
use poem_openapi::{ApiResponse, Object, payload::Json};

use crate::domain::{
    mapping::percent_from_json,
    models::{ProgressRecord, ProgressReport, UserProgress},
};
use crate::progress_api::services::progress::ProgressError;

/// Progress report sent by a player
#[derive(Debug, Clone, Object)]
pub struct ProgressReportDto {
    pub uid: i64,
    pub vid: i64,
    /// Watch percent as a string ("42") or a number (42)
    pub percent: serde_json::Value,
}

impl ProgressReportDto {
    pub fn into_report(self) -> Result<ProgressReport, ProgressError> {
        let percent = percent_from_json(&self.percent).ok_or(ProgressError::InvalidPercent)?;
        Ok(ProgressReport {
            uid: self.uid,
            vid: self.vid,
            percent,
        })
    }
}

#[derive(Debug, Clone, Object)]
pub struct ProgressRecordDto {
    pub id: i32,
    pub uid: i64,
    pub vid: i64,
    pub percent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProgressRecord> for ProgressRecordDto {
    fn from(r: ProgressRecord) -> Self {
        ProgressRecordDto {
            id: r.id,
            uid: r.uid,
            vid: r.vid,
            percent: r.percent,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct PercentDto {
    pub percent: String,
}

#[derive(Debug, Clone, Object)]
pub struct ViewedDto {
    /// True once any progress was reported, whatever the percent
    pub viewed: bool,
}

#[derive(Debug, Clone, Object)]
pub struct UserProgressDto {
    pub videos: Vec<ProgressRecordDto>,
    pub count: u64,
}

impl From<UserProgress> for UserProgressDto {
    fn from(p: UserProgress) -> Self {
        let count = p.count() as u64;
        UserProgressDto {
            videos: p.videos.into_iter().map(Into::into).collect(),
            count,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct NoItemsDto {
    pub error: String,
}

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
}

impl ErrorDto {
    pub fn json(message: impl Into<String>) -> Json<ErrorDto> {
        Json(ErrorDto {
            message: message.into(),
        })
    }
}

#[derive(ApiResponse)]
pub enum ReportProgressResponse {
    /// Record after the upsert
    #[oai(status = 200)]
    Ok(Json<ProgressRecordDto>),

    /// Percent is neither a string nor a number
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum GetProgressResponse {
    #[oai(status = 200)]
    Ok(Json<PercentDto>),

    /// Nothing reported yet for this user and video
    #[oai(status = 404)]
    NotFound,

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ViewedResponse {
    #[oai(status = 200)]
    Ok(Json<ViewedDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum UserProgressResponse {
    /// Records of the user, most recently updated first
    #[oai(status = 200)]
    Ok(Json<UserProgressDto>),

    /// The user has no records
    #[oai(status = 204)]
    NoItems(Json<NoItemsDto>),

    #[oai(status = 500)]
    InternalError(Json<ErrorDto>),
}
