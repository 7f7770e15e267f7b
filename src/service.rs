//! Ad Service Module
//!
//! Input validation and domain error translation in front of the repository.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::field::Empty;
use tracing::instrument;

use crate::metrics::{Classify, Layer, Metrics, Outcome};
use crate::models::{Ad, AdDraft, AdPage};
use crate::pagination::PageInfo;
use crate::repository::AdRepository;
use crate::store::{ListParams, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid ad id: {0}")]
    InvalidId(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("ad {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Repository(StoreError),
}

impl Classify for ServiceError {
    fn outcome(&self) -> Outcome {
        match self {
            ServiceError::NotFound(_) => Outcome::NotFound,
            ServiceError::InvalidId(_) | ServiceError::InvalidInput(_) => Outcome::Error,
            ServiceError::Repository(err) => err.outcome(),
        }
    }
}

/// Maps a repository error for the ad `id`, keeping not-found distinct.
fn for_ad(id: i64) -> impl FnOnce(StoreError) -> ServiceError {
    move |err| match err {
        StoreError::NotFound => ServiceError::NotFound(id),
        other => ServiceError::Repository(other),
    }
}

fn check_id(id: i64) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(ServiceError::InvalidId(id));
    }
    Ok(())
}

fn check_draft(draft: &AdDraft) -> Result<(), ServiceError> {
    match draft.validate() {
        Some(reason) => Err(ServiceError::InvalidInput(reason)),
        None => Ok(()),
    }
}

// == Ad Service ==
#[async_trait]
pub trait AdService: Send + Sync {
    async fn list_ads(&self, params: ListParams) -> Result<AdPage, ServiceError>;

    async fn get_ad(&self, id: i64) -> Result<Ad, ServiceError>;

    async fn create_ad(&self, draft: AdDraft) -> Result<Ad, ServiceError>;

    async fn update_ad(&self, id: i64, draft: AdDraft) -> Result<Ad, ServiceError>;

    async fn delete_ad(&self, id: i64) -> Result<(), ServiceError>;
}

pub struct AdServiceImpl {
    repository: Arc<dyn AdRepository>,
    metrics: Metrics,
}

impl AdServiceImpl {
    pub fn new(repository: Arc<dyn AdRepository>, metrics: Metrics) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    async fn page(&self, params: ListParams) -> Result<AdPage, ServiceError> {
        if params.limit == 0 {
            return Err(ServiceError::InvalidInput(
                "limit must be greater than zero".to_string(),
            ));
        }

        let ads = self
            .repository
            .get_all_ads(&params)
            .await
            .map_err(ServiceError::Repository)?;
        let total = self
            .repository
            .count_ads()
            .await
            .map_err(ServiceError::Repository)?;

        let info = PageInfo::compute(total, params.limit, params.offset).ok_or_else(|| {
            ServiceError::InvalidInput("limit must be greater than zero".to_string())
        })?;
        Ok(AdPage::new(ads, info))
    }
}

#[async_trait]
impl AdService for AdServiceImpl {
    #[instrument(
        name = "service.list_ads",
        skip(self, params),
        fields(
            limit = params.limit,
            offset = params.offset,
            outcome = Empty,
            error = Empty
        )
    )]
    async fn list_ads(&self, params: ListParams) -> Result<AdPage, ServiceError> {
        let timer = self.metrics.start(Layer::Service, "list_ads");
        let result = self.page(params).await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "service.get_ad",
        skip(self),
        fields(outcome = Empty, error = Empty)
    )]
    async fn get_ad(&self, id: i64) -> Result<Ad, ServiceError> {
        check_id(id)?;

        let timer = self.metrics.start(Layer::Service, "get_ad");
        let result = self.repository.get_ad_by_id(id).await.map_err(for_ad(id));
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "service.create_ad",
        skip(self, draft),
        fields(outcome = Empty, error = Empty)
    )]
    async fn create_ad(&self, draft: AdDraft) -> Result<Ad, ServiceError> {
        check_draft(&draft)?;

        let timer = self.metrics.start(Layer::Service, "create_ad");
        let result = self
            .repository
            .create_ad(&draft)
            .await
            .map_err(ServiceError::Repository);
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "service.update_ad",
        skip(self, draft),
        fields(outcome = Empty, error = Empty)
    )]
    async fn update_ad(&self, id: i64, draft: AdDraft) -> Result<Ad, ServiceError> {
        check_id(id)?;
        check_draft(&draft)?;

        let timer = self.metrics.start(Layer::Service, "update_ad");
        let result = self
            .repository
            .update_ad(id, &draft)
            .await
            .map_err(for_ad(id));
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "service.delete_ad",
        skip(self),
        fields(outcome = Empty, error = Empty)
    )]
    async fn delete_ad(&self, id: i64) -> Result<(), ServiceError> {
        check_id(id)?;

        let timer = self.metrics.start(Layer::Service, "delete_ad");
        let result = self.repository.delete_ad(id).await.map_err(for_ad(id));
        timer.finish(&result);
        result
    }
}
