use thiserror::Error;

use crate::logic::{ByCountResults, FilterSpec, PageWindow};
use crate::model::{File, Namespace, Organization, Sample, Subject};

/// Failures a store can surface. Everything else (missing fields, odd
/// metadata shapes, unknown filters) is absorbed by the filter/aggregation
/// layer, which is total over arbitrary documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing query engine is unreachable or failed mid-query.
    /// Surfaced as 503; never retried here.
    #[error("{0}")]
    Unavailable(String),
    /// The backing document store is missing or malformed.
    /// Surfaced as 500.
    #[error("{0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One window of a filtered collection plus the pre-window total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[async_trait::async_trait]
pub trait SubjectStore: Send + Sync {
    /// List subjects matching the filter spec, windowed.
    async fn list_subjects(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Subject>>;
    /// Get a subject by its (organization, namespace, name) identity.
    async fn get_subject(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Subject>>;
    /// Total number of subjects, unfiltered.
    async fn count_subjects(&self) -> StoreResult<usize>;
    /// Value-frequency table for a metadata field over matching subjects.
    async fn subjects_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults>;
}

#[async_trait::async_trait]
pub trait SampleStore: Send + Sync {
    async fn list_samples(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Sample>>;
    async fn get_sample(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Sample>>;
    async fn count_samples(&self) -> StoreResult<usize>;
    async fn samples_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults>;
}

#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    async fn list_files(&self, filters: &FilterSpec, window: PageWindow)
        -> StoreResult<Page<File>>;
    async fn get_file(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<File>>;
    async fn count_files(&self) -> StoreResult<usize>;
    async fn files_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults>;
}

#[async_trait::async_trait]
pub trait NamespaceStore: Send + Sync {
    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>>;
    /// Get a namespace by its (organization, name) identity.
    async fn get_namespace(
        &self,
        organization: &str,
        name: &str,
    ) -> StoreResult<Option<Namespace>>;
}

#[async_trait::async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>>;
    async fn get_organization(&self, identifier: &str) -> StoreResult<Option<Organization>>;
}

pub trait Store:
    SubjectStore + SampleStore + FileStore + NamespaceStore + OrganizationStore + Send + Sync
{
}
