use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::logic::{apply_filters, count_values, paginate, ByCountResults, FilterSpec, PageWindow};
use crate::model::{EntityRecord, File, Namespace, Organization, Sample, Subject};
use crate::store::traits::{
    FileStore, NamespaceStore, OrganizationStore, Page, SampleStore, Store, StoreError,
    StoreResult, SubjectStore,
};

/// Flat-file document store: one JSON array per entity kind inside a data
/// directory. Collections are re-read whole on every request; there is no
/// caching and no mutation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn load<T: DeserializeOwned>(&self, file_name: &str) -> StoreResult<Vec<T>> {
        let path = self.data_dir.join(file_name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Config(format!("invalid JSON in {}: {}", path.display(), e)))
    }

    async fn list_entities<T>(
        &self,
        file_name: &str,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<T>>
    where
        T: EntityRecord + DeserializeOwned,
    {
        let filtered = apply_filters(self.load(file_name).await?, filters);
        let (items, total) = paginate(filtered, window);
        Ok(Page { items, total })
    }

    async fn find_entity<T>(
        &self,
        file_name: &str,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<T>>
    where
        T: EntityRecord + DeserializeOwned,
    {
        let items: Vec<T> = self.load(file_name).await?;
        Ok(items
            .into_iter()
            .find(|item| item.identity().is(organization, namespace, name)))
    }

    async fn count_entities<T>(&self, file_name: &str) -> StoreResult<usize>
    where
        T: EntityRecord + DeserializeOwned,
    {
        let items: Vec<T> = self.load(file_name).await?;
        Ok(items.len())
    }

    async fn entities_by_count<T>(
        &self,
        file_name: &str,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults>
    where
        T: EntityRecord + DeserializeOwned,
    {
        let filtered = apply_filters(self.load::<T>(file_name).await?, filters);
        Ok(count_values(filtered.iter().map(EntityRecord::metadata), field))
    }
}

/// Read a single JSON document (the API root payload) from a data
/// directory. Missing or unparsable files are configuration errors.
pub async fn load_root_document(data_dir: &Path) -> StoreResult<serde_json::Value> {
    let path = data_dir.join("api-root.json");
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| StoreError::Config(format!("Missing file: {}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| StoreError::Config(format!("Invalid JSON in {}", path.display())))
}

#[async_trait::async_trait]
impl SubjectStore for JsonFileStore {
    async fn list_subjects(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Subject>> {
        self.list_entities("subjects.json", filters, window).await
    }

    async fn get_subject(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Subject>> {
        self.find_entity("subjects.json", organization, namespace, name)
            .await
    }

    async fn count_subjects(&self) -> StoreResult<usize> {
        self.count_entities::<Subject>("subjects.json").await
    }

    async fn subjects_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.entities_by_count::<Subject>("subjects.json", field, filters)
            .await
    }
}

#[async_trait::async_trait]
impl SampleStore for JsonFileStore {
    async fn list_samples(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Sample>> {
        self.list_entities("samples.json", filters, window).await
    }

    async fn get_sample(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Sample>> {
        self.find_entity("samples.json", organization, namespace, name)
            .await
    }

    async fn count_samples(&self) -> StoreResult<usize> {
        self.count_entities::<Sample>("samples.json").await
    }

    async fn samples_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.entities_by_count::<Sample>("samples.json", field, filters)
            .await
    }
}

#[async_trait::async_trait]
impl FileStore for JsonFileStore {
    async fn list_files(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<File>> {
        self.list_entities("files.json", filters, window).await
    }

    async fn get_file(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<File>> {
        self.find_entity("files.json", organization, namespace, name)
            .await
    }

    async fn count_files(&self) -> StoreResult<usize> {
        self.count_entities::<File>("files.json").await
    }

    async fn files_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.entities_by_count::<File>("files.json", field, filters)
            .await
    }
}

#[async_trait::async_trait]
impl NamespaceStore for JsonFileStore {
    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        self.load("namespaces.json").await
    }

    async fn get_namespace(
        &self,
        organization: &str,
        name: &str,
    ) -> StoreResult<Option<Namespace>> {
        let namespaces: Vec<Namespace> = self.load("namespaces.json").await?;
        Ok(namespaces.into_iter().find(|ns| {
            ns.id.organization.as_deref() == Some(organization)
                && ns.id.name.as_deref() == Some(name)
        }))
    }
}

#[async_trait::async_trait]
impl OrganizationStore for JsonFileStore {
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        self.load("organizations.json").await
    }

    async fn get_organization(&self, identifier: &str) -> StoreResult<Option<Organization>> {
        let organizations: Vec<Organization> = self.load("organizations.json").await?;
        Ok(organizations
            .into_iter()
            .find(|org| org.identifier == identifier))
    }
}

impl Store for JsonFileStore {}
