use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::logic::cypher::{
    compile_where, count_statement, entity_detail_statement, list_statement, missing_statement,
    namespace_detail_statement, organization_detail_statement, page_statement, values_statement,
    Params,
};
use crate::logic::{fold_rows, ByCountResults, FilterSpec, PageWindow};
use crate::model::{EntityRecord, File, Namespace, Organization, Sample, Subject};
use crate::store::traits::{
    FileStore, NamespaceStore, OrganizationStore, Page, SampleStore, Store, StoreError,
    StoreResult, SubjectStore,
};

/// One result row: column name to value.
pub type Row = BTreeMap<String, Value>;

/// Black-box executor for parameterized graph queries.
///
/// Implementations own connection management entirely; this layer hands over
/// a statement plus bound parameters and gets ordered rows back. Any
/// underlying failure (connectivity, query execution) is the single
/// [`StoreError::Unavailable`] condition; no retries, no backoff.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(&self, statement: &str, params: &Params) -> StoreResult<Vec<Row>>;
}

/// Executor speaking the Neo4j/Memgraph-compatible HTTP transaction
/// endpoint (`POST .../tx/commit`).
#[derive(Debug, Clone)]
pub struct HttpGraphExecutor {
    client: reqwest::Client,
    endpoint: String,
    auth: Option<(String, String)>,
}

impl HttpGraphExecutor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            auth: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Default, Deserialize)]
struct TxResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn unavailable(detail: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("graph store unavailable: {}", detail))
}

#[async_trait::async_trait]
impl QueryExecutor for HttpGraphExecutor {
    async fn run(&self, statement: &str, params: &Params) -> StoreResult<Vec<Row>> {
        let body = json!({
            "statements": [{"statement": statement, "parameters": params}]
        });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some((username, password)) = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }
        let payload: TxResponse = response.json().await.map_err(unavailable)?;
        if let Some(error) = payload.errors.first() {
            return Err(unavailable(format!("{}: {}", error.code, error.message)));
        }

        let result = payload.results.into_iter().next().unwrap_or_default();
        Ok(payload_rows(result))
    }
}

fn payload_rows(result: TxResult) -> Vec<Row> {
    result
        .data
        .into_iter()
        .map(|data| result.columns.iter().cloned().zip(data.row).collect())
        .collect()
}

/// Graph-backed entity store. Every operation compiles the shared
/// [`FilterSpec`] to a parameterized WHERE clause and delegates execution to
/// the injected [`QueryExecutor`].
pub struct GraphStore {
    executor: Arc<dyn QueryExecutor>,
}

impl GraphStore {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    async fn list_nodes<T>(&self, filters: &FilterSpec, window: PageWindow) -> StoreResult<Page<T>>
    where
        T: EntityRecord + DeserializeOwned,
    {
        let compiled = compile_where(filters);

        let rows = self
            .executor
            .run(&count_statement(T::LABEL, &compiled.clause), &compiled.params)
            .await?;
        let total = first_u64(&rows, "total") as usize;

        let mut params = compiled.params;
        params.insert("skip".to_string(), json!(window.skip()));
        params.insert("limit".to_string(), json!(window.limit()));
        let rows = self
            .executor
            .run(&page_statement(T::LABEL, &compiled.clause), &params)
            .await?;

        Ok(Page {
            items: parse_nodes(rows),
            total,
        })
    }

    async fn find_node<T: DeserializeOwned>(
        &self,
        statement: &str,
        params: Params,
    ) -> StoreResult<Option<T>> {
        let rows = self.executor.run(statement, &params).await?;
        Ok(parse_nodes(rows).into_iter().next())
    }

    async fn count_nodes(&self, label: &str) -> StoreResult<usize> {
        let rows = self
            .executor
            .run(&count_statement(label, ""), &Params::new())
            .await?;
        Ok(first_u64(&rows, "total") as usize)
    }

    async fn nodes_by_count<T>(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults>
    where
        T: EntityRecord,
    {
        let compiled = compile_where(filters);
        let mut params = compiled.params;
        params.insert("field".to_string(), Value::String(field.to_string()));

        let value_rows = self
            .executor
            .run(&values_statement(T::LABEL, &compiled.clause), &params)
            .await?;
        let missing_rows = self
            .executor
            .run(&missing_statement(T::LABEL, &compiled.clause), &params)
            .await?;

        let pairs = value_rows.into_iter().filter_map(|mut row| {
            let value = row.remove("value")?;
            let count = row.get("count").and_then(Value::as_u64)?;
            Some((value, count))
        });
        Ok(fold_rows(pairs, first_u64(&missing_rows, "missing")))
    }
}

fn first_u64(rows: &[Row], column: &str) -> u64 {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Deserialize the `node` column of each row. Rows that do not parse as the
/// expected document shape are skipped rather than failing the request.
fn parse_nodes<T: DeserializeOwned>(rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|mut row| {
            let node = row.remove("node")?;
            match serde_json::from_value(node) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    log::warn!("skipping malformed node row: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn identity_params(organization: &str, namespace: &str, name: &str) -> Params {
    Params::from([
        ("org".to_string(), Value::String(organization.to_string())),
        ("ns".to_string(), Value::String(namespace.to_string())),
        ("name".to_string(), Value::String(name.to_string())),
    ])
}

#[async_trait::async_trait]
impl SubjectStore for GraphStore {
    async fn list_subjects(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Subject>> {
        self.list_nodes(filters, window).await
    }

    async fn get_subject(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Subject>> {
        self.find_node(
            &entity_detail_statement(Subject::LABEL),
            identity_params(organization, namespace, name),
        )
        .await
    }

    async fn count_subjects(&self) -> StoreResult<usize> {
        self.count_nodes(Subject::LABEL).await
    }

    async fn subjects_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.nodes_by_count::<Subject>(field, filters).await
    }
}

#[async_trait::async_trait]
impl SampleStore for GraphStore {
    async fn list_samples(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<Sample>> {
        self.list_nodes(filters, window).await
    }

    async fn get_sample(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<Sample>> {
        self.find_node(
            &entity_detail_statement(Sample::LABEL),
            identity_params(organization, namespace, name),
        )
        .await
    }

    async fn count_samples(&self) -> StoreResult<usize> {
        self.count_nodes(Sample::LABEL).await
    }

    async fn samples_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.nodes_by_count::<Sample>(field, filters).await
    }
}

#[async_trait::async_trait]
impl FileStore for GraphStore {
    async fn list_files(
        &self,
        filters: &FilterSpec,
        window: PageWindow,
    ) -> StoreResult<Page<File>> {
        self.list_nodes(filters, window).await
    }

    async fn get_file(
        &self,
        organization: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<File>> {
        self.find_node(
            &entity_detail_statement(File::LABEL),
            identity_params(organization, namespace, name),
        )
        .await
    }

    async fn count_files(&self) -> StoreResult<usize> {
        self.count_nodes(File::LABEL).await
    }

    async fn files_by_count(
        &self,
        field: &str,
        filters: &FilterSpec,
    ) -> StoreResult<ByCountResults> {
        self.nodes_by_count::<File>(field, filters).await
    }
}

#[async_trait::async_trait]
impl NamespaceStore for GraphStore {
    async fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        let rows = self
            .executor
            .run(&list_statement("Namespace"), &Params::new())
            .await?;
        Ok(parse_nodes(rows))
    }

    async fn get_namespace(
        &self,
        organization: &str,
        name: &str,
    ) -> StoreResult<Option<Namespace>> {
        let params = Params::from([
            ("org".to_string(), Value::String(organization.to_string())),
            ("name".to_string(), Value::String(name.to_string())),
        ]);
        self.find_node(&namespace_detail_statement(), params).await
    }
}

#[async_trait::async_trait]
impl OrganizationStore for GraphStore {
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let rows = self
            .executor
            .run(&list_statement("Organization"), &Params::new())
            .await?;
        Ok(parse_nodes(rows))
    }

    async fn get_organization(&self, identifier: &str) -> StoreResult<Option<Organization>> {
        let params = Params::from([("name".to_string(), Value::String(identifier.to_string()))]);
        self.find_node(&organization_detail_statement(), params)
            .await
    }
}

impl Store for GraphStore {}
