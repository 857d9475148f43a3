use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Metadata;

/// Identity of a namespace: owning organization plus namespace name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Compound identity of a subject, sample or file:
/// (organization, namespace, name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityId {
    /// True when this identity is exactly the given
    /// (organization, namespace, name) tuple.
    pub fn is(&self, organization: &str, namespace: &str, name: &str) -> bool {
        let ns = match &self.namespace {
            Some(ns) => ns,
            None => return false,
        };
        ns.organization.as_deref() == Some(organization)
            && ns.name.as_deref() == Some(namespace)
            && self.name.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub gateways: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: EntityId,
    /// Identity of the subject this sample was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityId>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub gateways: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: EntityId,
    /// Identities of the samples this file derives from.
    #[serde(default)]
    pub samples: Vec<EntityId>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub gateways: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Behavior shared by the filterable, aggregatable entity kinds.
/// `LABEL` is the node label the graph store matches on.
pub trait EntityRecord: Send + Sync {
    const LABEL: &'static str;

    fn identity(&self) -> &EntityId;
    fn metadata(&self) -> &Metadata;
}

impl EntityRecord for Subject {
    const LABEL: &'static str = "Subject";

    fn identity(&self) -> &EntityId {
        &self.id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl EntityRecord for Sample {
    const LABEL: &'static str = "Sample";

    fn identity(&self) -> &EntityId {
        &self.id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl EntityRecord for File {
    const LABEL: &'static str = "File";

    fn identity(&self) -> &EntityId {
        &self.id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject_deserializes_with_defaults() {
        let subject: Subject = serde_json::from_value(json!({
            "id": {"namespace": {"organization": "org1", "name": "ns1"}, "name": "SUBJ-1"}
        }))
        .unwrap();

        assert!(subject.kind.is_none());
        assert!(subject.metadata.is_empty());
        assert!(subject.gateways.is_empty());
        assert!(subject.id.is("org1", "ns1", "SUBJ-1"));
        assert!(!subject.id.is("org1", "ns1", "SUBJ-2"));
    }

    #[test]
    fn test_entity_id_without_namespace_never_matches() {
        let id = EntityId {
            namespace: None,
            name: Some("SUBJ-1".to_string()),
        };
        assert!(!id.is("org1", "ns1", "SUBJ-1"));
    }

    #[test]
    fn test_optional_identity_fields_are_omitted_when_absent() {
        let id = EntityId {
            namespace: None,
            name: None,
        };
        let encoded = serde_json::to_string(&id).unwrap();
        assert_eq!(encoded, "{}");
    }
}
