use anyhow::Result;
use neo4rs::Query;
use serde::Serialize;
use std::collections::HashMap;

use crate::neo4j::Neo4jGraph;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    #[serde(flatten)]
    pub props: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub relationship: String,
    #[serde(flatten)]
    pub props: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    // Serialized by the response envelope as a sibling of the graph body.
    #[serde(skip)]
    pub node_types: HashMap<String, usize>,
}

impl GraphView {
    fn assemble(nodes: Vec<GraphNode>, links: Vec<GraphLink>) -> Self {
        let mut node_types: HashMap<String, usize> = HashMap::new();
        for node in &nodes {
            *node_types.entry(node.node_type.clone()).or_insert(0) += 1;
        }

        Self {
            nodes,
            links,
            node_types,
        }
    }
}

/// Display label for a node: the first name-like property, else the last six
/// characters of the element id.
fn node_label(props: &serde_json::Map<String, serde_json::Value>, id: &str) -> String {
    for key in ["name", "patient_id", "doctor_id", "test_name", "icd_code"] {
        if let Some(value) = props.get(key).and_then(|v| v.as_str()) {
            return value.to_string();
        }
    }
    let tail = id.char_indices().rev().nth(5).map_or(0, |(i, _)| i);
    id[tail..].to_string()
}

impl Neo4jGraph {
    /// Every node and relationship in the store, shaped for the force-graph
    /// renderer.
    pub async fn graph_overview(&self) -> Result<GraphView> {
        let nodes_query = Query::new(
            r#"
            MATCH (n)
            RETURN elementId(n) AS id, labels(n)[0] AS type, properties(n) AS props
            "#
            .to_string(),
        );

        let links_query = Query::new(
            r#"
            MATCH (a)-[r]->(b)
            RETURN elementId(a) AS source, elementId(b) AS target,
                   type(r) AS relationship, properties(r) AS props
            "#
            .to_string(),
        );

        let (nodes, links) =
            tokio::try_join!(self.collect_nodes(nodes_query), self.collect_links(links_query))?;

        Ok(GraphView::assemble(nodes, links))
    }

    /// Subgraph around one patient: the patient, their doctor, and every
    /// record node the patient points at.
    pub async fn patient_subgraph(&self, patient_id: &str) -> Result<GraphView> {
        let nodes_query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})
            OPTIONAL MATCH (d:Doctor)-[:TREATS]->(p)
            OPTIONAL MATCH (p)-[]->(related)
            WITH [p] + collect(DISTINCT d) + collect(DISTINCT related) AS allNodes
            UNWIND allNodes AS n
            WITH DISTINCT n
            WHERE n IS NOT NULL
            RETURN elementId(n) AS id, labels(n)[0] AS type, properties(n) AS props
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let links_query = Query::new(
            r#"
            MATCH (p:Patient {patient_id: $patient_id})
            OPTIONAL MATCH (d:Doctor)-[r1:TREATS]->(p)
            WITH p, collect({source: elementId(d), target: elementId(p), rel: type(r1), props: properties(r1)}) AS doctorEdges
            MATCH (p)-[r]->(related)
            WITH doctorEdges, collect({source: elementId(p), target: elementId(related), rel: type(r), props: properties(r)}) AS patientEdges
            WITH doctorEdges + patientEdges AS allEdges
            UNWIND allEdges AS edge
            WITH edge WHERE edge.source IS NOT NULL
            RETURN DISTINCT edge.source AS source, edge.target AS target,
                   edge.rel AS relationship, edge.props AS props
            "#
            .to_string(),
        )
        .param("patient_id", patient_id.to_string());

        let (nodes, links) =
            tokio::try_join!(self.collect_nodes(nodes_query), self.collect_links(links_query))?;

        Ok(GraphView::assemble(nodes, links))
    }

    /// Subgraph around one doctor: the doctor, their patients, and every
    /// record node those patients point at.
    pub async fn doctor_subgraph(&self, doctor_id: &str) -> Result<GraphView> {
        let nodes_query = Query::new(
            r#"
            MATCH (d:Doctor {doctor_id: $doctor_id})-[:TREATS]->(p:Patient)
            WITH collect(p) AS patients, d
            OPTIONAL MATCH (p:Patient)-[]->(related)
            WHERE p IN patients
            WITH patients, d, collect(DISTINCT related) AS relatedNodes
            WITH [d] + patients + relatedNodes AS allNodes
            UNWIND allNodes AS n
            WITH DISTINCT n
            WHERE n IS NOT NULL
            RETURN elementId(n) AS id, labels(n)[0] AS type, properties(n) AS props
            "#
            .to_string(),
        )
        .param("doctor_id", doctor_id.to_string());

        let links_query = Query::new(
            r#"
            MATCH (d:Doctor {doctor_id: $doctor_id})-[:TREATS]->(p:Patient)
            WITH collect(p) AS patients, d
            MATCH (d)-[r1:TREATS]->(p) WHERE p IN patients
            WITH patients, collect({source: elementId(d), target: elementId(p), rel: type(r1), props: properties(r1)}) AS doctorEdges
            UNWIND patients AS patient
            MATCH (patient)-[r]->(related)
            WITH doctorEdges, collect({source: elementId(patient), target: elementId(related), rel: type(r), props: properties(r)}) AS patientEdges
            WITH doctorEdges + patientEdges AS allEdges
            UNWIND allEdges AS edge
            RETURN DISTINCT edge.source AS source, edge.target AS target,
                   edge.rel AS relationship, edge.props AS props
            "#
            .to_string(),
        )
        .param("doctor_id", doctor_id.to_string());

        let (nodes, links) =
            tokio::try_join!(self.collect_nodes(nodes_query), self.collect_links(links_query))?;

        Ok(GraphView::assemble(nodes, links))
    }

    async fn collect_nodes(&self, query: Query) -> Result<Vec<GraphNode>> {
        let mut result = self.graph.execute(query).await?;

        let mut nodes = Vec::new();
        while let Some(row) = result.next().await? {
            let id: String = row.get("id")?;
            let node_type: String = row.get("type").unwrap_or_else(|_| "Unknown".to_string());
            let props_value: serde_json::Value = row.get("props").unwrap_or_default();
            let props = props_value.as_object().cloned().unwrap_or_default();
            let label = node_label(&props, &id);

            nodes.push(GraphNode {
                id,
                node_type,
                label,
                props,
            });
        }

        Ok(nodes)
    }

    async fn collect_links(&self, query: Query) -> Result<Vec<GraphLink>> {
        let mut result = self.graph.execute(query).await?;

        let mut links = Vec::new();
        while let Some(row) = result.next().await? {
            let props_value: serde_json::Value = row.get("props").unwrap_or_default();
            let props = props_value.as_object().cloned().unwrap_or_default();

            links.push(GraphLink {
                source: row.get("source")?,
                target: row.get("target")?,
                relationship: row.get("relationship")?,
                props,
            });
        }

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_name_like_props() {
        let mut props = serde_json::Map::new();
        props.insert("patient_id".to_string(), serde_json::json!("P001"));
        props.insert("age".to_string(), serde_json::json!(45));
        assert_eq!(node_label(&props, "4:abc:17"), "P001");

        props.insert("name".to_string(), serde_json::json!("John Doe"));
        assert_eq!(node_label(&props, "4:abc:17"), "John Doe");
    }

    #[test]
    fn test_label_falls_back_to_id_tail() {
        let props = serde_json::Map::new();
        assert_eq!(node_label(&props, "4:abcdef:12345"), ":12345");
        assert_eq!(node_label(&props, "x"), "x");
    }

    #[test]
    fn test_label_tail_splits_on_char_boundary() {
        let props = serde_json::Map::new();
        assert_eq!(node_label(&props, "4:αλφα:12"), "λφα:12");
        assert_eq!(node_label(&props, "αβ"), "αβ");
    }

    #[test]
    fn test_assemble_counts_node_types() {
        let nodes = vec![
            GraphNode {
                id: "1".to_string(),
                node_type: "Patient".to_string(),
                label: "P001".to_string(),
                props: serde_json::Map::new(),
            },
            GraphNode {
                id: "2".to_string(),
                node_type: "Patient".to_string(),
                label: "P002".to_string(),
                props: serde_json::Map::new(),
            },
            GraphNode {
                id: "3".to_string(),
                node_type: "Drug".to_string(),
                label: "Aspirin".to_string(),
                props: serde_json::Map::new(),
            },
        ];

        let view = GraphView::assemble(nodes, Vec::new());
        assert_eq!(view.node_types.get("Patient"), Some(&2));
        assert_eq!(view.node_types.get("Drug"), Some(&1));
        assert!(view.links.is_empty());
    }
}
