//! Per-document repair engine: locate the canonical "Code - Label"
//! value quoted inside each `Description`, then make sure the owning
//! record carries a matching `PositionLevel` element.

mod document;
mod encoding;
mod extractor;
mod serializer;

use document::{Document, NodeId};
use std::collections::HashSet;
use tracing::debug;

/// Tag searched for as the description carrier.
const DESCRIPTION_TAG: &str = "Description";
/// Tag created or updated next to it.
const POSITION_LEVEL_TAG: &str = "PositionLevel";

/// Knobs for container resolution and element placement. Kept explicit
/// because the exports this engine repairs disagree on how deeply the
/// job wrapper sits above `Description`.
#[derive(Debug, Clone)]
pub struct RepairConfig {
    /// Local names treated as a job-like record container.
    pub container_tags: Vec<String>,
    /// How many ancestor hops to search for a container tag before
    /// settling on the direct parent of `Description`.
    pub max_container_hops: usize,
    /// Local names of siblings a created `PositionLevel` is placed
    /// after, most specific first. No hint present means append last.
    pub position_hints: Vec<String>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            container_tags: vec!["Job".to_string()],
            max_container_hops: 3,
            position_hints: vec!["Status".to_string(), "Title".to_string()],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("not well-formed XML: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("unexpected end of input: <{0}> is never closed")]
    UnclosedElement(String),
    #[error("document has no root element")]
    MissingRoot,
    #[error("failed to render repaired document: {0}")]
    Render(#[from] std::io::Error),
}

/// What the repairer did to one record. Reporting only, never stored in
/// the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    Added,
    Updated,
    Unchanged,
}

/// Result of repairing one document.
#[derive(Debug)]
pub struct RepairOutcome {
    /// Serialized document, encoded for the output encoding.
    pub output: Vec<u8>,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl RepairOutcome {
    /// Mutations actually made; unchanged records do not count.
    pub fn modifications(&self) -> usize {
        self.added + self.updated
    }
}

/// The extraction-and-repair engine. Stateless apart from its
/// configuration; one instance serves any number of documents.
#[derive(Debug, Clone)]
pub struct Repairer {
    config: RepairConfig,
}

impl Default for Repairer {
    fn default() -> Self {
        Self::new(RepairConfig::default())
    }
}

impl Repairer {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    /// Repairs one document. Decodes, parses, applies the per-record
    /// transition rules, then re-serializes. Idempotent: feeding the
    /// output back in yields the same bytes and zero modifications.
    pub fn repair(&self, input: &[u8]) -> Result<RepairOutcome, RepairError> {
        let decoded = encoding::decode(input);
        let mut document = Document::parse(&decoded.text)?;

        let mut added = 0;
        let mut updated = 0;
        let mut unchanged = 0;

        // A container holds one PositionLevel, so the first record that
        // resolves to it wins; letting later records through would make
        // them overwrite each other on every pass.
        let mut serviced: HashSet<NodeId> = HashSet::new();

        for description in document.elements_by_local_name(DESCRIPTION_TAG) {
            let text = document.subtree_text(description);
            let Some(candidate) = extractor::extract_candidate(&text) else {
                continue;
            };
            let Some(container) = self.resolve_container(&document, description) else {
                continue;
            };
            if !serviced.insert(container) {
                continue;
            }
            match self.apply(&mut document, description, container, &candidate) {
                Modification::Added => added += 1,
                Modification::Updated => updated += 1,
                Modification::Unchanged => unchanged += 1,
            }
        }

        debug!(added, updated, unchanged, "document repaired");

        let output = serializer::serialize(&document, &decoded.output_encoding())?;
        Ok(RepairOutcome {
            output,
            added,
            updated,
            unchanged,
        })
    }

    /// Applies the transition rules for one record.
    fn apply(
        &self,
        document: &mut Document,
        description: NodeId,
        container: NodeId,
        candidate: &str,
    ) -> Modification {
        let existing = document
            .child_elements(container)
            .into_iter()
            .find(|&child| document.local_name(child) == POSITION_LEVEL_TAG);

        match existing {
            Some(position_level) => {
                if document.subtree_text(position_level).trim() == candidate {
                    Modification::Unchanged
                } else {
                    document.set_element_text(position_level, candidate);
                    Modification::Updated
                }
            }
            None => {
                self.insert_position_level(document, description, container, candidate);
                Modification::Added
            }
        }
    }

    /// Nearest ancestor with a configured container tag, searched up to
    /// the hop bound; ancestors beyond it are never considered. Falls
    /// back to the direct parent of `Description`.
    fn resolve_container(&self, document: &Document, description: NodeId) -> Option<NodeId> {
        let direct_parent = document.parent_element(description);

        let mut current = direct_parent;
        let mut hops = 0;
        while let Some(ancestor) = current {
            hops += 1;
            if hops > self.config.max_container_hops {
                break;
            }
            let local = document.local_name(ancestor);
            if self
                .config
                .container_tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(local))
            {
                return Some(ancestor);
            }
            current = document.parent_element(ancestor);
        }

        direct_parent
    }

    fn insert_position_level(
        &self,
        document: &mut Document,
        description: NodeId,
        container: NodeId,
        candidate: &str,
    ) {
        // New element inherits the Description's namespace prefix.
        let name = match document.prefix(description) {
            Some(prefix) => format!("{prefix}:{POSITION_LEVEL_TAG}"),
            None => POSITION_LEVEL_TAG.to_string(),
        };
        let position_level = document.create_element(name);
        document.set_element_text(position_level, candidate);

        let anchor = self.config.position_hints.iter().find_map(|hint| {
            document
                .child_elements(container)
                .into_iter()
                .find(|&child| document.local_name(child) == hint.as_str())
        });

        match anchor {
            Some(anchor) => document.insert_child_after(container, anchor, position_level),
            None => document.append_child(container, position_level),
        }
    }
}
