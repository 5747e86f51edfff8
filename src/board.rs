//! Query board — a Kanban board backed by saved queries.
//!
//! DESIGN
//! ======
//! A board is an ordered list of saved queries. Each query carries a filter
//! list and the ordered ids of the items it shows. In a version action board
//! every query is bound to one version through a `version_id` filter, and an
//! item's place on the board follows its `version_id` field.
//!
//! Moving a card is all-or-nothing: every precondition is checked before the
//! item's version, the source query and the target query are touched.
//!
//! Filters round-trip through a percent-encoded JSON URL parameter:
//! `[{"version_id":{"operator":"=","values":["7"]}}]`. The board's own
//! filters (the quick filter, saved as `search ** text`) use the same codec,
//! so a saved board can be restored from its `query_props` parameter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub type ItemId = u64;
pub type ProjectId = u64;
pub type QueryId = u64;
pub type VersionId = u64;

pub const VERSION_BOARD_NAME: &str = "Action board (version)";
pub const VERSION_FILTER: &str = "version_id";
pub const SEARCH_FILTER: &str = "search";
pub const SEARCH_OPERATOR: &str = "**";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("query not found: {0}")]
    UnknownQuery(QueryId),
    #[error("item not found: {0}")]
    UnknownItem(ItemId),
    #[error("version not found: {0}")]
    UnknownVersion(VersionId),
    #[error("item {item} is not in query {query}")]
    NotInQuery { item: ItemId, query: QueryId },
    #[error("version `{0}` is not visible from this project")]
    VersionNotVisible(String),
    #[error("version `{0}` is closed")]
    VersionClosed(String),
    #[error("version `{0}` is locked")]
    VersionLocked(String),
    #[error("a list for version `{0}` already exists")]
    DuplicateList(String),
    #[error("query {0} has no version filter")]
    NotVersionBound(QueryId),
    #[error("card subject must not be blank")]
    BlankSubject,
    #[error("invalid filter parameter: {0}")]
    InvalidFilters(String),
}

impl crate::error::ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownQuery(_) => "E_BOARD_UNKNOWN_QUERY",
            Self::UnknownItem(_) => "E_BOARD_UNKNOWN_ITEM",
            Self::UnknownVersion(_) => "E_BOARD_UNKNOWN_VERSION",
            Self::NotInQuery { .. } => "E_BOARD_NOT_IN_QUERY",
            Self::VersionNotVisible(_) => "E_BOARD_VERSION_NOT_VISIBLE",
            Self::VersionClosed(_) => "E_BOARD_VERSION_CLOSED",
            Self::VersionLocked(_) => "E_BOARD_VERSION_LOCKED",
            Self::DuplicateList(_) => "E_BOARD_DUPLICATE_LIST",
            Self::NotVersionBound(_) => "E_BOARD_NOT_VERSION_BOUND",
            Self::BlankSubject => "E_BOARD_BLANK_SUBJECT",
            Self::InvalidFilters(_) => "E_BOARD_INVALID_FILTERS",
        }
    }
}

// =============================================================================
// MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Open,
    Locked,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSharing {
    None,
    Descendants,
    Hierarchy,
    Tree,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: VersionStatus,
    pub sharing: VersionSharing,
}

impl Version {
    /// Own versions and system-wide shared versions are visible. Hierarchy
    /// sharing needs the project tree, which this board does not model.
    #[must_use]
    pub fn visible_from(&self, project_id: ProjectId) -> bool {
        self.project_id == project_id || self.sharing == VersionSharing::System
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub subject: String,
    pub version_id: Option<VersionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub name: String,
    pub operator: String,
    pub values: Vec<String>,
}

impl QueryFilter {
    #[must_use]
    pub fn version(version_id: VersionId) -> Self {
        Self { name: VERSION_FILTER.into(), operator: "=".into(), values: vec![version_id.to_string()] }
    }

    #[must_use]
    pub fn search(text: &str) -> Self {
        Self { name: SEARCH_FILTER.into(), operator: SEARCH_OPERATOR.into(), values: vec![text.to_string()] }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardQuery {
    pub id: QueryId,
    pub name: String,
    pub filters: Vec<QueryFilter>,
    pub ordered_items: Vec<ItemId>,
}

impl BoardQuery {
    /// The version this query is bound to, from its first `version_id` filter.
    #[must_use]
    pub fn version_id(&self) -> Option<VersionId> {
        self.filters
            .iter()
            .find(|f| f.name == VERSION_FILTER)
            .and_then(|f| f.values.first())
            .and_then(|v| v.parse().ok())
    }

    /// Filters as a URL query parameter value.
    #[must_use]
    pub fn filter_param(&self) -> String {
        encode_filters(&self.filters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    pub queries: Vec<BoardQuery>,
    /// Board-wide filters applied on top of every list.
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
}

impl Board {
    /// Text of the saved `search` filter, if any.
    #[must_use]
    pub fn quick_filter(&self) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.name == SEARCH_FILTER && f.operator == SEARCH_OPERATOR)
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }

    /// Board filters as a `query_props` URL parameter value.
    #[must_use]
    pub fn filter_param(&self) -> String {
        encode_filters(&self.filters)
    }

    #[must_use]
    pub fn query(&self, id: QueryId) -> Option<&BoardQuery> {
        self.queries.iter().find(|q| q.id == id)
    }

    #[must_use]
    pub fn query_by_name(&self, name: &str) -> Option<&BoardQuery> {
        self.queries.iter().find(|q| q.name == name)
    }

    fn position(&self, id: QueryId) -> Result<usize, BoardError> {
        self.queries
            .iter()
            .position(|q| q.id == id)
            .ok_or(BoardError::UnknownQuery(id))
    }
}

// =============================================================================
// VERSION ACTION BOARD
// =============================================================================

/// A board with one list per version of a project.
#[derive(Debug, Clone)]
pub struct VersionActionBoard {
    project_id: ProjectId,
    board: Board,
    versions: Vec<Version>,
    items: BTreeMap<ItemId, WorkItem>,
    next_query_id: QueryId,
    next_item_id: ItemId,
}

impl VersionActionBoard {
    /// Build the board with a list for every open version of `project_id`,
    /// in the order the versions are given.
    #[must_use]
    pub fn create(project_id: ProjectId, versions: Vec<Version>, items: Vec<WorkItem>) -> Self {
        let next_item_id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let mut board = Self {
            project_id,
            board: Board { name: VERSION_BOARD_NAME.into(), queries: Vec::new(), filters: Vec::new() },
            versions,
            items: items.into_iter().map(|i| (i.id, i)).collect(),
            next_query_id: 1,
            next_item_id,
        };

        let initial: Vec<Version> = board
            .versions
            .iter()
            .filter(|v| v.project_id == project_id && v.status == VersionStatus::Open)
            .cloned()
            .collect();
        for version in &initial {
            board.push_list(version);
        }
        info!(project_id, lists = board.board.queries.len(), "version board created");
        board
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.get(&id)
    }

    /// Versions that could be added as a new list.
    #[must_use]
    pub fn available_list_options(&self) -> Vec<&Version> {
        self.versions
            .iter()
            .filter(|v| v.visible_from(self.project_id) && v.status != VersionStatus::Closed)
            .filter(|v| !self.has_list_for(v.id))
            .collect()
    }

    /// Append a list for `version_id`.
    ///
    /// # Errors
    ///
    /// Rejects unknown, invisible, closed, or already listed versions.
    pub fn add_list(&mut self, version_id: VersionId) -> Result<QueryId, BoardError> {
        let version = self
            .versions
            .iter()
            .find(|v| v.id == version_id)
            .cloned()
            .ok_or(BoardError::UnknownVersion(version_id))?;
        if !version.visible_from(self.project_id) {
            return Err(BoardError::VersionNotVisible(version.name));
        }
        if version.status == VersionStatus::Closed {
            return Err(BoardError::VersionClosed(version.name));
        }
        if self.has_list_for(version_id) {
            return Err(BoardError::DuplicateList(version.name));
        }
        Ok(self.push_list(&version))
    }

    /// Drop the list `query_id` from the board. Items keep their version, so
    /// the list comes back intact if the version is added again.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownQuery`] for an unknown list.
    pub fn remove_list(&mut self, query_id: QueryId) -> Result<(), BoardError> {
        let idx = self.board.position(query_id)?;
        let removed = self.board.queries.remove(idx);
        info!(query_id, name = %removed.name, cards = removed.ordered_items.len(), "list removed");
        Ok(())
    }

    /// Create a card at the end of `query_id`, assigned to that list's version.
    ///
    /// # Errors
    ///
    /// Rejects blank subjects, unknown queries, and locked or closed versions.
    pub fn add_card(&mut self, query_id: QueryId, subject: &str) -> Result<ItemId, BoardError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(BoardError::BlankSubject);
        }
        let idx = self.board.position(query_id)?;
        let version_id = self.assignable_version(&self.board.queries[idx])?;

        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.insert(
            id,
            WorkItem { id, project_id: self.project_id, subject: subject.to_string(), version_id: Some(version_id) },
        );
        self.board.queries[idx].ordered_items.push(id);
        debug!(item_id = id, query_id, "card added");
        Ok(id)
    }

    /// Move `item_id` from one list to another at `position` (clamped).
    ///
    /// # Errors
    ///
    /// Nothing changes when either query is unknown, the item is not in
    /// `from`, or the target version cannot take new items.
    pub fn move_card(&mut self, item_id: ItemId, from: QueryId, to: QueryId, position: usize) -> Result<(), BoardError> {
        let from_idx = self.board.position(from)?;
        let to_idx = self.board.position(to)?;
        if !self.items.contains_key(&item_id) {
            return Err(BoardError::UnknownItem(item_id));
        }
        let Some(source_pos) = self.board.queries[from_idx]
            .ordered_items
            .iter()
            .position(|id| *id == item_id)
        else {
            return Err(BoardError::NotInQuery { item: item_id, query: from });
        };
        let target_version = self.assignable_version(&self.board.queries[to_idx])?;

        self.board.queries[from_idx]
            .ordered_items
            .remove(source_pos);
        let target = &mut self.board.queries[to_idx].ordered_items;
        let at = position.min(target.len());
        target.insert(at, item_id);
        if let Some(item) = self.items.get_mut(&item_id) {
            item.version_id = Some(target_version);
        }
        info!(item_id, from, to, version_id = target_version, "card moved");
        Ok(())
    }

    /// Save a `search` filter on the board that hides cards whose subject
    /// does not contain `text` (case-insensitive). `None` or blank clears it.
    pub fn set_quick_filter(&mut self, text: Option<&str>) {
        self.board.filters.retain(|f| f.name != SEARCH_FILTER);
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            self.board.filters.push(QueryFilter::search(text));
        }
    }

    /// The saved board filters as a URL parameter value.
    #[must_use]
    pub fn quick_filter_param(&self) -> String {
        self.board.filter_param()
    }

    /// Restore the board filters from a URL parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidFilters`] and keeps the current filters
    /// when `param` does not decode.
    pub fn apply_filter_param(&mut self, param: &str) -> Result<(), BoardError> {
        self.board.filters = decode_filters(param)?;
        debug!(filters = self.board.filters.len(), "board filters restored");
        Ok(())
    }

    /// Cards shown in a list, in stored order, after the quick filter.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownQuery`] for an unknown list.
    pub fn visible_cards(&self, query_id: QueryId) -> Result<Vec<&WorkItem>, BoardError> {
        let query = self
            .board
            .query(query_id)
            .ok_or(BoardError::UnknownQuery(query_id))?;
        let needle = self.board.quick_filter().map(str::to_lowercase);
        Ok(query
            .ordered_items
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| {
                needle
                    .as_deref()
                    .is_none_or(|needle| item.subject.to_lowercase().contains(needle))
            })
            .collect())
    }

    fn has_list_for(&self, version_id: VersionId) -> bool {
        self.board
            .queries
            .iter()
            .any(|q| q.version_id() == Some(version_id))
    }

    fn push_list(&mut self, version: &Version) -> QueryId {
        let id = self.next_query_id;
        self.next_query_id += 1;
        let ordered_items = self
            .items
            .values()
            .filter(|i| i.project_id == self.project_id && i.version_id == Some(version.id))
            .map(|i| i.id)
            .collect();
        self.board.queries.push(BoardQuery {
            id,
            name: version.name.clone(),
            filters: vec![QueryFilter::version(version.id)],
            ordered_items,
        });
        id
    }

    fn assignable_version(&self, query: &BoardQuery) -> Result<VersionId, BoardError> {
        let version_id = query
            .version_id()
            .ok_or(BoardError::NotVersionBound(query.id))?;
        let version = self
            .versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or(BoardError::UnknownVersion(version_id))?;
        match version.status {
            VersionStatus::Open => Ok(version_id),
            VersionStatus::Locked => Err(BoardError::VersionLocked(version.name.clone())),
            VersionStatus::Closed => Err(BoardError::VersionClosed(version.name.clone())),
        }
    }
}

// =============================================================================
// FILTER PARAMETER CODEC
// =============================================================================

#[derive(Serialize, Deserialize)]
struct FilterBody {
    operator: String,
    values: Vec<String>,
}

/// Percent-encode filters as `[{"name":{"operator":..,"values":[..]}}]`.
#[must_use]
pub fn encode_filters(filters: &[QueryFilter]) -> String {
    let entries: Vec<Value> = filters
        .iter()
        .map(|f| {
            let mut entry = Map::new();
            entry.insert(f.name.clone(), serde_json::json!({ "operator": f.operator, "values": f.values }));
            Value::Object(entry)
        })
        .collect();
    urlencoding::encode(&Value::Array(entries).to_string()).into_owned()
}

/// Inverse of [`encode_filters`].
///
/// # Errors
///
/// Returns [`BoardError::InvalidFilters`] for bad percent-encoding, bad JSON,
/// or an entry that does not hold exactly one filter.
pub fn decode_filters(param: &str) -> Result<Vec<QueryFilter>, BoardError> {
    let json = urlencoding::decode(param).map_err(|e| BoardError::InvalidFilters(e.to_string()))?;
    let entries: Vec<BTreeMap<String, FilterBody>> =
        serde_json::from_str(&json).map_err(|e| BoardError::InvalidFilters(e.to_string()))?;

    entries
        .into_iter()
        .map(|entry| {
            if entry.len() != 1 {
                return Err(BoardError::InvalidFilters(format!("expected one filter per entry, got {}", entry.len())));
            }
            let (name, body) = entry
                .into_iter()
                .next()
                .ok_or_else(|| BoardError::InvalidFilters("empty filter entry".into()))?;
            Ok(QueryFilter { name, operator: body.operator, values: body.values })
        })
        .collect()
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
