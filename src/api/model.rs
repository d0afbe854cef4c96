//! Wire types for the recipe API
//!
//! Only the fields the reports read are modelled; everything except the
//! recipe id is optional so a single missing field drops one value, not a
//! whole record.

use serde::Deserialize;
use serde_json::Value;

/// One page of the recipe collection
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Page {
    #[serde(default)]
    pub(crate) count: Option<u64>,
    #[serde(default)]
    pub(crate) next: Option<String>,
    /// Raw records, decoded one at a time so a bad record can be skipped
    #[serde(default)]
    pub(crate) results: Vec<Value>,
}

impl Page {
    /// Next cursor, if present and non-empty
    pub(crate) fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|s| !s.is_empty())
    }
}

/// Paginated history body. `results` is required: an error object such as
/// `{"detail": "Not found."}` is not a history.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryPage {
    pub(crate) results: Vec<Value>,
}

/// The history endpoint has served both a bare list and a paginated object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum HistoryBody {
    List(Vec<Value>),
    Paged(HistoryPage),
}

impl HistoryBody {
    pub(crate) fn into_entries(self) -> Vec<Value> {
        match self {
            HistoryBody::List(entries) => entries,
            HistoryBody::Paged(page) => page.results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Recipe {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) latest_revision: Option<Revision>,
}

impl Recipe {
    pub(crate) fn revision(&self) -> Option<&Revision> {
        self.latest_revision.as_ref()
    }

    pub(crate) fn action_name(&self) -> Option<&str> {
        self.revision().and_then(Revision::action_name)
    }

    pub(crate) fn updated(&self) -> Option<&str> {
        self.revision().and_then(|r| r.updated.as_deref())
    }

    pub(crate) fn date_created(&self) -> Option<&str> {
        self.revision().and_then(|r| r.date_created.as_deref())
    }

    pub(crate) fn slug(&self) -> Option<&str> {
        self.revision().and_then(Revision::slug)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct Action {
    #[serde(default)]
    pub(crate) name: Option<String>,
}

/// A recipe revision, either `latest_revision` or a history entry
#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct Revision {
    #[serde(default)]
    pub(crate) date_created: Option<String>,
    #[serde(default)]
    pub(crate) updated: Option<String>,
    #[serde(default)]
    pub(crate) enabled: Option<bool>,
    #[serde(default)]
    pub(crate) action: Option<Action>,
    #[serde(default)]
    pub(crate) arguments: Option<Value>,
    #[serde(default)]
    pub(crate) filter_expression: Option<String>,
    #[serde(default)]
    pub(crate) extra_filter_expression: Option<String>,
    #[serde(default)]
    pub(crate) filter_object: Option<Value>,
}

impl Revision {
    pub(crate) fn action_name(&self) -> Option<&str> {
        self.action.as_ref().and_then(|a| a.name.as_deref())
    }

    pub(crate) fn slug(&self) -> Option<&str> {
        self.arguments
            .as_ref()
            .and_then(|args| args.get("slug"))
            .and_then(Value::as_str)
    }

    /// True when `filter_object` carries at least one filter
    pub(crate) fn has_filter_object(&self) -> bool {
        match &self.filter_object {
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn extra_expression(&self) -> &str {
        self.extra_filter_expression.as_deref().unwrap_or("")
    }
}
