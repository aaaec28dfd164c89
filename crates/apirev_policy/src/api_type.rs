//! API type classification.
//!
//! The type is computed once per document and handed explicitly to every
//! consumer that needs it.

use std::fmt;

use apirev_doc::DocNode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::openapi::{self, CORE_METHODS};

/// Behavioural variant of an API description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Regular,
    /// Delivers events through callbacks declared on regular operations.
    ImplicitSubscription,
    /// Exposes subscription management endpoints.
    ExplicitSubscription,
}

impl ApiType {
    pub fn is_subscription(&self) -> bool {
        !matches!(self, ApiType::Regular)
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiType::Regular => "Regular API",
            ApiType::ImplicitSubscription => "Implicit Subscription API",
            ApiType::ExplicitSubscription => "Explicit Subscription API",
        };
        f.write_str(name)
    }
}

const SUBSCRIPTION: &str = "subscription";
const RESPONSE_EVENT_KEYWORDS: [&str; 4] = ["webhook", "event", "notification", "callback"];
const SCHEMA_EVENT_KEYWORDS: [&str; 3] = ["webhook", "event", "notification"];

/// Classifier for [`ApiType`].
///
/// Rules are tried in a fixed order and the first hit wins:
/// 1. a path containing `subscription` is explicit,
/// 2. an operation declaring `callbacks` is implicit,
/// 3. a response schema mentioning webhook/event/notification/callback is implicit,
/// 4. the first schema name mentioning subscription (explicit) or
///    webhook/event/notification (implicit) decides,
/// 5. anything else is regular.
pub struct ApiClassifier;

impl ApiClassifier {
    pub fn classify(root: &DocNode) -> ApiType {
        let api_type = Self::by_path(root)
            .or_else(|| Self::by_callbacks(root))
            .or_else(|| Self::by_response_schema(root))
            .or_else(|| Self::by_schema_name(root))
            .unwrap_or(ApiType::Regular);
        debug!("Classified description as {}", api_type);
        api_type
    }

    fn by_path(root: &DocNode) -> Option<ApiType> {
        openapi::paths(root)
            .any(|(path, _)| path.to_lowercase().contains(SUBSCRIPTION))
            .then_some(ApiType::ExplicitSubscription)
    }

    fn by_callbacks(root: &DocNode) -> Option<ApiType> {
        openapi::operations(root, &CORE_METHODS)
            .iter()
            .any(|op| op.node.contains_key("callbacks"))
            .then_some(ApiType::ImplicitSubscription)
    }

    fn by_response_schema(root: &DocNode) -> Option<ApiType> {
        let hit = openapi::operations(root, &CORE_METHODS).iter().any(|op| {
            op.responses()
                .into_iter()
                .flat_map(|r| r.entries())
                .flat_map(|(_, response)| response.get("content").into_iter())
                .flat_map(|content| content.entries())
                .filter_map(|(_, media)| media.get("schema"))
                .any(|schema| {
                    let text = schema.to_string().to_lowercase();
                    RESPONSE_EVENT_KEYWORDS.iter().any(|k| text.contains(k))
                })
        });
        hit.then_some(ApiType::ImplicitSubscription)
    }

    fn by_schema_name(root: &DocNode) -> Option<ApiType> {
        openapi::schemas(root).find_map(|(name, _)| {
            let name = name.to_lowercase();
            if name.contains(SUBSCRIPTION) {
                Some(ApiType::ExplicitSubscription)
            } else if SCHEMA_EVENT_KEYWORDS.iter().any(|k| name.contains(k)) {
                Some(ApiType::ImplicitSubscription)
            } else {
                None
            }
        })
    }
}
