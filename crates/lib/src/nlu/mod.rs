//! Natural-language understanding: normalization, team aliases, entity
//! resolution and the tiered intent classifier.

pub mod aliases;
pub mod cache;
pub mod classifier;
pub mod intent;
pub mod resolver;
pub mod rules;
pub mod text;

pub use cache::{ClassifierMemo, MetricsSnapshot};
pub use classifier::{ClassifierSettings, IntentClassifier};
pub use intent::{EntityQuery, IntentKind, IntentResult, SourceTier};
pub use resolver::{EntityResolver, TeamResolution};
