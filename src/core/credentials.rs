//! The credential bag.
//!
//! A read-only, precedence-merged store of every credential discovered on the
//! machine. Keys are either flat dotted paths (`openrouter.key`) or provider
//! namespaces holding a nested object (`anthropic` → `{"access": "..."}`).
//! Built once by [`crate::core::resolver::CredentialResolver`] and passed by
//! shared reference everywhere else.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::provider::ProviderId;

/// Reserved key holding the linked OAuth accounts file.
pub const LINKED_ACCOUNTS_KEY: &str = "antigravity";

/// Reserved key holding the token read from the OpenCode database.
pub const DATABASE_TOKEN_KEY: &str = "opencode-zen-token";

/// Nested fields consulted by [`CredentialBag::get_key`], in order.
const NESTED_FIELDS: [&str; 4] = ["key", "access", "refresh", "token"];

// =============================================================================
// Values and Sources
// =============================================================================

/// Where an entry came from. Declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialSource {
    /// The primary `auth.json`.
    AuthFile,
    /// The companion OAuth accounts file.
    LinkedAccounts,
    /// Process environment.
    Environment,
    /// The local OpenCode database.
    Database,
}

impl CredentialSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthFile => "auth-file",
            Self::LinkedAccounts => "linked-accounts",
            Self::Environment => "environment",
            Self::Database => "database",
        }
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single credential value.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialValue {
    /// A plain secret string.
    Text(String),
    /// A provider object such as `{"type": "oauth", "access": "...", "refresh": "..."}`.
    Object(Map<String, Value>),
    /// Any other JSON shape, kept as-is.
    Opaque(Value),
}

impl CredentialValue {
    /// The string payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The object payload, if this is a nested object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Value> for CredentialValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Object(map) => Self::Object(map),
            other => Self::Opaque(other),
        }
    }
}

impl From<&str> for CredentialValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A value together with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialEntry {
    pub value: CredentialValue,
    pub source: CredentialSource,
}

// =============================================================================
// Linked Accounts
// =============================================================================

/// Typed view over the linked OAuth accounts bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedAccounts {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Every other field of the file, untouched.
    pub extra: Map<String, Value>,
}

impl LinkedAccounts {
    fn from_object(object: &Map<String, Value>) -> Self {
        let field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let extra = object
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "client_id" | "client_secret" | "refresh_token"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            client_id: field("client_id"),
            client_secret: field("client_secret"),
            refresh_token: field("refresh_token"),
            extra,
        }
    }

    /// Whether a refresh-token exchange can be attempted.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        !self.client_id.is_empty() && !self.refresh_token.is_empty()
    }
}

// =============================================================================
// Key lookup table
// =============================================================================

/// How one provider's key is located in the bag.
struct KeyLookup {
    provider: &'static str,
    flat: &'static str,
    nested: &'static str,
    /// `(namespace, field)` consulted last.
    extra: Option<(&'static str, &'static str)>,
}

const KEY_LOOKUPS: &[KeyLookup] = &[
    KeyLookup {
        provider: "OpenRouter",
        flat: "openrouter.key",
        nested: "openrouter",
        extra: None,
    },
    KeyLookup {
        provider: "Claude",
        flat: "claude.key",
        nested: "claude",
        extra: Some(("anthropic", "access")),
    },
    KeyLookup {
        provider: "Gemini CLI",
        flat: "gemini.key",
        nested: "gemini",
        extra: None,
    },
    KeyLookup {
        provider: "OpenAI",
        flat: "openai.key",
        nested: "openai",
        extra: None,
    },
    KeyLookup {
        provider: "Vertex AI",
        flat: "vertex.key",
        nested: "vertex",
        extra: None,
    },
    KeyLookup {
        provider: "Google AI Studio",
        flat: "googleaistudio.key",
        nested: "google",
        extra: Some(("google-custom", "key")),
    },
    KeyLookup {
        provider: "GitHub Copilot",
        flat: "copilot.token",
        nested: "github-copilot",
        extra: None,
    },
];

// =============================================================================
// Credential Bag
// =============================================================================

/// Precedence-merged credential store.
///
/// Insertion is first-writer-wins: once a key is present, later inserts for
/// the same key are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialBag {
    entries: BTreeMap<String, CredentialEntry>,
}

impl CredentialBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless the key is already taken.
    ///
    /// Returns `true` when the value was stored.
    pub fn insert_if_absent(
        &mut self,
        key: impl Into<String>,
        value: impl Into<CredentialValue>,
        source: CredentialSource,
    ) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            CredentialEntry {
                value: value.into(),
                source,
            },
        );
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CredentialValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Which source supplied `key`.
    #[must_use]
    pub fn source_of(&self, key: &str) -> Option<CredentialSource> {
        self.entries.get(key).map(|e| e.source)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries contributed by `source`.
    #[must_use]
    pub fn count_from(&self, source: CredentialSource) -> usize {
        self.entries.values().filter(|e| e.source == source).count()
    }

    /// Non-empty text stored directly under `key`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(CredentialValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// String field `field` of the nested object under `namespace`.
    ///
    /// Empty when the namespace is absent, not an object, or the field is
    /// missing or not a string.
    #[must_use]
    pub fn get_nested_field(&self, namespace: &str, field: &str) -> String {
        self.nested_str(namespace, field)
            .unwrap_or_default()
            .to_string()
    }

    fn nested_str(&self, namespace: &str, field: &str) -> Option<&str> {
        self.get(namespace)
            .and_then(CredentialValue::as_object)
            .and_then(|obj| obj.get(field))
            .and_then(Value::as_str)
    }

    /// Best key for `provider_name`, or an empty string.
    ///
    /// Checks the provider's flat key, then its nested object's `key`,
    /// `access`, `refresh` and `token` fields, then one provider-specific
    /// extra location. Unknown names yield an empty string.
    #[must_use]
    pub fn get_key(&self, provider_name: &str) -> String {
        let Some(lookup) = KEY_LOOKUPS.iter().find(|l| l.provider == provider_name) else {
            return String::new();
        };

        if let Some(flat) = self.text(lookup.flat) {
            return flat.to_string();
        }

        for field in NESTED_FIELDS {
            if let Some(value) = self.nested_str(lookup.nested, field).filter(|s| !s.is_empty()) {
                return value.to_string();
            }
        }

        lookup
            .extra
            .and_then(|(ns, field)| self.nested_str(ns, field))
            .unwrap_or_default()
            .to_string()
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    /// [`Self::get_key`] for `id`, with `None` in place of an empty string.
    #[must_use]
    pub fn key_of(&self, id: ProviderId) -> Option<String> {
        Some(self.get_key(id.display_name())).filter(|key| !key.is_empty())
    }

    #[must_use]
    pub fn openrouter_key(&self) -> Option<String> {
        self.key_of(ProviderId::OpenRouter)
    }

    #[must_use]
    pub fn claude_key(&self) -> Option<String> {
        self.key_of(ProviderId::Claude)
    }

    #[must_use]
    pub fn gemini_key(&self) -> Option<String> {
        self.key_of(ProviderId::GeminiCli)
    }

    #[must_use]
    pub fn copilot_token(&self) -> Option<String> {
        self.key_of(ProviderId::Copilot)
    }

    /// Token read from the OpenCode database, if any.
    #[must_use]
    pub fn database_token(&self) -> Option<&str> {
        self.text(DATABASE_TOKEN_KEY)
    }

    /// The linked OAuth accounts bucket, if one was loaded.
    #[must_use]
    pub fn linked_accounts(&self) -> Option<LinkedAccounts> {
        self.get(LINKED_ACCOUNTS_KEY)
            .and_then(CredentialValue::as_object)
            .map(LinkedAccounts::from_object)
    }
}
