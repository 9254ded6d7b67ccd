//! LLM provider configuration: validation, default normalization, and
//! resolution of the provider used for a test or optimize request.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Provider kind used when the client does not specify one.
pub const DEFAULT_PROVIDER_KIND: &str = "custom";

/// Id of the provider synthesized from server environment configuration.
pub const ENV_DEFAULT_PROVIDER_ID: &str = "env-default";

/// Id of the provider synthesized from the `llm_*` keys of the settings store.
pub const SETTINGS_PROVIDER_ID: &str = "settings-default";

/// Settings keys read when no provider list is stored.
pub mod setting_keys {
    pub const API_KEY: &str = "llm_api_key";
    pub const API_URL: &str = "llm_api_url";
    pub const MODEL: &str = "llm_model";
    pub const SYSTEM_PROMPT: &str = "llm_system_prompt";
    pub const NAME: &str = "llm_provider_name";
}

fn default_provider_kind() -> String {
    DEFAULT_PROVIDER_KIND.to_string()
}

/// One OpenAI-compatible provider endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_provider_kind")]
    pub provider: String,
    pub api_key: String,
    #[serde(default)]
    pub api_url: Option<String>,
    pub model: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl ProviderConfig {
    /// Reject entries missing any field needed to call the provider.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("id", &self.id),
            ("name", &self.name),
            ("api_key", &self.api_key),
            ("model", &self.model),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Provider field '{field}' must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Validate a full provider list: every entry valid and ids unique.
pub fn validate_providers(providers: &[ProviderConfig]) -> Result<(), CoreError> {
    let mut ids = HashSet::new();
    for provider in providers {
        provider.validate()?;
        if !ids.insert(provider.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate provider id '{}'",
                provider.id
            )));
        }
    }
    Ok(())
}

/// Ensure exactly one provider is default (when the list is non-empty).
///
/// No default: the first becomes default. Several: only the first keeps it.
pub fn normalize_defaults(providers: &mut [ProviderConfig]) {
    let first_default = providers.iter().position(|p| p.is_default);
    match first_default {
        None => {
            if let Some(first) = providers.first_mut() {
                first.is_default = true;
            }
        }
        Some(keep) => {
            for (idx, provider) in providers.iter_mut().enumerate() {
                provider.is_default = idx == keep;
            }
        }
    }
}

/// Pick the provider for a request.
///
/// An explicit id must match. Without one, the default provider wins, then
/// the first configured provider.
pub fn resolve_provider<'a>(
    providers: &'a [ProviderConfig],
    provider_id: Option<&str>,
) -> Result<&'a ProviderConfig, CoreError> {
    if providers.is_empty() {
        return Err(CoreError::Validation(
            "No LLM provider configured".to_string(),
        ));
    }

    match provider_id.filter(|id| !id.is_empty()) {
        Some(id) => providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::Validation("Invalid provider id".to_string())),
        None => Ok(providers
            .iter()
            .find(|p| p.is_default)
            .unwrap_or(&providers[0])),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn provider(id: &str, is_default: bool) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            name: format!("Provider {id}"),
            provider: DEFAULT_PROVIDER_KIND.to_string(),
            api_key: "sk-test".to_string(),
            api_url: None,
            model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            is_default,
        }
    }

    #[test]
    fn first_becomes_default_when_none_marked() {
        let mut list = vec![provider("a", false), provider("b", false)];
        normalize_defaults(&mut list);
        assert!(list[0].is_default);
        assert!(!list[1].is_default);
    }

    #[test]
    fn only_first_default_kept() {
        let mut list = vec![provider("a", false), provider("b", true), provider("c", true)];
        normalize_defaults(&mut list);
        let defaults: Vec<_> = list.iter().filter(|p| p.is_default).map(|p| &p.id).collect();
        assert_eq!(defaults, vec!["b"]);
    }

    #[test]
    fn resolve_prefers_explicit_id() {
        let list = vec![provider("a", true), provider("b", false)];
        assert_eq!(resolve_provider(&list, Some("b")).unwrap().id, "b");
    }

    #[test]
    fn resolve_falls_back_to_default_then_first() {
        let list = vec![provider("a", false), provider("b", true)];
        assert_eq!(resolve_provider(&list, None).unwrap().id, "b");

        let list = vec![provider("a", false), provider("b", false)];
        assert_eq!(resolve_provider(&list, Some("")).unwrap().id, "a");
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let list = vec![provider("a", true)];
        assert_matches!(
            resolve_provider(&list, Some("zzz")),
            Err(CoreError::Validation(msg)) if msg == "Invalid provider id"
        );
    }

    #[test]
    fn resolve_without_providers_fails() {
        assert_matches!(
            resolve_provider(&[], None),
            Err(CoreError::Validation(msg)) if msg.contains("No LLM provider")
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let list = vec![provider("a", true), provider("a", false)];
        assert_matches!(validate_providers(&list), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_api_key_rejected() {
        let mut p = provider("a", true);
        p.api_key = "  ".to_string();
        assert_matches!(p.validate(), Err(CoreError::Validation(msg)) if msg.contains("api_key"));
    }

    #[test]
    fn provider_kind_defaults_to_custom() {
        let p: ProviderConfig = serde_json::from_str(
            r#"{"id":"x","name":"X","api_key":"k","model":"m"}"#,
        )
        .unwrap();
        assert_eq!(p.provider, "custom");
        assert!(!p.is_default);
    }
}
