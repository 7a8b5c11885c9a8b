//! Event options for the trigger configuration form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WebhookError, WebhookResult};
use crate::registry::EventRegistry;

/// One selectable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    /// Display name.
    pub name: String,
    /// Event key sent back to the registry.
    pub value: String,
}

/// Lists the events the registry can subscribe to, sorted by display name.
///
/// Unlike the lifecycle callbacks this raises: without an event list the
/// trigger cannot be configured at all.
pub async fn load_event_options<R>(registry: &R) -> WebhookResult<Vec<EventOption>>
where
    R: EventRegistry + ?Sized,
{
    let response = registry.list_events().await?;

    let Some(data) = response.get("data").and_then(Value::as_object) else {
        return Err(WebhookError::Configuration("No data got returned".into()));
    };

    let mut options: Vec<EventOption> = data
        .iter()
        .map(|(key, name)| EventOption {
            name: name.as_str().map(str::to_string).unwrap_or_else(|| key.clone()),
            value: key.clone(),
        })
        .collect();

    options.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.value.cmp(&b.value)));

    tracing::debug!(count = options.len(), "Loaded event options");

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRegistry;

    #[tokio::test]
    async fn test_options_sorted_by_name() {
        let registry = InMemoryRegistry::new();
        registry
            .set_events([
                ("Statamic\\Events\\EntrySaved", "Entry Saved"),
                ("Statamic\\Events\\AssetUploaded", "Asset Uploaded"),
                ("Statamic\\Events\\UserDeleted", "User Deleted"),
            ])
            .await;

        let options = load_event_options(&registry).await.unwrap();
        let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Asset Uploaded", "Entry Saved", "User Deleted"]);
        assert_eq!(options[0].value, "Statamic\\Events\\AssetUploaded");
    }

    #[tokio::test]
    async fn test_missing_data_is_configuration_error() {
        let registry = InMemoryRegistry::new();
        registry.drop_event_data().await;

        let err = load_event_options(&registry).await.unwrap_err();
        assert!(matches!(err, WebhookError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let registry = InMemoryRegistry::new();
        registry.fail_with("unreachable").await;

        let err = load_event_options(&registry).await.unwrap_err();
        assert!(matches!(err, WebhookError::Api(_)));
    }
}
