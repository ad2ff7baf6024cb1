//! Value templates applied to received payloads

use minijinja::{context, Environment};
use tracing::{trace, warn};

use crate::error::{MqttError, MqttResult};

const TEMPLATE_NAME: &str = "value_template";

/// An optional, pre-compiled value template
///
/// Templates see the payload as `value` and, when the payload parses as
/// JSON, as `value_json`.
pub struct MqttValueTemplate {
    env: Option<Environment<'static>>,
}

impl MqttValueTemplate {
    /// Compile `template`; None renders every payload unchanged
    pub fn new(template: Option<&str>) -> MqttResult<Self> {
        let Some(source) = template else {
            return Ok(Self { env: None });
        };
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.to_string())
            .map_err(|e| MqttError::Config(format!("invalid template '{}': {}", source, e)))?;
        Ok(Self { env: Some(env) })
    }

    /// Whether a template is configured
    pub fn is_set(&self) -> bool {
        self.env.is_some()
    }

    /// Render the template for `payload`
    ///
    /// A template that fails to render logs a warning and yields the raw
    /// payload.
    pub fn render_with_possible_json_value(&self, payload: &str) -> String {
        let Some(env) = &self.env else {
            return payload.to_string();
        };

        let value_json = serde_json::from_str::<serde_json::Value>(payload).ok();
        let rendered = env
            .get_template(TEMPLATE_NAME)
            .and_then(|tmpl| tmpl.render(context! { value => payload, value_json => value_json }));

        match rendered {
            Ok(rendered) => {
                let rendered = rendered.trim().to_string();
                trace!(payload, rendered = %rendered, "Rendered value template");
                rendered
            }
            Err(e) => {
                warn!(payload, error = %e, "Failed to render value template");
                payload.to_string()
            }
        }
    }
}

impl std::fmt::Debug for MqttValueTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttValueTemplate")
            .field("is_set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_template_passes_payload_through() {
        let template = MqttValueTemplate::new(None).unwrap();
        assert!(!template.is_set());
        assert_eq!(template.render_with_possible_json_value("LOCKED"), "LOCKED");
    }

    #[test]
    fn test_value_and_value_json() {
        let template = MqttValueTemplate::new(Some("{{ value_json.state }}")).unwrap();
        assert_eq!(
            template.render_with_possible_json_value(r#"{"state": "UNLOCKED"}"#),
            "UNLOCKED"
        );

        let template = MqttValueTemplate::new(Some("{{ value | upper }}")).unwrap();
        assert_eq!(template.render_with_possible_json_value("locked"), "LOCKED");
    }

    #[test]
    fn test_render_error_returns_payload() {
        let template = MqttValueTemplate::new(Some("{{ value_json.state.inner }}")).unwrap();
        assert_eq!(template.render_with_possible_json_value("not json"), "not json");
    }

    #[test]
    fn test_invalid_template_is_config_error() {
        let err = MqttValueTemplate::new(Some("{{ value ")).unwrap_err();
        assert!(matches!(err, MqttError::Config(_)));
    }
}
