use std::env;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    /// Directive used when RUST_LOG is unset or unparsable.
    pub(crate) default_directive: String,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let component = component.trim().to_string();

        let service_name = non_empty("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = non_empty("STAGE").unwrap_or_else(|| "unknown".to_string());

        // Keep the HTTP trace spans visible next to the crate's own logs.
        let default_directive = format!("info,{}=info,tower_http=info", component.replace('-', "_"));

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            default_directive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn service_name_defaults_to_component() {
        let config = ObservabilityConfig::from_lookup(" backend ", lookup(&[]));

        assert_eq!(
            config.service_context,
            ServiceContext {
                service_name: "backend".to_string(),
                environment: "unknown".to_string(),
                component: "backend".to_string(),
            }
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = ObservabilityConfig::from_lookup(
            "backend",
            lookup(&[("SERVICE_NAME", "  "), ("STAGE", "production")]),
        );

        assert_eq!(config.service_context.service_name, "backend");
        assert_eq!(config.service_context.environment, "production");
    }
}
