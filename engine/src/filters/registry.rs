//! Filter registry: the catalog of named invocation functions.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::gate::{gated, ungated, Gating, Implementation, Interceptor, Invoke};
use super::Filter;
use crate::condition::{ConditionResolver, Params};
use crate::error::{ExecutionResult, FilterError, RegistryError};

/// Catalog listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct FilterInfo {
    pub name: &'static str,
    pub gated: bool,
    pub description: &'static str,
}

struct Entry {
    filter: Filter,
    invoke: Invoke,
}

/// Name → invocation function, built once and read-only afterwards.
///
/// Share it with `Arc<FilterRegistry>`.
pub struct FilterRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl FilterRegistry {
    /// Build the catalog.
    ///
    /// With an `interceptor`, every exposed function calls
    /// `interceptor(params, data, underlying)` where `underlying` is the gated
    /// (or, for `weather`, raw) invocation.
    pub fn build(resolver: Arc<ConditionResolver>, interceptor: Option<Interceptor>) -> Self {
        let entries = Filter::ALL
            .into_iter()
            .map(|filter| {
                let implementation: Implementation =
                    Arc::new(move |params: &Params, data: Value| -> ExecutionResult<Value> { filter.apply(params, data) });

                let invoke = match filter.gating() {
                    Gating::Gated => gated(filter.name(), resolver.clone(), implementation),
                    Gating::Ungated => ungated(implementation),
                };

                let invoke = match &interceptor {
                    Some(interceptor) => intercept(interceptor.clone(), invoke),
                    None => invoke,
                };

                (filter.name(), Entry { filter, invoke })
            })
            .collect();

        Self { entries }
    }

    /// Catalog with the default condition collaborators and no interceptor.
    pub fn standard() -> Self {
        Self::build(Arc::new(ConditionResolver::default()), None)
    }

    pub fn get(&self, name: &str) -> Option<&Invoke> {
        self.entries.get(name).map(|entry| &entry.invoke)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn is_gated(&self, name: &str) -> Option<bool> {
        self.entries
            .get(name)
            .map(|entry| entry.filter.gating() == Gating::Gated)
    }

    /// Invoke a filter by name.
    pub fn invoke(&self, name: &str, params: &Params, data: Value) -> Result<Value, RegistryError> {
        let invoke = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFilter(name.to_string()))?;
        Ok(invoke(params, data)?)
    }

    pub fn describe(&self) -> Vec<FilterInfo> {
        self.entries
            .values()
            .map(|entry| FilterInfo {
                name: entry.filter.name(),
                gated: entry.filter.gating() == Gating::Gated,
                description: entry.filter.description(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn intercept(interceptor: Interceptor, underlying: Invoke) -> Invoke {
    Arc::new(move |params: &Params, data: Value| -> Result<Value, FilterError> {
        interceptor(params, data, &underlying)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_standard_catalog() {
        let registry = FilterRegistry::standard();
        assert_eq!(registry.len(), Filter::ALL.len());
        assert!(registry.get("csv").is_some());
        assert!(registry.get("mysql").is_none());
        assert_eq!(registry.is_gated("weather"), Some(false));
        assert_eq!(registry.is_gated("sum"), Some(true));
        assert_eq!(registry.is_gated("nope"), None);

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"csv"));
        assert_eq!(names.last(), Some(&"weather"));
    }

    #[test]
    fn test_invoke_unknown_filter() {
        let registry = FilterRegistry::standard();
        let err = registry.invoke("geoip", &Params::new(), json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFilter(ref n) if n == "geoip"));
    }

    #[test]
    fn test_invoke_gated_filter_skips_on_false_condition() {
        let registry = FilterRegistry::standard();
        let data = json!({"items": [1, 2, 3], "mode": "off"});
        let out = registry
            .invoke("sum", &params(json!({"source": "items", "if": "mode == 'on'"})), data.clone())
            .unwrap();
        assert_eq!(out, data);

        let out = registry
            .invoke("sum", &params(json!({"source": "items", "if": "mode == 'off'"})), data)
            .unwrap();
        assert_eq!(out["sum"], json!(6));
    }

    #[test]
    fn test_weather_ignores_condition() {
        let registry = FilterRegistry::standard();
        let out = registry
            .invoke("weather", &params(json!({"if": "x == 1"})), json!({"temperature": 20, "wind_speed": 10, "x": 2}))
            .unwrap();
        assert!(out.get("weather").is_some());
    }

    #[test]
    fn test_weather_errors_are_not_wrapped() {
        let registry = FilterRegistry::standard();
        let err = registry.invoke("weather", &Params::new(), json!({})).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Filter(FilterError::Ungated(ExecutionError::MissingValue(_)))
        ));
        assert!(!err.to_string().contains("Unable to process filter"));
    }

    #[test]
    fn test_interceptor_wraps_every_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let interceptor: Interceptor = Arc::new(move |params: &Params, data: Value, invoke: &Invoke| -> Result<Value, FilterError> {
            seen.fetch_add(1, Ordering::SeqCst);
            let mut out = invoke(params, data)?;
            out["intercepted"] = json!(true);
            Ok(out)
        });

        let registry = FilterRegistry::build(Arc::new(ConditionResolver::default()), Some(interceptor));
        let out = registry
            .invoke("generate", &params(json!({"count": 2})), json!({}))
            .unwrap();
        assert_eq!(out["items"], json!([0, 1]));
        assert_eq!(out["intercepted"], json!(true));

        // The interceptor sees the gated function: a false condition still passes through it.
        let out = registry
            .invoke("generate", &params(json!({"count": 2, "if": "flag == true"})), json!({"flag": false}))
            .unwrap();
        assert_eq!(out, json!({"flag": false, "intercepted": true}));

        registry
            .invoke("weather", &Params::new(), json!({"temperature": 5, "wind_speed": 20}))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_interceptor_can_short_circuit() {
        let interceptor: Interceptor =
            Arc::new(|_: &Params, data: Value, _: &Invoke| -> Result<Value, FilterError> { Ok(data) });
        let registry = FilterRegistry::build(Arc::new(ConditionResolver::default()), Some(interceptor));
        let out = registry.invoke("json", &Params::new(), json!({"body": "not json"})).unwrap();
        assert_eq!(out, json!({"body": "not json"}));
    }

    #[test]
    fn test_describe() {
        let info = FilterRegistry::standard().describe();
        let weather = info.iter().find(|i| i.name == "weather").unwrap();
        assert!(!weather.gated);
        assert!(info.iter().filter(|i| i.name != "weather").all(|i| i.gated));
    }
}
