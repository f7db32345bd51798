//! Factory registry for custom destination types.
//!
//! A concept whose type name is not one the converter knows is built by the
//! factory registered under that name.

use crate::converter::value::TypedValue;
use crate::error::ConversionError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a custom value from a single raw string argument.
///
/// Factories return any JSON value; the converter wraps it in
/// [`TypedValue::Custom`] together with the type name.
pub trait ValueFactory: Send + Sync {
    fn build(&self, raw: &str) -> Result<Value, String>;
}

impl<F> ValueFactory for F
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync,
{
    fn build(&self, raw: &str) -> Result<Value, String> {
        self(raw)
    }
}

/// Registry of custom type factories, keyed by type name.
#[derive(Default)]
pub struct ConverterRegistry {
    factories: HashMap<String, Box<dyn ValueFactory>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a custom type name.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use gleaner::converter::{ConverterRegistry, ValueFactory};
    ///
    /// let mut registry = ConverterRegistry::new();
    /// registry.register("Iban", Box::new(|raw: &str| {
    ///     Ok(serde_json::Value::String(raw.replace(' ', "")))
    /// }) as Box<dyn ValueFactory>);
    /// ```
    pub fn register(&mut self, name: impl Into<String>, factory: Box<dyn ValueFactory>) {
        self.factories.insert(name.into(), factory);
    }

    /// Build a value of the custom type `name` from `raw`.
    pub fn build(&self, name: &str, raw: &str) -> Result<TypedValue, ConversionError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConversionError::MissingFactory {
                value: raw.to_string(),
                target: name.to_string(),
            })?;

        let value = factory
            .build(raw)
            .map_err(|reason| ConversionError::Unparsable {
                value: raw.to_string(),
                target: name.to_string(),
                reason,
            })?;

        Ok(TypedValue::Custom {
            type_name: name.to_string(),
            value,
        })
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn list_factories(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_build() {
        let mut registry = ConverterRegistry::new();

        registry.register(
            "Upper",
            Box::new(|raw: &str| Ok(Value::String(raw.to_uppercase()))) as Box<dyn ValueFactory>,
        );

        let value = registry.build("Upper", "abc").unwrap();
        assert_eq!(
            value,
            TypedValue::Custom {
                type_name: "Upper".to_string(),
                value: Value::String("ABC".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_factory() {
        let registry = ConverterRegistry::new();

        let result = registry.build("Nope", "abc");
        assert!(matches!(result, Err(ConversionError::MissingFactory { .. })));
    }

    #[test]
    fn test_failing_factory_reports_value_and_type() {
        let mut registry = ConverterRegistry::new();
        registry.register(
            "Strict",
            Box::new(|_raw: &str| -> Result<Value, String> { Err("rejected".to_string()) })
                as Box<dyn ValueFactory>,
        );

        let err = registry.build("Strict", "xyz").unwrap_err();
        assert_eq!(err.value(), "xyz");
        assert_eq!(err.target(), "Strict");
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_has_factory() {
        let mut registry = ConverterRegistry::new();
        registry.register(
            "Any",
            Box::new(|raw: &str| Ok(Value::String(raw.to_string()))) as Box<dyn ValueFactory>,
        );

        assert!(registry.has_factory("Any"));
        assert!(!registry.has_factory("Other"));
        assert_eq!(registry.list_factories(), vec!["Any".to_string()]);
    }
}
