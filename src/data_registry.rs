use crate::prompt::{structure_summary, DataDescriptor};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata a registry keeps alongside each stored object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataInfo {
    pub description: String,
    pub structure: String,
}

/// Shared key/value store the host shell exposes to every app. Generated
/// apps reach it through the harness `app.data` slot; the studio reads it to
/// describe available data in prompts.
pub trait DataRegistry {
    fn get_all_data(&self) -> BTreeMap<String, Value>;
    fn get_data(&self, key: &str) -> Option<Value>;
    fn get_data_info(&self, key: &str) -> Option<DataInfo>;
    fn register_data(&mut self, key: &str, value: Value, info: DataInfo);
    fn update_data(&mut self, key: &str, value: Value) -> bool;
    fn delete_data(&mut self, key: &str) -> bool;
    /// Registers interest in changes to a key. Subscribers are invoked on
    /// update_data and delete_data.
    fn subscribe(&mut self, key: &str, callback: Box<dyn FnMut(&str, Option<&Value>)>);
}

/// Builds the prompt-facing description of every registered object. When a
/// registry carries no usable structure note, one is derived from the value
/// itself.
pub fn describe_registry(registry: &dyn DataRegistry) -> Vec<DataDescriptor> {
    registry
        .get_all_data()
        .into_iter()
        .map(|(key, value)| {
            let info = registry.get_data_info(&key).unwrap_or_default();
            let structure = if info.structure.is_empty() || info.structure == "Unknown structure" {
                structure_summary(&value)
            } else {
                info.structure
            };
            let description = if info.description.is_empty() {
                "No description".to_string()
            } else {
                info.description
            };
            DataDescriptor {
                key,
                description,
                structure,
            }
        })
        .collect()
}

#[derive(Default)]
pub struct InMemoryDataRegistry {
    entries: BTreeMap<String, (Value, DataInfo)>,
    subscribers: BTreeMap<String, Vec<Box<dyn FnMut(&str, Option<&Value>)>>>,
}

impl InMemoryDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&mut self, key: &str, value: Option<&Value>) {
        if let Some(callbacks) = self.subscribers.get_mut(key) {
            for callback in callbacks {
                callback(key, value);
            }
        }
    }
}

impl DataRegistry for InMemoryDataRegistry {
    fn get_all_data(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|(key, (value, _))| (key.clone(), value.clone()))
            .collect()
    }

    fn get_data(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|(value, _)| value.clone())
    }

    fn get_data_info(&self, key: &str) -> Option<DataInfo> {
        self.entries.get(key).map(|(_, info)| info.clone())
    }

    fn register_data(&mut self, key: &str, value: Value, info: DataInfo) {
        self.entries.insert(key.to_string(), (value, info));
    }

    fn update_data(&mut self, key: &str, value: Value) -> bool {
        match self.entries.get_mut(key) {
            Some((slot, _)) => {
                *slot = value.clone();
                self.notify(key, Some(&value));
                true
            }
            None => false,
        }
    }

    fn delete_data(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.notify(key, None);
            true
        } else {
            false
        }
    }

    fn subscribe(&mut self, key: &str, callback: Box<dyn FnMut(&str, Option<&Value>)>) {
        self.subscribers.entry(key.to_string()).or_default().push(callback);
    }
}

/// External HTTP endpoints the shell makes callable from generated apps.
pub trait ApiRegistry {
    /// Prompt-ready description of every callable endpoint, one per line.
    fn prompt_info(&self) -> String;
}

#[derive(Debug, Default)]
pub struct InMemoryApiRegistry {
    endpoints: Vec<DataDescriptor>,
}

impl InMemoryApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, description: &str, usage: &str) {
        self.endpoints.push(DataDescriptor {
            key: name.to_string(),
            description: description.to_string(),
            structure: usage.to_string(),
        });
    }
}

impl ApiRegistry for InMemoryApiRegistry {
    fn prompt_info(&self) -> String {
        self.endpoints
            .iter()
            .map(DataDescriptor::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = InMemoryDataRegistry::new();
        registry.register_data(
            "costs",
            json!([{"amount": 10}]),
            DataInfo {
                description: "Cost entries".to_string(),
                structure: String::new(),
            },
        );
        assert_eq!(registry.get_data("costs"), Some(json!([{"amount": 10}])));
        assert!(registry.get_data("missing").is_none());
    }

    #[test]
    fn update_and_delete_report_whether_the_key_existed() {
        let mut registry = InMemoryDataRegistry::new();
        registry.register_data("counter", json!(1), DataInfo::default());
        assert!(registry.update_data("counter", json!(2)));
        assert!(!registry.update_data("missing", json!(0)));
        assert!(registry.delete_data("counter"));
        assert!(!registry.delete_data("counter"));
    }

    #[test]
    fn subscribers_see_updates_and_deletions() {
        let mut registry = InMemoryDataRegistry::new();
        registry.register_data("counter", json!(1), DataInfo::default());
        let seen: Rc<RefCell<Vec<Option<Value>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        registry.subscribe(
            "counter",
            Box::new(move |_, value| sink.borrow_mut().push(value.cloned())),
        );

        registry.update_data("counter", json!(2));
        registry.delete_data("counter");
        assert_eq!(*seen.borrow(), vec![Some(json!(2)), None]);
    }

    #[test]
    fn describe_registry_derives_missing_structure_from_the_value() {
        let mut registry = InMemoryDataRegistry::new();
        registry.register_data(
            "costs",
            json!([{"amount": 10, "date": "2026-01-01"}]),
            DataInfo {
                description: "Cost entries".to_string(),
                structure: "Unknown structure".to_string(),
            },
        );
        registry.register_data(
            "profile",
            json!({"name": "a"}),
            DataInfo {
                description: String::new(),
                structure: "Custom shape".to_string(),
            },
        );

        let descriptors = describe_registry(&registry);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].key, "costs");
        assert_eq!(descriptors[0].structure, "Array of 1 objects with keys: amount, date");
        assert_eq!(descriptors[1].description, "No description");
        assert_eq!(descriptors[1].structure, "Custom shape");
    }
}
