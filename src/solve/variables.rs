use std::collections::BTreeMap;

/// Variable bindings reported by the solver, kept for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    bindings: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn upsert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        tracing::debug!(%name, %value, "binding variable");
        self.bindings.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Copy sent along with a solve request.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.bindings.clone()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
