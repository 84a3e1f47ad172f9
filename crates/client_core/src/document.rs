use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub const CONTRACT_FORM_ID: &str = "contractForm";
pub const CLIENT_NAME_ID: &str = "clientName";
pub const CLIENT_EMAIL_ID: &str = "clientEmail";
pub const PAYMENT_AMOUNT_ID: &str = "paymentAmount";
pub const REQUIREMENTS_ID: &str = "requirements";
pub const DESCRIPTION_ID: &str = "description";

/// Input ids read on every submission, in wire order.
pub const CONTRACT_FIELD_IDS: [&str; 5] = [
    CLIENT_NAME_ID,
    CLIENT_EMAIL_ID,
    PAYMENT_AMOUNT_ID,
    REQUIREMENTS_ID,
    DESCRIPTION_ID,
];

/// The slice of a host page the form handler depends on: element lookup by
/// id and the current value of input elements.
pub trait FormDocument: Send + Sync {
    fn has_element(&self, id: &str) -> bool;
    /// `None` when no input element carries `id`.
    fn input_value(&self, id: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    Form,
    Input(String),
}

/// Document held in memory, for native hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryDocument {
    elements: RwLock<HashMap<String, Element>>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// The contract form with all five inputs present and empty.
    pub fn contract_page() -> Self {
        let document = Self::new();
        document.add_form(CONTRACT_FORM_ID);
        for id in CONTRACT_FIELD_IDS {
            document.set_value(id, "");
        }
        document
    }

    pub fn add_form(&self, id: &str) {
        self.write().insert(id.to_string(), Element::Form);
    }

    /// Sets the value of the input `id`, creating the input if needed.
    pub fn set_value(&self, id: &str, value: impl Into<String>) {
        self.write()
            .insert(id.to_string(), Element::Input(value.into()));
    }

    pub fn remove(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Element>> {
        self.elements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Element>> {
        self.elements
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FormDocument for InMemoryDocument {
    fn has_element(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    fn input_value(&self, id: &str) -> Option<String> {
        match self.read().get(id) {
            Some(Element::Input(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_page_has_form_and_empty_inputs() {
        let document = InMemoryDocument::contract_page();
        assert!(document.has_element(CONTRACT_FORM_ID));
        for id in CONTRACT_FIELD_IDS {
            assert_eq!(document.input_value(id).as_deref(), Some(""));
        }
    }

    #[test]
    fn forms_have_no_input_value() {
        let document = InMemoryDocument::new();
        document.add_form(CONTRACT_FORM_ID);
        assert!(document.has_element(CONTRACT_FORM_ID));
        assert_eq!(document.input_value(CONTRACT_FORM_ID), None);
    }

    #[test]
    fn removed_inputs_disappear() {
        let document = InMemoryDocument::contract_page();
        document.set_value(CLIENT_NAME_ID, "Jane");
        assert_eq!(document.input_value(CLIENT_NAME_ID).as_deref(), Some("Jane"));
        assert!(document.remove(CLIENT_NAME_ID));
        assert!(!document.has_element(CLIENT_NAME_ID));
        assert!(!document.remove(CLIENT_NAME_ID));
    }
}
