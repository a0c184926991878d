//! Template list state transitions.
//!
//! `reduce` is pure: it takes the current list and an action and returns
//! the next list plus the store writes needed to persist the change. The
//! caller runs the effects; nothing here touches the store.

use super::model::Template;

/// A change requested against the template list.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateAction {
    /// Duplicate `source` under `new_id`.
    Copy { source: Template, new_id: String },
    /// Delete the template with this template's id.
    Remove(Template),
    /// Replace the template with the same id, or add it if it is new.
    Save(Template),
}

/// A store write produced by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Put(Template),
    Delete(String),
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub templates: Vec<Template>,
    pub effects: Vec<Effect>,
}

pub fn reduce(state: &[Template], action: TemplateAction) -> Transition {
    match action {
        TemplateAction::Copy { source, new_id } => {
            let copy = Template {
                id: new_id,
                ..source
            };
            let mut templates = state.to_vec();
            templates.push(copy.clone());
            Transition {
                templates,
                effects: vec![Effect::Put(copy)],
            }
        }
        TemplateAction::Remove(template) => {
            let templates: Vec<Template> = state
                .iter()
                .filter(|t| t.id != template.id)
                .cloned()
                .collect();

            let effects = if templates.len() < state.len() {
                vec![Effect::Delete(template.id)]
            } else {
                Vec::new()
            };

            Transition { templates, effects }
        }
        TemplateAction::Save(template) => {
            let mut templates = state.to_vec();
            match templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => *existing = template.clone(),
                None => templates.push(template.clone()),
            }
            Transition {
                templates,
                effects: vec![Effect::Put(template)],
            }
        }
    }
}
