//! In-memory template store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    models::ContentType,
    store::{PersistenceResult, TemplateStore},
    templates::{ContentTemplate, NewTemplate},
};

/// Thread-safe in-memory implementation of TemplateStore
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<String, ContentTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.templates.read().len()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn create_template(
        &self,
        user_id: &str,
        new: NewTemplate,
    ) -> PersistenceResult<ContentTemplate> {
        let template = ContentTemplate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: new.name,
            content_type: new.content_type,
            prompt_template: new.prompt_template,
            variables: new.variables,
            is_public: new.is_public,
            created_at: Utc::now(),
        };
        self.templates
            .write()
            .insert(template.id.clone(), template.clone());
        Ok(template)
    }

    async fn list_templates(
        &self,
        user_id: &str,
        content_type: Option<ContentType>,
        include_public: bool,
    ) -> PersistenceResult<Vec<ContentTemplate>> {
        let templates = self.templates.read();
        let mut visible: Vec<ContentTemplate> = templates
            .values()
            .filter(|t| t.user_id == user_id || (include_public && t.is_public))
            .filter(|t| content_type.map_or(true, |ct| t.content_type == ct))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }
}
