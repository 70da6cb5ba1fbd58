//! Reusable prompt templates
//!
//! Templates hold a prompt with `{{name}}` placeholders and a default for each
//! variable. Public templates are visible to every user.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TemplateError,
    models::{ContentType, GenerationRequest},
};

/// A stored prompt template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub content_type: ContentType,
    pub prompt_template: String,

    /// Variable name to default value
    pub variables: HashMap<String, String>,

    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a template is created
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTemplate {
    pub name: String,
    pub content_type: ContentType,
    pub prompt_template: String,
    pub variables: HashMap<String, String>,
    pub is_public: bool,
}

impl ContentTemplate {
    /// Substitute every `{{name}}` placeholder.
    ///
    /// Supplied values win over the template's defaults. Substituted text is not
    /// scanned again, so values may themselves contain braces.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        let source = self.prompt_template.as_str();
        let mut rendered = String::with_capacity(source.len());
        let mut cursor = 0;

        while let Some(start_offset) = source[cursor..].find("{{") {
            let start = cursor + start_offset;
            let end_offset = source[start + 2..]
                .find("}}")
                .ok_or(TemplateError::Unclosed(start))?;
            let end = start + 2 + end_offset;

            let name = source[start + 2..end].trim();
            let value = values
                .get(name)
                .or_else(|| self.variables.get(name))
                .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;

            rendered.push_str(&source[cursor..start]);
            rendered.push_str(value);
            cursor = end + 2;
        }

        rendered.push_str(&source[cursor..]);
        Ok(rendered)
    }

    /// Render into a generation request of this template's content type
    pub fn to_request(
        &self,
        values: &HashMap<String, String>,
    ) -> Result<GenerationRequest, TemplateError> {
        let mut request =
            GenerationRequest::new(self.render(values)?).with_content_type(self.content_type);
        request.metadata = serde_json::json!({ "template_id": self.id });
        Ok(request)
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut rest = self.prompt_template.as_str();
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let name = rest[start + 2..start + 2 + len].trim().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
            rest = &rest[start + 2 + len + 2..];
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(text: &str, defaults: &[(&str, &str)]) -> ContentTemplate {
        ContentTemplate {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            name: "test".to_string(),
            content_type: ContentType::Blog,
            prompt_template: text.to_string(),
            variables: defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            is_public: false,
            created_at: Utc::now(),
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_uses_values_then_defaults() {
        let t = template(
            "Write a {{ tone }} post about {{topic}}.",
            &[("tone", "friendly"), ("topic", "rust")],
        );
        assert_eq!(
            t.render(&values(&[("topic", "tokio")])).unwrap(),
            "Write a friendly post about tokio."
        );
    }

    #[test]
    fn test_render_missing_variable() {
        let t = template("Hello {{name}}", &[]);
        assert_eq!(
            t.render(&HashMap::new()),
            Err(TemplateError::MissingVariable("name".to_string()))
        );
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let t = template("{{a}}", &[]);
        assert_eq!(t.render(&values(&[("a", "{{b}}")])).unwrap(), "{{b}}");
    }

    #[test]
    fn test_render_unclosed_placeholder() {
        let t = template("ok {{oops", &[]);
        assert_eq!(t.render(&HashMap::new()), Err(TemplateError::Unclosed(3)));
    }

    #[test]
    fn test_to_request_carries_content_type() {
        let t = template("Summarize {{topic}}", &[("topic", "ownership")]);
        let request = t.to_request(&HashMap::new()).unwrap();
        assert_eq!(request.prompt, "Summarize ownership");
        assert_eq!(request.content_type, ContentType::Blog);
        assert_eq!(request.metadata["template_id"], "t1");
    }

    #[test]
    fn test_placeholders_are_deduplicated() {
        let t = template("{{a}} {{b}} {{a}}", &[]);
        assert_eq!(t.placeholders(), vec!["a", "b"]);
    }
}
