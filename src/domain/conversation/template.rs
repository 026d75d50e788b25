//! Response template rendering.
//!
//! Templates use `{{key}}` placeholders, optionally with a fallback:
//! `{{name|candidato}}`. Keys resolve against a few built-ins first
//! (`state`, `intent`, `business_unit`, `search_term`, `menu_page`) and then
//! against the conversation context. Unresolved keys without a fallback
//! render as an empty string.

use crate::domain::context::render_value;

use super::ConversationState;

/// Values visible to a template while rendering one turn's response.
#[derive(Debug, Clone, Copy)]
pub struct TemplateScope<'a> {
    pub conversation: &'a ConversationState,
    pub intent: Option<&'a str>,
}

impl<'a> TemplateScope<'a> {
    pub fn new(conversation: &'a ConversationState, intent: Option<&'a str>) -> Self {
        Self {
            conversation,
            intent,
        }
    }

    fn resolve(&self, key: &str) -> Option<String> {
        let c = self.conversation;
        match key {
            "state" => Some(c.current_state.clone()),
            "intent" => self.intent.map(str::to_string),
            "business_unit" => Some(c.business_unit.to_string()),
            "search_term" => c.search_term.clone(),
            "menu_page" => Some(c.menu_page.to_string()),
            other => c.context.get(other).map(render_value),
        }
        .filter(|v| !v.is_empty())
    }
}

/// Renders `template` against `scope`.
pub fn render_template(template: &str, scope: &TemplateScope<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            // Unclosed placeholder: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after_open[..end];
        let (key, fallback) = match expr.split_once('|') {
            Some((key, fallback)) => (key.trim(), Some(fallback.trim())),
            None => (expr.trim(), None),
        };

        match scope.resolve(key) {
            Some(value) => out.push_str(&value),
            None => out.push_str(fallback.unwrap_or_default()),
        }

        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{BusinessUnitId, ConversationKey, PersonId};

    fn conversation() -> ConversationState {
        let mut c = ConversationState::new(ConversationKey::new(
            PersonId::new("p-1").unwrap(),
            BusinessUnitId::new("huntred").unwrap(),
        ));
        c.context.set("name", "Ana");
        c.context.set("age", 29);
        c
    }

    #[test]
    fn substitutes_context_values() {
        let c = conversation();
        let scope = TemplateScope::new(&c, None);
        assert_eq!(
            render_template("Hola {{name}}, tienes {{ age }} años", &scope),
            "Hola Ana, tienes 29 años"
        );
    }

    #[test]
    fn fallback_applies_to_missing_keys() {
        let c = conversation();
        let scope = TemplateScope::new(&c, None);
        assert_eq!(
            render_template("Bienvenido {{ city | a huntRED }}", &scope),
            "Bienvenido a huntRED"
        );
    }

    #[test]
    fn missing_key_without_fallback_renders_empty() {
        let c = conversation();
        let scope = TemplateScope::new(&c, None);
        assert_eq!(render_template("[{{city}}]", &scope), "[]");
    }

    #[test]
    fn builtins_resolve_before_context() {
        let mut c = conversation();
        c.context.set("state", "shadowed");
        c.move_to("menu");
        let scope = TemplateScope::new(&c, Some("greeting"));
        assert_eq!(
            render_template("{{business_unit}}/{{state}}/{{intent}}", &scope),
            "huntred/menu/greeting"
        );
    }

    #[test]
    fn unclosed_placeholder_is_kept_verbatim() {
        let c = conversation();
        let scope = TemplateScope::new(&c, None);
        assert_eq!(render_template("Hola {{name", &scope), "Hola {{name");
    }

    #[test]
    fn plain_text_is_untouched() {
        let c = conversation();
        let scope = TemplateScope::new(&c, None);
        assert_eq!(render_template("Sin variables.", &scope), "Sin variables.");
    }
}
