//! Element locators
//!
//! A target on a page is described by an [`ElementLocator`]: a named list of
//! strategies tried in order until one matches. Sites change their markup
//! often, so every target carries fallbacks.

use serde::{Deserialize, Serialize};

/// A single way of finding an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    XPath(String),
    /// Any button-like element whose visible text contains the value
    ButtonText(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Self::ButtonText(text.into())
    }

    /// W3C `using` / `value` pair for this locator
    pub fn to_webdriver(&self) -> (&'static str, String) {
        match self {
            Locator::Css(selector) => ("css selector", selector.clone()),
            Locator::XPath(expr) => ("xpath", expr.clone()),
            Locator::ButtonText(text) => (
                "xpath",
                format!(
                    "//*[self::button or @role='button'][contains(normalize-space(.), {})]",
                    xpath_literal(text)
                ),
            ),
        }
    }
}

/// A named target with ordered fallback strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLocator {
    pub name: String,
    pub strategies: Vec<Locator>,
}

impl ElementLocator {
    pub fn new(name: impl Into<String>, strategies: Vec<Locator>) -> Self {
        Self {
            name: name.into(),
            strategies,
        }
    }
}

/// Quotes a string for use inside an XPath expression.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }

    let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
