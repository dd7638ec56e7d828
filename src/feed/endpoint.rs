//! Stream endpoint resolution

use super::Symbol;

/// Maps a symbol to the URL of its stream
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, symbol: &Symbol) -> String;
}

/// URL template with a `{symbol}` placeholder, filled with the lowercased symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    template: String,
}

impl EndpointTemplate {
    pub const PLACEHOLDER: &'static str = "{symbol}";

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl EndpointResolver for EndpointTemplate {
    fn resolve(&self, symbol: &Symbol) -> String {
        self.template.replace(Self::PLACEHOLDER, &symbol.to_lowercase())
    }
}

impl<F> EndpointResolver for F
where
    F: Fn(&Symbol) -> String + Send + Sync,
{
    fn resolve(&self, symbol: &Symbol) -> String {
        self(symbol)
    }
}
