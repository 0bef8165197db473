/// Alias of the root entity in rendered queries.
pub const DEFAULT_ALIAS: &str = "obj";

/// Turns a property id into the path used in the rendered query.
pub trait PropertyIdPreprocessor {
    fn process(&self, property_id: &str) -> String;
}

impl<F> PropertyIdPreprocessor for F
where
    F: Fn(&str) -> String,
{
    fn process(&self, property_id: &str) -> String {
        self(property_id)
    }
}

/// Prefixes every property id with an alias: `name` → `obj.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPrefix {
    alias: String,
}

impl AliasPrefix {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl Default for AliasPrefix {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS)
    }
}

impl PropertyIdPreprocessor for AliasPrefix {
    fn process(&self, property_id: &str) -> String {
        if self.alias.is_empty() {
            property_id.to_string()
        } else {
            format!("{}.{}", self.alias, property_id)
        }
    }
}

/// Leaves property ids untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbatim;

impl PropertyIdPreprocessor for Verbatim {
    fn process(&self, property_id: &str) -> String {
        property_id.to_string()
    }
}

/// Used by joins; ignores the outer preprocessor entirely.
pub(crate) struct JoinPrefix<'a>(pub(crate) &'a str);

impl PropertyIdPreprocessor for JoinPrefix<'_> {
    fn process(&self, property_id: &str) -> String {
        format!("{}.{}", self.0, property_id)
    }
}
