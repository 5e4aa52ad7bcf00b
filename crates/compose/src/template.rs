//! Page templates with `{placeholder}` tokens

use pokeshop_errors::{Error, TemplateError};
use std::collections::BTreeMap;
use std::path::Path;

/// HTML source of a page before composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Read a template from disk
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` if the file cannot be read.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| TemplateError::NotFound {
                path: path.display().to_string(),
            })?;
        Ok(Self { source })
    }

    #[must_use]
    pub fn from_string(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace every `{key}` with its value
    ///
    /// The source is scanned once from left to right, so inserted values
    /// are never substituted again. Tokens without a value stay in place.
    #[must_use]
    pub fn substitute(&self, context: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after
                .find('}')
                .and_then(|close| Some((close, context.get(&after[..close])?)));
            match value {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_substitute() {
        let template = Template::from_string(
            r#"<front-end-fragment url="http://localhost:3000/catalog/page/{currentPageNumber}"></front-end-fragment><p>{currentPageNumber} {unknown}</p>"#,
        );
        let mut context = BTreeMap::new();
        context.insert("currentPageNumber".to_string(), "2".to_string());

        assert_eq!(
            template.substitute(&context),
            r#"<front-end-fragment url="http://localhost:3000/catalog/page/2"></front-end-fragment><p>2 {unknown}</p>"#
        );
    }

    #[test]
    fn test_inserted_values_are_not_substituted_again() {
        let template = Template::from_string("<p>{a}</p><p>{b}</p>");
        let mut context = BTreeMap::new();
        context.insert("a".to_string(), "{b}".to_string());
        context.insert("b".to_string(), "<em>x</em>".to_string());

        assert_eq!(
            template.substitute(&context),
            "<p>{b}</p><p><em>x</em></p>"
        );
    }

    #[test]
    fn test_braces_around_tokens() {
        let template = Template::from_string("{{n}} {n {}");
        let mut context = BTreeMap::new();
        context.insert("n".to_string(), "1".to_string());

        assert_eq!(template.substitute(&context), "{1} {n {}");
    }

    #[test]
    fn test_substitute_without_context() {
        let template = Template::from_string("<p>{a}</p>");
        assert_eq!(template.substitute(&BTreeMap::new()), "<p>{a}</p>");
    }

    #[tokio::test]
    async fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<h1>Welcome to Pokémon Shop</h1>").unwrap();

        let template = Template::load(file.path()).await.unwrap();
        assert_eq!(template.source(), "<h1>Welcome to Pokémon Shop</h1>");

        let missing = Template::load(Path::new("/nonexistent/index.html")).await;
        assert!(matches!(
            missing,
            Err(Error::Template(TemplateError::NotFound { .. }))
        ));
    }
}
