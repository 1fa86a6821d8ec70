use serde::{Deserialize, Serialize};

/// One converted document. Paths are workspace-relative with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub markdown: String,
    pub html: Option<String>,
    pub pdf: String,
    pub css: Vec<String>,
}

/// Ordered conversion results for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ConversionResult>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ConversionResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ConversionResult] {
        &self.entries
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_array_with_null_html() {
        let mut manifest = Manifest::new();
        manifest.push(ConversionResult {
            markdown: "docs/a.md".into(),
            html: None,
            pdf: "output/docs/a.pdf".into(),
            css: vec!["docs/a.css".into()],
        });

        let json = manifest.to_json().expect("serialize");
        assert_eq!(
            json,
            r#"[{"markdown":"docs/a.md","html":null,"pdf":"output/docs/a.pdf","css":["docs/a.css"]}]"#
        );
    }
}
