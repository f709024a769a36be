use serde::{Deserialize, Serialize};

/// One catalog entry describing a document to acquire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    /// Landing page for the document (the catalog's `Main Link:`)
    pub main_link: Option<String>,
    /// Direct link to the document body (the catalog's `[PDF]:`)
    pub pdf_link: Option<String>,
}

impl Reference {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            main_link: None,
            pdf_link: None,
        }
    }

    pub fn with_main_link(mut self, link: impl Into<String>) -> Self {
        self.main_link = Some(link.into());
        self
    }

    pub fn with_pdf_link(mut self, link: impl Into<String>) -> Self {
        self.pdf_link = Some(link.into());
        self
    }

    /// Title used for naming and status lines; untitled records fall back to
    /// their position in the catalog.
    pub fn display_title(&self, index: usize) -> String {
        if self.title.trim().is_empty() {
            format!("paper_{}", index)
        } else {
            self.title.clone()
        }
    }

    pub fn has_links(&self) -> bool {
        self.main_link.is_some() || self.pdf_link.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_with_title() {
        let reference = Reference::new("Rainfall Atlas of Hawaii");
        assert_eq!(reference.display_title(3), "Rainfall Atlas of Hawaii");
    }

    #[test]
    fn test_display_title_falls_back_to_index() {
        let reference = Reference::new("  ");
        assert_eq!(reference.display_title(3), "paper_3");
    }

    #[test]
    fn test_has_links() {
        assert!(!Reference::new("A").has_links());
        assert!(Reference::new("A").with_main_link("https://x.org").has_links());
        assert!(Reference::new("A").with_pdf_link("https://x.org/a.pdf").has_links());
    }
}
