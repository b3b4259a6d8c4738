//! Builder for test notes.

/// A note to seed into a test vault.
#[derive(Debug, Clone)]
pub struct TestNote {
    title: String,
    content: String,
}

impl TestNote {
    /// Creates an empty note with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
        }
    }

    /// Sets the note body.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn get_content(&self) -> &str {
        &self.content
    }
}
