use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The question the user is composing.
///
/// Cloning yields another handle to the same buffer, so the form and the
/// dictation controller always see the same text.
#[derive(Clone, Default)]
pub struct PromptText {
    inner: Rc<RefCell<String>>,
}

impl PromptText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.inner.borrow().clone()
    }

    pub fn set(&self, text: &str) {
        *self.inner.borrow_mut() = text.to_string();
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    pub fn is_blank(&self) -> bool {
        self.inner.borrow().trim().is_empty()
    }

    /// Appends recognized speech, separating it from existing text by one space.
    pub fn append_fragment(&self, fragment: &str) {
        let mut text = self.inner.borrow_mut();
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(fragment);
    }
}

impl fmt::Debug for PromptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PromptText").field(&*self.inner.borrow()).finish()
    }
}

impl From<&str> for PromptText {
    fn from(text: &str) -> Self {
        let prompt = Self::new();
        prompt.set(text);
        prompt
    }
}
