//! Modal visibility.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modal {
    ArticlePreview,
    ImageRegenerate,
    BindAccount,
}

#[derive(Debug, Default)]
pub struct ModalManager {
    open: BTreeSet<Modal>,
}

impl ModalManager {
    pub fn open(&mut self, modal: Modal) {
        self.open.insert(modal);
    }

    pub fn close(&mut self, modal: Modal) {
        self.open.remove(&modal);
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        self.open.contains(&modal)
    }
}
