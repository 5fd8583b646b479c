//! Error reporter that keeps what it receives.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::{ErrorDetails, ErrorReporter};

/// Collects reported failures; clones share the same list.
#[derive(Clone, Default)]
pub struct CollectingReporter {
    reports: Rc<RefCell<Vec<ErrorDetails>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorDetails> {
        self.reports.borrow().clone()
    }

    pub fn take(&self) -> Vec<ErrorDetails> {
        self.reports.take()
    }

    /// Rendered error messages, without context.
    pub fn messages(&self) -> Vec<String> {
        self.reports
            .borrow()
            .iter()
            .map(|details| details.error.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, details: &ErrorDetails) {
        log::debug!("collected {details}");
        self.reports.borrow_mut().push(details.clone());
    }
}
