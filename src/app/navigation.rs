use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything `encodeURIComponent` escapes.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Keyboard selection over the rendered result list.
///
/// Both ends of the list hand focus back to the input line: Down past the
/// last item and Up from the first item land on `Unselected`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(usize),
}

impl Selection {
    pub fn index(self) -> Option<usize> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(idx) => Some(idx),
        }
    }

    /// Any index outside `0..len` counts as no selection.
    pub fn normalize(self, len: usize) -> Self {
        match self {
            Selection::Selected(idx) if idx < len => self,
            _ => Selection::Unselected,
        }
    }

    pub fn down(self, len: usize) -> Self {
        if len == 0 {
            return Selection::Unselected;
        }
        match self.normalize(len) {
            Selection::Unselected => Selection::Selected(0),
            Selection::Selected(idx) if idx + 1 < len => Selection::Selected(idx + 1),
            Selection::Selected(_) => Selection::Unselected,
        }
    }

    pub fn up(self, len: usize) -> Self {
        match self.normalize(len) {
            Selection::Selected(idx) if idx > 0 => Selection::Selected(idx - 1),
            _ => Selection::Unselected,
        }
    }
}

/// What confirming (Enter) resolves to for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    OpenResult(String),
    WebSearch(String),
    Nothing,
}

impl Activation {
    pub fn url(&self) -> Option<&str> {
        match self {
            Activation::OpenResult(url) | Activation::WebSearch(url) => Some(url),
            Activation::Nothing => None,
        }
    }
}

pub fn web_search_url(provider: &str, query: &str) -> String {
    format!("{provider}{}", utf8_percent_encode(query, QUERY_COMPONENT))
}
