//! Navigation and view switching utilities.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Chat,
    Analysis,
    Settings,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Chat => "Chat",
            View::Analysis => "Analysis",
            View::Settings => "Settings",
        }
    }

    pub fn all() -> &'static [View] {
        &[View::Chat, View::Analysis, View::Settings]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
