//! Change notifications emitted after each commit.

/// What changed. Emitted once per commit, after the document is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// The whole document was replaced (load, close, undo, redo, jump).
    DocumentReplaced,
    WidgetsChanged,
    ElementsChanged,
    GroupsChanged,
    ConnectionsChanged,
    SelectionChanged,
    ViewportChanged,
    SettingsChanged,
    HistoryChanged,
}

/// Handle returned by `subscribe`.
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Observer registry.
#[derive(Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        self.listeners.push((self.next_id, Box::new(listener)));
        self.next_id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: ChangeEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
