//=========================================================================
// Transition Queue
//=========================================================================
//
// Queue of state transitions requested from inside hooks.
//
// States cannot reach the manager while it holds them, so they queue
// requests here. The manager drains the queue in FIFO order from
// `process_transitions`, usually once per frame.
//
//=========================================================================

//=== State Transition ====================================================

/// A registry operation requested by a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTransition {
    /// Make the named state current.
    Change(String),

    /// Unload and load the named state again.
    ///
    /// Applied with `force`, so the current state may reload itself.
    Reload(String),

    /// Unload the named state. Fails if it is current.
    Unload(String),
}

//=== Transition Queue ====================================================

/// FIFO queue of requested state transitions.
#[derive(Debug, Default)]
pub struct TransitionQueue {
    queue: Vec<StateTransition>,
}

impl TransitionQueue {
    /// Creates a new empty transition queue.
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Creates an empty queue with room for `capacity` requests.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Vec::with_capacity(capacity),
        }
    }

    /// Queues a transition for the next `process_transitions` call.
    pub fn push(&mut self, transition: StateTransition) {
        self.queue.push(transition);
    }

    /// Returns an iterator over the queued transitions.
    pub fn iter(&self) -> impl Iterator<Item = &StateTransition> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops every queued transition.
    pub fn clear(&mut self) {
        self.queue.clear()
    }

    /// Takes all transitions from the queue, leaving it empty.
    ///
    /// Requests pushed while the taken batch is applied land in the
    /// now-empty queue and form the next batch.
    pub fn take(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.queue)
    }
}

//=== Tests ===============================================================
