use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use funcdag::errors::Result;
use funcdag::submit::{Invocation, QueueBackend, QueueResponse};

/// First identifier handed out by a fresh [`FakeQueue`].
pub const FIRST_ID: u64 = 100;

/// A fake batch queue that:
/// - records every invocation it receives
/// - answers with increasing identifiers starting at [`FIRST_ID`]
/// - rejects (exit status 1, no identifier) jobs it was told to fail.
///
/// Clones share state, so a test can keep one handle and give another to
/// the submitter.
#[derive(Debug, Clone)]
pub struct FakeQueue {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    next_id: u64,
    failing: HashSet<String>,
    invocations: Vec<Invocation>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: FIRST_ID,
                failing: HashSet::new(),
                invocations: Vec::new(),
            })),
        }
    }

    /// Reject every submission of the job called `name`.
    pub fn failing(self, name: &str) -> Self {
        self.state.lock().unwrap().failing.insert(name.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().invocations.clone()
    }

    /// Job names in submission order.
    pub fn job_names(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|inv| flag_value(inv, "-N"))
            .collect()
    }

    /// Hold argument (`-j`) the job called `name` was submitted with.
    pub fn hold_of(&self, name: &str) -> Option<String> {
        self.find(name).and_then(|inv| flag_value(&inv, "-j"))
    }

    /// Queue (`-q`) the job called `name` was submitted to.
    pub fn queue_of(&self, name: &str) -> Option<String> {
        self.find(name).and_then(|inv| flag_value(&inv, "-q"))
    }

    pub fn find(&self, name: &str) -> Option<Invocation> {
        self.invocations()
            .into_iter()
            .find(|inv| flag_value(inv, "-N").as_deref() == Some(name))
    }
}

impl Default for FakeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueBackend for FakeQueue {
    fn submit(
        &mut self,
        invocation: Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<QueueResponse>> + Send + '_>> {
        let response = {
            let mut state = self.state.lock().unwrap();
            let name = flag_value(&invocation, "-N").unwrap_or_default();
            state.invocations.push(invocation);

            if state.failing.contains(&name) {
                QueueResponse {
                    stdout: String::new(),
                    stderr: format!("Unable to submit {name}\n"),
                    exit_code: Some(1),
                }
            } else {
                let id = state.next_id;
                state.next_id += 1;
                QueueResponse {
                    stdout: format!("{id}\n"),
                    stderr: String::new(),
                    exit_code: Some(0),
                }
            }
        };

        Box::pin(async move { Ok(response) })
    }
}

/// Value following `flag` in the invocation's arguments.
pub fn flag_value(invocation: &Invocation, flag: &str) -> Option<String> {
    invocation
        .args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| invocation.args.get(i + 1))
        .cloned()
}
