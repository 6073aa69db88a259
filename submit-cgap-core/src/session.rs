use crate::config::PollConfig;
use crate::contract::{CloudCopier, Console, Portal};

/// One command's worth of collaborators, bound to a resolved server.
pub struct Session<P, C, A> {
    pub server: String,
    pub portal: P,
    pub console: C,
    pub copier: A,
    pub poll: PollConfig,
    /// Answer yes to every question without asking.
    pub no_query: bool,
}

impl<P, C, A> Session<P, C, A>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    pub fn new(server: impl Into<String>, portal: P, console: C, copier: A) -> Self {
        Session {
            server: server.into(),
            portal,
            console,
            copier,
            poll: PollConfig::default(),
            no_query: false,
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_no_query(mut self, no_query: bool) -> Self {
        self.no_query = no_query;
        self
    }

    /// Ask the user, unless queries are switched off.
    pub fn confirm(&self, question: &str) -> bool {
        self.no_query || self.console.yes_or_no(question)
    }
}
