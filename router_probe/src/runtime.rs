//! # Probe Runtime
//!
//! Drives one scenario over a freshly wired [`ExtensionWorld`] and keeps
//! a transcript of every observed step. Each line is printed as it
//! happens and collected so the run can also be written to a file.
//!
//! Expectations are checked with [`ProbeRuntime::check`]: a failed check
//! lands in the transcript and aborts the scenario with
//! [`ProbeError::Expectation`], which the binary turns into a nonzero
//! exit code.

use crate::scenario::Scenario;
use channel_types::{ChannelName, ChannelNameError};
use message_channel::{ChannelError, ChannelEvent, ListenerOutcome, Responder};
use serde_json::{json, Value};
use sim_host::ExtensionWorld;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tab_types::{HostTab, TabDescriptor, TabRegistry};
use thiserror::Error;

/// Errors that abort a probe run
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Invalid channel name: {0}")]
    Name(#[from] ChannelNameError),

    #[error("Expectation failed: {0}")]
    Expectation(String),

    #[error("Transcript error: {0}")]
    Transcript(String),
}

/// Configuration assembled from the command line
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Which exchange to drive
    pub scenario: Scenario,
    /// Include payload dumps in the transcript
    pub verbose: bool,
    /// Also write the transcript to this file
    pub transcript: Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Roundtrip,
            verbose: false,
            transcript: None,
        }
    }
}

/// Runs scenarios and records what it sees
pub struct ProbeRuntime {
    config: ProbeConfig,
    transcript: Vec<String>,
}

impl ProbeRuntime {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            transcript: Vec::new(),
        }
    }

    /// Every transcript line recorded so far, in order
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Drives the configured scenario to completion.
    ///
    /// The transcript file, when requested, is written on success and
    /// on failure alike so a failed run leaves its evidence behind.
    pub fn run(&mut self) -> Result<(), ProbeError> {
        let scenario = self.config.scenario;
        self.note(format!("scenario: {}", scenario));

        let outcome = match scenario {
            Scenario::Roundtrip => self.run_roundtrip(),
            Scenario::TabQuery => self.run_tab_query(),
            Scenario::Teardown => self.run_teardown(),
        };

        match &outcome {
            Ok(()) => self.note("result: pass"),
            Err(err) => self.note(format!("result: fail ({})", err)),
        }

        if let Some(path) = self.config.transcript.clone() {
            self.write_transcript(&path)?;
        }

        outcome
    }

    /// Host asks, page echoes, host receives the echo
    fn run_roundtrip(&mut self) -> Result<(), ProbeError> {
        let world = ExtensionWorld::new(ChannelName::new("probe-roundtrip")?);
        self.note(format!("world wired on {}", world.host().name()));

        world.page().add_listener(|value, _, responder| {
            responder
                .respond(&json!({ "echo": value.clone() }))
                .map_err(|err| err.to_string())?;
            Ok(ListenerOutcome::Done)
        });
        self.note("page: echo listener armed");

        let payload = json!({ "greeting": "ping", "sequence": 1 });
        if self.config.verbose {
            self.note(format!("host: request payload {}", payload));
        }

        let answer: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let sink = answer.clone();
        world.host().send_request(&payload, move |value| {
            *sink.borrow_mut() = Some(value);
        })?;
        self.note("host: request sent");

        let received = match answer.borrow().clone() {
            Some(value) => value,
            None => return self.check(false, "response arrived before the send returned"),
        };
        self.note("host: response received");
        if self.config.verbose {
            self.note(format!("host: response payload {}", received));
        }

        self.check(
            received == json!({ "echo": payload }),
            "page echoed the exact payload",
        )?;
        self.check(
            world.host().pending_response_count() == 0,
            "no pending responses remain on the host",
        )?;
        Ok(())
    }

    /// Page asks for the tab list, host serves it typed via `tab_types`
    fn run_tab_query(&mut self) -> Result<(), ProbeError> {
        let world = ExtensionWorld::new(ChannelName::new("probe-tabs")?);
        self.note(format!("world wired on {}", world.host().name()));

        let mut registry = TabRegistry::new(1);
        registry.insert(HostTab {
            id: 1,
            index: 0,
            location: "https://example.test/docs".to_string(),
            label: "Documentation".to_string(),
            active: false,
            pinned: true,
            private_browsing: false,
        });
        registry.insert(HostTab {
            id: 2,
            index: 1,
            location: "https://example.test/dashboard".to_string(),
            label: "Dashboard".to_string(),
            active: true,
            pinned: false,
            private_browsing: false,
        });
        self.note(format!(
            "host: registry holds {} tabs in window 1",
            registry.len()
        ));

        world.host().add_listener(move |_, _, responder| {
            responder
                .respond(&registry.descriptors())
                .map_err(|err| err.to_string())?;
            Ok(ListenerOutcome::Done)
        });
        self.note("host: tab-query listener armed");

        let answer: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let sink = answer.clone();
        world
            .page()
            .send_request(&json!({ "query": "tabs" }), move |value| {
                *sink.borrow_mut() = Some(value);
            })?;
        self.note("page: tab query sent");

        let received = match answer.borrow().clone() {
            Some(value) => value,
            None => return self.check(false, "tab list arrived before the send returned"),
        };
        let tabs: Vec<TabDescriptor> = serde_json::from_value(received)
            .map_err(|err| ProbeError::Expectation(format!("tab list failed to decode: {}", err)))?;
        for tab in &tabs {
            self.note(format!("page: tab {} \"{}\" at {}", tab.id, tab.title, tab.url));
        }

        self.check(tabs.len() == 2, "both tabs crossed the channel")?;
        self.check(
            tabs[0].index == 0 && tabs[1].index == 1,
            "tab list is ordered by index",
        )?;
        self.check(
            tabs.iter().all(|tab| tab.highlighted == tab.active),
            "highlight mirrors the active flag",
        )?;
        self.check(
            tabs.iter().all(|tab| tab.window_id == 1),
            "every tab reports window 1",
        )?;
        Ok(())
    }

    /// Host dies with a reply in flight; the late reply must vanish
    fn run_teardown(&mut self) -> Result<(), ProbeError> {
        let world = ExtensionWorld::new(ChannelName::new("probe-teardown")?);
        self.note(format!("world wired on {}", world.host().name()));

        let stashed: Rc<RefCell<Option<Responder>>> = Rc::new(RefCell::new(None));
        let stash = stashed.clone();
        world.page().add_listener(move |_, _, responder| {
            *stash.borrow_mut() = Some(responder.clone());
            Ok(ListenerOutcome::WillRespond)
        });
        self.note("page: deferring listener armed");

        let fired = Rc::new(RefCell::new(false));
        let sink = fired.clone();
        world
            .host()
            .send_request(&json!({ "query": "state" }), move |_| {
                *sink.borrow_mut() = true;
            })?;
        self.note("host: request sent, reply deferred");
        self.check(!*fired.borrow(), "no response before the page answers")?;

        world.host().destroy();
        self.note("host: destroyed with one reply in flight");

        let responder = match stashed.borrow().clone() {
            Some(responder) => responder,
            None => return self.check(false, "page captured the reply handle"),
        };
        responder.respond(&json!({ "state": "too late" }))?;
        self.note("page: late reply sent");

        self.check(
            !*fired.borrow(),
            "late reply never reached the dead host's callback",
        )?;
        let drops = world
            .host()
            .diagnostics()
            .count_events(|event| matches!(event, ChannelEvent::DroppedAfterTeardown));
        self.note(format!(
            "host diagnostics: {} frame(s) dropped after teardown",
            drops
        ));
        self.check(drops == 1, "the drop is visible in diagnostics")?;
        Ok(())
    }

    /// Records one step, printing it as it happens
    fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        println!("{}", line);
        self.transcript.push(line);
    }

    /// Records a verdict; a failed check aborts the scenario
    fn check(&mut self, passed: bool, what: &str) -> Result<(), ProbeError> {
        if passed {
            self.note(format!("check ok: {}", what));
            Ok(())
        } else {
            self.note(format!("check failed: {}", what));
            Err(ProbeError::Expectation(what.to_string()))
        }
    }

    fn write_transcript(&self, path: &Path) -> Result<(), ProbeError> {
        let mut text = self.transcript.join("\n");
        text.push('\n');
        fs::write(path, text).map_err(|err| ProbeError::Transcript(err.to_string()))
    }
}
