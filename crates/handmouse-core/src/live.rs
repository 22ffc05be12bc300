//! Live status view driven by periodic engine polls
//!
//! The loop runs on a single task. It waits for whichever comes first, the
//! next tick or an input event, then runs one poll and one render to
//! completion before waiting again. Input always wins over a pending tick.

use std::io;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::Client;
use crate::error::Result;
use crate::protocol::StatusReport;

pub const TITLE: &str = "Hand Mouse OS - Dashboard";
pub const HINT: &str = "Press 'q' to quit";
pub const FAREWELL: &str = "Goodbye!";

const MODE_NONE: &str = "none";
const MODE_ASL: &str = "ASL mode";
const MODE_STANDARD: &str = "standard gestures";
const CAMERA_INIT: &str = "initializing...";
const CAMERA_ACTIVE: &str = "active";
const ENGINE_STARTING: &str = "starting...";
const ENGINE_RUNNING: &str = "running";
const ENGINE_PAUSED: &str = "paused";
const NOT_AVAILABLE: &str = "n/a";
const DISCONNECTED: &str = "disconnected";
const STOPPED: &str = "stopped";

/// Snapshot rendered by the live view; owned by the loop alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub fps: u32,
    pub active_mode_label: String,
    pub camera_label: String,
    pub engine_label: String,
    pub quitting: bool,
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            fps: 0,
            active_mode_label: MODE_NONE.to_string(),
            camera_label: CAMERA_INIT.to_string(),
            engine_label: ENGINE_STARTING.to_string(),
            quitting: false,
        }
    }

    /// Fold a successful poll in. Keys the engine left out keep their
    /// previous value.
    pub fn apply_status(&mut self, report: &StatusReport) {
        if let Some(fps) = report.fps_whole() {
            self.fps = fps;
        }
        if let Some(asl) = report.asl_enabled {
            self.active_mode_label = if asl { MODE_ASL } else { MODE_STANDARD }.to_string();
        }
        if let Some(processing) = report.is_processing {
            self.engine_label = if processing { ENGINE_RUNNING } else { ENGINE_PAUSED }.to_string();
        }
        self.camera_label = CAMERA_ACTIVE.to_string();
    }

    /// Replace every field with the unreachable-engine representation
    pub fn disconnect(&mut self) {
        self.fps = 0;
        self.active_mode_label = NOT_AVAILABLE.to_string();
        self.camera_label = DISCONNECTED.to_string();
        self.engine_label = STOPPED.to_string();
    }

    pub fn is_disconnected(&self) -> bool {
        self.camera_label == DISCONNECTED
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

/// One labelled line of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: &'static str,
    pub value: String,
}

/// Frontend-agnostic description of what to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Dashboard {
        title: &'static str,
        rows: Vec<Row>,
        hint: &'static str,
    },
    Farewell(&'static str),
}

/// Pure mapping from state to screen
pub fn render(state: &DisplayState) -> Screen {
    if state.quitting {
        return Screen::Farewell(FAREWELL);
    }

    let row = |label, value: &str| Row {
        label,
        value: value.to_string(),
    };

    Screen::Dashboard {
        title: TITLE,
        rows: vec![
            row("Camera", &state.camera_label),
            row("Engine", &state.engine_label),
            row("Mode", &state.active_mode_label),
            row("Performance", &format!("{} FPS", state.fps)),
        ],
        hint: HINT,
    }
}

/// Where polls get their data
#[allow(async_fn_in_trait)]
pub trait StatusSource {
    async fn fetch_status(&self) -> Result<StatusReport>;
}

impl StatusSource for Client {
    async fn fetch_status(&self) -> Result<StatusReport> {
        self.get_status().await
    }
}

/// Where screens get drawn
pub trait Frontend {
    fn draw(&mut self, screen: &Screen) -> io::Result<()>;
}

/// Events fed to the loop from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewInput {
    /// Leave the view
    Quit,
    /// Repaint the current state (e.g. terminal resized)
    Redraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Polling,
    Rendering,
    Quitting,
}

pub struct LiveView<S> {
    source: S,
    tick: Duration,
    state: DisplayState,
    phase: Phase,
}

impl<S: StatusSource> LiveView<S> {
    pub fn new(source: S, tick: Duration) -> Self {
        Self {
            source,
            tick,
            state: DisplayState::new(),
            phase: Phase::Starting,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run until a quit input arrives or the input channel closes.
    ///
    /// Draws the placeholder view first and the farewell view exactly once at
    /// the end. Poll failures never end the loop.
    pub async fn run<F: Frontend>(
        &mut self,
        frontend: &mut F,
        mut input: mpsc::UnboundedReceiver<ViewInput>,
    ) -> io::Result<()> {
        frontend.draw(&render(&self.state))?;

        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                event = input.recv() => match event {
                    Some(ViewInput::Redraw) => frontend.draw(&render(&self.state))?,
                    Some(ViewInput::Quit) | None => break,
                },

                _ = ticker.tick() => {
                    self.phase = Phase::Polling;
                    let outcome = self.source.fetch_status().await;

                    // cancelled while the poll was in flight: drop its result
                    if quit_pending(&mut input) {
                        break;
                    }

                    match outcome {
                        Ok(report) => self.state.apply_status(&report),
                        Err(e) => {
                            tracing::debug!("Status poll failed: {}", e);
                            self.state.disconnect();
                        }
                    }

                    self.phase = Phase::Rendering;
                    frontend.draw(&render(&self.state))?;
                }
            }
        }

        self.phase = Phase::Quitting;
        self.state.quitting = true;
        frontend.draw(&render(&self.state))
    }
}

fn quit_pending(input: &mut mpsc::UnboundedReceiver<ViewInput>) -> bool {
    loop {
        match input.try_recv() {
            Ok(ViewInput::Quit) | Err(TryRecvError::Disconnected) => return true,
            Ok(ViewInput::Redraw) => continue,
            Err(TryRecvError::Empty) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    fn healthy_report() -> StatusReport {
        StatusReport {
            is_processing: Some(true),
            asl_enabled: Some(true),
            fps: Some(30.0),
            ..Default::default()
        }
    }

    fn healthy_state() -> DisplayState {
        DisplayState {
            fps: 30,
            active_mode_label: "ASL mode".into(),
            camera_label: "active".into(),
            engine_label: "running".into(),
            quitting: false,
        }
    }

    /// Replays a fixed list of outcomes, then fails forever
    struct ScriptedSource {
        outcomes: RefCell<VecDeque<Result<StatusReport>>>,
        polls: Cell<usize>,
        on_poll: Option<mpsc::UnboundedSender<ViewInput>>,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<StatusReport>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                polls: Cell::new(0),
                on_poll: None,
            }
        }
    }

    impl StatusSource for &ScriptedSource {
        async fn fetch_status(&self) -> Result<StatusReport> {
            self.polls.set(self.polls.get() + 1);
            if let Some(tx) = &self.on_poll {
                let _ = tx.send(ViewInput::Quit);
            }
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ControlError::ConnectionClosed))
        }
    }

    /// Records every screen; asks to quit after a number of poll renders
    struct Recorder {
        screens: Vec<Screen>,
        quit_after: usize,
        quit: mpsc::UnboundedSender<ViewInput>,
    }

    impl Frontend for Recorder {
        fn draw(&mut self, screen: &Screen) -> io::Result<()> {
            self.screens.push(screen.clone());
            if self.screens.len() == self.quit_after + 1 {
                let _ = self.quit.send(ViewInput::Quit);
            }
            Ok(())
        }
    }

    fn farewells(screens: &[Screen]) -> usize {
        screens.iter().filter(|s| matches!(s, Screen::Farewell(_))).count()
    }

    #[test]
    fn test_initial_state() {
        let state = DisplayState::new();
        assert_eq!(state.fps, 0);
        assert_eq!(state.camera_label, "initializing...");
        assert_eq!(state.engine_label, "starting...");
        assert_eq!(state.active_mode_label, "none");
        assert!(!state.quitting);
    }

    #[test]
    fn test_apply_status_partial() {
        let mut state = healthy_state();
        state.apply_status(&StatusReport {
            is_processing: Some(false),
            ..Default::default()
        });

        assert_eq!(state.engine_label, "paused");
        // absent keys leave their fields alone
        assert_eq!(state.fps, 30);
        assert_eq!(state.active_mode_label, "ASL mode");
    }

    #[test]
    fn test_failure_then_success_is_fully_healthy() {
        let mut state = healthy_state();
        state.disconnect();
        assert_eq!(state.fps, 0);
        assert_eq!(state.active_mode_label, "n/a");
        assert_eq!(state.camera_label, "disconnected");
        assert_eq!(state.engine_label, "stopped");
        assert!(state.is_disconnected());

        state.apply_status(&healthy_report());
        assert_eq!(state, healthy_state());
    }

    #[test]
    fn test_render_is_pure() {
        let state = healthy_state();
        assert_eq!(render(&state), render(&state));

        match render(&state) {
            Screen::Dashboard { rows, .. } => {
                assert_eq!(rows.len(), 4);
                assert_eq!(rows[3].value, "30 FPS");
            }
            other => panic!("unexpected screen: {:?}", other),
        }

        let quitting = DisplayState {
            quitting: true,
            ..state
        };
        assert_eq!(render(&quitting), Screen::Farewell("Goodbye!"));
    }

    #[tokio::test]
    async fn test_loop_recovers_after_failed_poll() {
        let source = ScriptedSource::new(vec![
            Err(ControlError::ConnectionClosed),
            Ok(healthy_report()),
        ]);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut frontend = Recorder {
            screens: Vec::new(),
            quit_after: 2,
            quit: tx,
        };

        let mut view = LiveView::new(&source, Duration::from_millis(5));
        view.run(&mut frontend, rx).await.unwrap();

        let mut disconnected = healthy_state();
        disconnected.disconnect();

        assert_eq!(frontend.screens[0], render(&DisplayState::new()));
        assert_eq!(frontend.screens[1], render(&disconnected));
        assert_eq!(frontend.screens[2], render(&healthy_state()));
        assert_eq!(source.polls.get(), 2);
        assert_eq!(view.phase(), Phase::Quitting);
    }

    #[tokio::test]
    async fn test_quit_between_ticks_renders_farewell_once() {
        let source = ScriptedSource::new((0..5).map(|_| Ok(healthy_report())).collect());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut frontend = Recorder {
            screens: Vec::new(),
            quit_after: 3,
            quit: tx,
        };

        let mut view = LiveView::new(&source, Duration::from_millis(5));
        view.run(&mut frontend, rx).await.unwrap();

        assert_eq!(source.polls.get(), 3);
        assert_eq!(frontend.screens.len(), 5);
        assert_eq!(farewells(&frontend.screens), 1);
        assert_eq!(frontend.screens.last(), Some(&Screen::Farewell("Goodbye!")));
        assert!(view.state().quitting);
    }

    #[tokio::test]
    async fn test_quit_during_poll_discards_result() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut source = ScriptedSource::new(vec![Ok(healthy_report())]);
        source.on_poll = Some(tx.clone());
        let mut frontend = Recorder {
            screens: Vec::new(),
            quit_after: usize::MAX - 1,
            quit: tx,
        };

        let mut view = LiveView::new(&source, Duration::from_millis(5));
        view.run(&mut frontend, rx).await.unwrap();

        assert_eq!(source.polls.get(), 1);
        assert_eq!(frontend.screens.len(), 2);
        assert_eq!(farewells(&frontend.screens), 1);
        // the in-flight result never reached the state
        assert_eq!(view.state().camera_label, "initializing...");
    }

    /// Asks to quit on the first poll render, then blocks past the next tick
    struct SlowFrontend {
        screens: Vec<Screen>,
        quit: mpsc::UnboundedSender<ViewInput>,
        stall: Duration,
    }

    impl Frontend for SlowFrontend {
        fn draw(&mut self, screen: &Screen) -> io::Result<()> {
            self.screens.push(screen.clone());
            if self.screens.len() == 2 {
                let _ = self.quit.send(ViewInput::Quit);
                std::thread::sleep(self.stall);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_quit_wins_over_overdue_tick() {
        let source = ScriptedSource::new((0..5).map(|_| Ok(healthy_report())).collect());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut frontend = SlowFrontend {
            screens: Vec::new(),
            quit: tx,
            stall: Duration::from_millis(30),
        };

        let mut view = LiveView::new(&source, Duration::from_millis(1));
        view.run(&mut frontend, rx).await.unwrap();

        assert_eq!(source.polls.get(), 1);
        assert_eq!(frontend.screens.len(), 3);
        assert_eq!(frontend.screens[1], render(&healthy_state()));
        assert_eq!(farewells(&frontend.screens), 1);
        assert_eq!(frontend.screens.last(), Some(&Screen::Farewell("Goodbye!")));
    }

    #[tokio::test]
    async fn test_redraw_does_not_poll() {
        let source = ScriptedSource::new(vec![]);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ViewInput::Redraw).unwrap();
        tx.send(ViewInput::Quit).unwrap();
        let mut frontend = Recorder {
            screens: Vec::new(),
            quit_after: usize::MAX - 1,
            quit: tx,
        };

        let mut view = LiveView::new(&source, Duration::from_secs(60));
        view.run(&mut frontend, rx).await.unwrap();

        assert_eq!(source.polls.get(), 0);
        assert_eq!(frontend.screens.len(), 3);
        assert_eq!(frontend.screens[0], frontend.screens[1]);
        assert_eq!(farewells(&frontend.screens), 1);
    }

    #[tokio::test]
    async fn test_closed_input_quits() {
        let source = ScriptedSource::new(vec![]);
        let (tx, rx) = mpsc::unbounded_channel::<ViewInput>();
        drop(tx);

        let (quit, _keep) = mpsc::unbounded_channel();
        let mut frontend = Recorder {
            screens: Vec::new(),
            quit_after: usize::MAX - 1,
            quit,
        };

        let mut view = LiveView::new(&source, Duration::from_secs(60));
        view.run(&mut frontend, rx).await.unwrap();

        assert_eq!(source.polls.get(), 0);
        assert_eq!(frontend.screens.last(), Some(&Screen::Farewell("Goodbye!")));
    }
}
