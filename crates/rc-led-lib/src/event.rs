//! Event source boundary — how decoded telemetry reaches the controller.
//!
//! A transport implements [`EventSource`]: the controller subscribes one
//! [`SignalSink`] per [`SignalKind`], then asks the source to start
//! delivering. [`LineEventSource`] is a transport reading one textual event
//! per line (`drive_mode user`, `throttle=-0.4`, ...).

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, ErrorKind};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;

use crate::signal::{DriveMode, SpeedZone};

/// The four independent input signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    DriveMode,
    SpeedZone,
    Throttle,
    Record,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::DriveMode,
        SignalKind::SpeedZone,
        SignalKind::Throttle,
        SignalKind::Record,
    ];

    /// Key used in the textual event format.
    pub fn key(&self) -> &'static str {
        match self {
            SignalKind::DriveMode => "drive_mode",
            SignalKind::SpeedZone => "speed_zone",
            SignalKind::Throttle => "throttle",
            SignalKind::Record => "record",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        SignalKind::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    DriveMode(DriveMode),
    SpeedZone(SpeedZone),
    Throttle(f32),
    Record(bool),
}

impl Event {
    pub fn kind(&self) -> SignalKind {
        match self {
            Event::DriveMode(_) => SignalKind::DriveMode,
            Event::SpeedZone(_) => SignalKind::SpeedZone,
            Event::Throttle(_) => SignalKind::Throttle,
            Event::Record(_) => SignalKind::Record,
        }
    }

    /// Hand the event to the matching sink method.
    pub fn dispatch(self, sink: &dyn SignalSink) {
        match self {
            Event::DriveMode(m) => sink.on_drive_mode(m),
            Event::SpeedZone(z) => sink.on_speed_zone(z),
            Event::Throttle(t) => sink.on_throttle(t),
            Event::Record(r) => sink.on_record(r),
        }
    }
}

/// Receiver of decoded signals, one method per signal.
pub trait SignalSink: Send + Sync {
    fn on_drive_mode(&self, mode: DriveMode);
    fn on_speed_zone(&self, zone: SpeedZone);
    fn on_throttle(&self, throttle: f32);
    fn on_record(&self, enabled: bool);
}

/// A transport delivering events to subscribed sinks.
pub trait EventSource {
    /// Register `sink` for `kind`. Replaces an earlier registration.
    fn subscribe(
        &mut self,
        kind: SignalKind,
        sink: Arc<dyn SignalSink>,
    ) -> Result<(), RegistrationError>;

    /// Begin delivery once every subscription is in place.
    fn connect(&mut self) -> Result<(), RegistrationError> {
        Ok(())
    }

    /// Drop every subscription. Events received afterwards are discarded.
    fn unsubscribe_all(&mut self);
}

// ── Errors ──

/// Failure to subscribe a handler for an input signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationError {
    pub kind: Option<SignalKind>,
    pub reason: String,
}

impl RegistrationError {
    pub fn new(kind: SignalKind, reason: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            reason: reason.into(),
        }
    }

    /// Failure not tied to a single signal (e.g. connecting the source).
    pub fn connect(reason: impl Into<String>) -> Self {
        Self {
            kind: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "Unable to register handler for {kind}: {}", self.reason),
            None => write!(f, "Unable to start event source: {}", self.reason),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// A malformed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Line has no `<signal> <value>` pair.
    Malformed(String),
    /// Signal name is not one of the known signals.
    UnknownSignal(String),
    /// Value cannot be parsed for this signal.
    InvalidValue { kind: SignalKind, value: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(line) => write!(f, "Malformed event: {line:?}"),
            DecodeError::UnknownSignal(name) => write!(f, "Unknown signal: {name}"),
            DecodeError::InvalidValue { kind, value } => {
                write!(f, "Invalid {kind} value: {value:?}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

// ── Decoding ──

/// Decode one line of the textual event format.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn decode_line(line: &str) -> Result<Option<Event>, DecodeError> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (key, value) = line
        .split_once('=')
        .or_else(|| line.split_once(char::is_whitespace))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .ok_or_else(|| DecodeError::Malformed(line.to_string()))?;

    let kind =
        SignalKind::from_key(key).ok_or_else(|| DecodeError::UnknownSignal(key.to_string()))?;
    let invalid = || DecodeError::InvalidValue {
        kind,
        value: value.to_string(),
    };

    let event = match kind {
        SignalKind::DriveMode => Event::DriveMode(value.parse().map_err(|_| invalid())?),
        SignalKind::SpeedZone => Event::SpeedZone(value.parse().map_err(|_| invalid())?),
        SignalKind::Throttle => {
            let t: f32 = value.parse().map_err(|_| invalid())?;
            if !t.is_finite() {
                return Err(invalid());
            }
            Event::Throttle(t)
        }
        SignalKind::Record => Event::Record(parse_bool(value).ok_or_else(invalid)?),
    };
    Ok(Some(event))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ── Line source ──

type Subscriptions = Arc<RwLock<HashMap<SignalKind, Arc<dyn SignalSink>>>>;

/// Event source reading one textual event per line from a reader.
///
/// Delivery runs on a background thread started by [`EventSource::connect`].
pub struct LineEventSource<R> {
    reader: Option<R>,
    sinks: Subscriptions,
    on_eof: Option<Box<dyn FnOnce() + Send>>,
    reader_thread: Option<JoinHandle<()>>,
}

impl<R: BufRead + Send + 'static> LineEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            sinks: Arc::new(RwLock::new(HashMap::new())),
            on_eof: None,
            reader_thread: None,
        }
    }

    /// Run `f` once the reader is exhausted (or fails).
    pub fn on_eof(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_eof = Some(Box::new(f));
        self
    }

    /// Wait for the reader thread to finish.
    pub fn join(&mut self) {
        if let Some(handle) = self.reader_thread.take()
            && handle.join().is_err()
        {
            log::warn!("event reader thread panicked");
        }
    }
}

impl<R: BufRead + Send + 'static> EventSource for LineEventSource<R> {
    fn subscribe(
        &mut self,
        kind: SignalKind,
        sink: Arc<dyn SignalSink>,
    ) -> Result<(), RegistrationError> {
        log::info!("register handler for {kind}");
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, sink);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), RegistrationError> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| RegistrationError::connect("already connected"))?;
        let sinks = Arc::clone(&self.sinks);
        let on_eof = self.on_eof.take();
        let handle = std::thread::Builder::new()
            .name("events".into())
            .spawn(move || {
                read_events(reader, &sinks);
                if let Some(f) = on_eof {
                    f();
                }
            })
            .map_err(|e| RegistrationError::connect(format!("spawn reader: {e}")))?;
        self.reader_thread = Some(handle);
        Ok(())
    }

    fn unsubscribe_all(&mut self) {
        log::info!("unsubscribe all handlers");
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn read_events(mut reader: impl BufRead, sinks: &Subscriptions) {
    let mut raw = Vec::new();
    let mut n = 0;
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => n += 1,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("event stream read failed: {e}");
                break;
            }
        }
        let event = match decode_raw(&raw) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("line {n}: {e}, dropped");
                continue;
            }
        };
        let sink = sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .cloned();
        match sink {
            Some(sink) => event.dispatch(sink.as_ref()),
            None => log::debug!("no handler for {}, dropped", event.kind()),
        }
    }
    log::info!("event stream closed");
}

/// Decode one raw line; bytes that are not UTF-8 are malformed.
fn decode_raw(raw: &[u8]) -> Result<Option<Event>, DecodeError> {
    match std::str::from_utf8(raw) {
        Ok(line) => decode_line(line),
        Err(_) => Err(DecodeError::Malformed(
            String::from_utf8_lossy(raw).trim_end().to_string(),
        )),
    }
}

/// In-memory event source for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;

    /// Records subscriptions; [`MockEventSource::emit`] delivers synchronously.
    #[derive(Default)]
    pub struct MockEventSource {
        pub sinks: HashMap<SignalKind, Arc<dyn SignalSink>>,
        /// Subscribing this kind fails.
        pub fail_on: Option<SignalKind>,
        pub connected: bool,
        pub unsubscribed: bool,
    }

    impl MockEventSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(kind: SignalKind) -> Self {
            Self {
                fail_on: Some(kind),
                ..Self::default()
            }
        }

        /// Deliver `event` to its subscriber. Returns `false` if none.
        pub fn emit(&self, event: Event) -> bool {
            match self.sinks.get(&event.kind()) {
                Some(sink) => {
                    event.dispatch(sink.as_ref());
                    true
                }
                None => false,
            }
        }
    }

    impl EventSource for MockEventSource {
        fn subscribe(
            &mut self,
            kind: SignalKind,
            sink: Arc<dyn SignalSink>,
        ) -> Result<(), RegistrationError> {
            if self.fail_on == Some(kind) {
                return Err(RegistrationError::new(kind, "mock: subscription refused"));
            }
            self.sinks.insert(kind, sink);
            Ok(())
        }

        fn connect(&mut self) -> Result<(), RegistrationError> {
            self.connected = true;
            Ok(())
        }

        fn unsubscribe_all(&mut self) {
            self.sinks.clear();
            self.unsubscribed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SignalSink for Recorder {
        fn on_drive_mode(&self, mode: DriveMode) {
            self.events.lock().unwrap().push(Event::DriveMode(mode));
        }
        fn on_speed_zone(&self, zone: SpeedZone) {
            self.events.lock().unwrap().push(Event::SpeedZone(zone));
        }
        fn on_throttle(&self, throttle: f32) {
            self.events.lock().unwrap().push(Event::Throttle(throttle));
        }
        fn on_record(&self, enabled: bool) {
            self.events.lock().unwrap().push(Event::Record(enabled));
        }
    }

    // ── decode_line ──

    #[test]
    fn decode_space_and_equals_forms() {
        assert_eq!(
            decode_line("drive_mode user").unwrap(),
            Some(Event::DriveMode(DriveMode::User))
        );
        assert_eq!(
            decode_line("speed_zone=fast").unwrap(),
            Some(Event::SpeedZone(SpeedZone::Fast))
        );
        assert_eq!(
            decode_line("  throttle = -0.4 ").unwrap(),
            Some(Event::Throttle(-0.4))
        );
        assert_eq!(decode_line("record on").unwrap(), Some(Event::Record(true)));
        assert_eq!(decode_line("record=0").unwrap(), Some(Event::Record(false)));
    }

    #[test]
    fn decode_accepts_dashed_keys() {
        assert_eq!(
            decode_line("drive-mode pilot").unwrap(),
            Some(Event::DriveMode(DriveMode::Pilot))
        );
    }

    #[test]
    fn decode_skips_blank_and_comments() {
        assert_eq!(decode_line("").unwrap(), None);
        assert_eq!(decode_line("   ").unwrap(), None);
        assert_eq!(decode_line("# scenario start").unwrap(), None);
        assert_eq!(
            decode_line("record true # start recording").unwrap(),
            Some(Event::Record(true))
        );
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(decode_line("throttle"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_line("=1"), Err(DecodeError::Malformed(_))));
        assert!(matches!(
            decode_line("steering 0.2"),
            Err(DecodeError::UnknownSignal(_))
        ));
        assert_eq!(
            decode_line("throttle fast"),
            Err(DecodeError::InvalidValue {
                kind: SignalKind::Throttle,
                value: "fast".into()
            })
        );
        assert!(decode_line("throttle NaN").is_err());
        assert!(decode_line("record maybe").is_err());
        assert!(decode_line("drive_mode robot").is_err());
    }

    #[test]
    fn decode_error_display() {
        let e = DecodeError::InvalidValue {
            kind: SignalKind::Record,
            value: "maybe".into(),
        };
        assert_eq!(e.to_string(), "Invalid record value: \"maybe\"");
    }

    #[test]
    fn event_kind_matches_variant() {
        assert_eq!(Event::Throttle(0.1).kind(), SignalKind::Throttle);
        assert_eq!(Event::Record(true).kind(), SignalKind::Record);
    }

    // ── LineEventSource ──

    #[test]
    fn line_source_dispatches_to_subscribers() {
        let input = "drive_mode user\nbogus line here\nthrottle -0.6\n\nrecord true\n";
        let mut source = LineEventSource::new(Cursor::new(input));
        let recorder = Arc::new(Recorder::default());
        for kind in SignalKind::ALL {
            source.subscribe(kind, recorder.clone()).unwrap();
        }
        source.connect().unwrap();
        source.join();

        assert_eq!(
            recorder.events(),
            vec![
                Event::DriveMode(DriveMode::User),
                Event::Throttle(-0.6),
                Event::Record(true),
            ]
        );
    }

    #[test]
    fn line_source_skips_non_utf8_line() {
        let mut input = b"drive_mode user\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"drive_mode pilot\n");
        let mut source = LineEventSource::new(Cursor::new(input));
        let recorder = Arc::new(Recorder::default());
        source.subscribe(SignalKind::DriveMode, recorder.clone()).unwrap();
        source.connect().unwrap();
        source.join();

        assert_eq!(
            recorder.events(),
            vec![
                Event::DriveMode(DriveMode::User),
                Event::DriveMode(DriveMode::Pilot),
            ]
        );
    }

    #[test]
    fn decode_raw_rejects_invalid_utf8() {
        assert!(matches!(
            decode_raw(&[0xff, 0xfe, b'\n']),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(
            decode_raw(b"record off\r\n").unwrap(),
            Some(Event::Record(false))
        );
    }

    #[test]
    fn line_source_drops_unsubscribed_kinds() {
        let input = "speed_zone slow\nrecord true\n";
        let mut source = LineEventSource::new(Cursor::new(input));
        let recorder = Arc::new(Recorder::default());
        source.subscribe(SignalKind::Record, recorder.clone()).unwrap();
        source.connect().unwrap();
        source.join();
        assert_eq!(recorder.events(), vec![Event::Record(true)]);
    }

    #[test]
    fn line_source_runs_eof_callback() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut source = LineEventSource::new(Cursor::new("")).on_eof(move || {
            tx.send(()).unwrap();
        });
        source.connect().unwrap();
        rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();
        source.join();
    }

    #[test]
    fn line_source_connect_twice_fails() {
        let mut source = LineEventSource::new(Cursor::new(""));
        source.connect().unwrap();
        let err = source.connect().unwrap_err();
        assert!(err.to_string().contains("already connected"));
        source.join();
    }

    #[test]
    fn mock_source_failure() {
        let mut source = mock::MockEventSource::failing_on(SignalKind::SpeedZone);
        let recorder: Arc<dyn SignalSink> = Arc::new(Recorder::default());
        assert!(source.subscribe(SignalKind::DriveMode, recorder.clone()).is_ok());
        let err = source
            .subscribe(SignalKind::SpeedZone, recorder)
            .unwrap_err();
        assert_eq!(err.kind, Some(SignalKind::SpeedZone));
    }
}
