/*!
    Append-only diagnostic log and the process-wide recipient slot.

    FFmpeg reports through one global logger, so its messages and those of
    the capability crates are routed to a single active [`DiagnosticLog`].
    The slot holds a weak reference: registering a log never keeps it alive,
    and the most recent registration wins.

    The first registration replaces FFmpeg's stderr logger with
    [`forward_ffmpeg_log`]. Text at or above FFmpeg's log level is appended
    to the active log as it arrives, and each complete line is also emitted
    as a `tracing` event with target `ffmpeg`.
*/

use std::ffi::CStr;
use std::fmt::{self, Write as _};
use std::os::raw::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Once, Weak};

use ffmpeg_next::ffi;
use parking_lot::{Mutex, const_mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/**
    Shared, append-only text log.

    Clones refer to the same buffer.
*/
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    inner: Arc<Mutex<String>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Append one entry. A trailing newline is added when missing.
    */
    pub fn log(&self, text: &str) {
        let mut buf = self.inner.lock();
        buf.push_str(text);
        if !text.ends_with('\n') {
            buf.push('\n');
        }
    }

    /**
        Append text as is, without adding a line break.
    */
    pub fn append(&self, text: &str) {
        self.inner.lock().push_str(text);
    }

    /**
        Everything logged so far.
    */
    pub fn text(&self) -> String {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Whether both handles share one buffer.
    pub fn same_as(&self, other: &DiagnosticLog) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

static ACTIVE: Mutex<Option<Weak<Mutex<String>>>> = const_mutex(None);

/**
    Make `log` the active recipient, displacing any previous one.
*/
pub fn register(log: &DiagnosticLog) {
    install_ffmpeg_callback();
    *ACTIVE.lock() = Some(Arc::downgrade(&log.inner));
}

/**
    Clear the slot if `log` is still the active recipient.
*/
pub fn deregister(log: &DiagnosticLog) {
    let mut active = ACTIVE.lock();
    if active
        .as_ref()
        .is_some_and(|weak| weak.as_ptr() == Arc::as_ptr(&log.inner))
    {
        *active = None;
    }
}

/**
    The active recipient, if one is registered and still alive.
*/
pub fn active() -> Option<DiagnosticLog> {
    ACTIVE
        .lock()
        .as_ref()
        .and_then(Weak::upgrade)
        .map(|inner| DiagnosticLog { inner })
}

// FFmpeg passes `va_list` as a pointer to the first tag on x86-64 System V
#[cfg(all(target_arch = "x86_64", not(windows)))]
type VaList = *mut ffi::__va_list_tag;
#[cfg(not(all(target_arch = "x86_64", not(windows))))]
type VaList = ffi::va_list;

const LINE_SIZE: usize = 1024;

/// Whether the next fragment starts a line, shared with FFmpeg's formatter.
static PRINT_PREFIX: AtomicI32 = AtomicI32::new(1);
static PENDING_LINE: Mutex<String> = const_mutex(String::new());
static INSTALL: Once = Once::new();

/**
    Route FFmpeg's logger through [`forward_ffmpeg_log`]. Idempotent.
*/
pub fn install_ffmpeg_callback() {
    INSTALL.call_once(|| unsafe {
        ffi::av_log_set_callback(Some(forward_ffmpeg_log));
    });
}

/**
    Log callback handed to FFmpeg.
*/
pub unsafe extern "C" fn forward_ffmpeg_log(
    avcl: *mut c_void,
    level: c_int,
    fmt: *const c_char,
    args: VaList,
) {
    if level > unsafe { ffi::av_log_get_level() } {
        return;
    }

    let mut line = [0 as c_char; LINE_SIZE];
    let mut print_prefix = PRINT_PREFIX.load(Ordering::Relaxed);
    unsafe {
        ffi::av_log_format_line2(
            avcl,
            level,
            fmt,
            args,
            line.as_mut_ptr(),
            LINE_SIZE as c_int,
            &mut print_prefix,
        );
    }
    PRINT_PREFIX.store(print_prefix, Ordering::Relaxed);

    let text = unsafe { CStr::from_ptr(line.as_ptr()) }.to_string_lossy();
    if text.is_empty() {
        return;
    }
    if let Some(log) = active() {
        log.append(&text);
    }
    emit_lines(level, &text);
}

/**
    Emit every line completed by `fragment` as a tracing event.
*/
fn emit_lines(level: c_int, fragment: &str) {
    let mut pending = PENDING_LINE.lock();
    pending.push_str(fragment);
    while let Some(end) = pending.find('\n') {
        let line: String = pending.drain(..=end).collect();
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match level {
            l if l <= ffi::AV_LOG_ERROR => tracing::error!(target: "ffmpeg", "{}", line),
            l if l <= ffi::AV_LOG_WARNING => tracing::warn!(target: "ffmpeg", "{}", line),
            l if l <= ffi::AV_LOG_INFO => tracing::info!(target: "ffmpeg", "{}", line),
            l if l <= ffi::AV_LOG_VERBOSE => tracing::debug!(target: "ffmpeg", "{}", line),
            _ => tracing::trace!(target: "ffmpeg", "{}", line),
        }
    }
}

/**
    Forwards events from the `ffmpeg_*` crates to the active log.

    Install it next to the formatting layer:

    ```ignore
    tracing_subscriber::registry()
        .with(EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .with(DiagnosticLayer)
        .init();
    ```
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct DiagnosticLayer;

impl<S: Subscriber> Layer<S> for DiagnosticLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("ffmpeg_") {
            return;
        }
        let Some(log) = active() else {
            return;
        };

        let mut visitor = EventText::default();
        event.record(&mut visitor);
        log.log(&visitor.finish());
    }
}

#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
}

impl EventText {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Serializes tests that touch the process-wide slot.
#[cfg(test)]
pub(crate) fn slot_guard() -> parking_lot::MutexGuard<'static, ()> {
    static GUARD: Mutex<()> = const_mutex(());
    GUARD.lock()
}
