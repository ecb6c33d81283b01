//! The application singleton and its event loop.
//!
//! One [`Application`] may exist per process. It owns the platform, every
//! window, the timers and the UI task queue, and runs a blocking
//! `poll -> dispatch -> render` cycle:
//!
//! 1. run tasks posted through [`Application::proxy`]
//! 2. poll the platform, waiting no longer than the next deadline
//! 3. offer each event to the global handler, then to its window
//! 4. destroy windows whose close requested deletion
//! 5. advance tooltips and fire expired timers
//! 6. render every window that asked for a redraw
//!
//! ```no_run
//! use ultracanvas::{Application, WindowConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = Application::initialize("demo")?;
//!     app.create_window(WindowConfig::new("Hello").with_size(640, 480))?;
//!     app.run();
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ultracanvas_core::logging::{span_names, targets};
use ultracanvas_core::{
    CoreError, MonotonicClock, PerfSpan, SharedClock, TaskQueue, TaskSender, TimerId, TimerManager,
};

use crate::event::UcEvent;
use crate::id::WindowId;
use crate::platform::Platform;
use crate::window::{Window, WindowConfig, WindowError};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Called with every platform event before the owning window sees it.
/// Returning `true` consumes the event.
pub type GlobalEventHandler = Box<dyn FnMut(&UcEvent) -> bool>;

/// Timer callback. Runs on the UI thread with full access to the application.
pub type TimerCallback = Box<dyn FnMut(&mut Application)>;

/// Cross-thread handle for running closures on the UI thread.
pub type ApplicationProxy = TaskSender<Application>;

/// Application-wide settings.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub app_name: String,
    /// Longest the loop sleeps in the platform when nothing is scheduled.
    pub idle_poll_interval: Duration,
    /// Stop [`Application::run`] once the last window is gone.
    pub exit_on_last_window: bool,
}

impl ApplicationConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            idle_poll_interval: Duration::from_millis(100),
            exit_on_last_window: true,
        }
    }

    pub fn with_idle_poll_interval(mut self, interval: Duration) -> Self {
        self.idle_poll_interval = interval;
        self
    }

    pub fn with_exit_on_last_window(mut self, exit: bool) -> Self {
        self.exit_on_last_window = exit;
        self
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new("UltraCanvas")
    }
}

/// The process-wide application.
pub struct Application {
    config: ApplicationConfig,
    platform: Box<dyn Platform>,
    clock: SharedClock,
    /// Creation order; rendering and modal lookup follow it.
    windows: Vec<Window>,
    global_handler: Option<GlobalEventHandler>,
    /// Taken out while draining so tasks can borrow the application.
    tasks: Option<TaskQueue<Application>>,
    proxy: ApplicationProxy,
    timers: TimerManager,
    timer_callbacks: HashMap<TimerId, TimerCallback>,
    exit_requested: bool,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("app_name", &self.config.app_name)
            .field("platform", &self.platform.name())
            .field("windows", &self.windows.len())
            .field("timers", &self.timers.active_count())
            .field("exit_requested", &self.exit_requested)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Initialize with the default platform for this build.
    ///
    /// # Errors
    ///
    /// Fails if an application already exists or the display cannot be
    /// opened. The process stays in a state where initialization can be
    /// retried.
    pub fn initialize(app_name: impl Into<String>) -> Result<Self, CoreError> {
        let config = ApplicationConfig::new(app_name);
        let clock = MonotonicClock::shared();
        Self::claim()?;
        match default_platform(clock.clone()) {
            Ok(platform) => Ok(Self::build(config, platform, clock)),
            Err(err) => {
                INITIALIZED.store(false, Ordering::Release);
                tracing::error!(target: targets::APPLICATION, %err, "platform initialization failed");
                Err(err)
            }
        }
    }

    /// Initialize with an explicit platform and clock.
    pub fn initialize_with(
        config: ApplicationConfig,
        platform: Box<dyn Platform>,
        clock: SharedClock,
    ) -> Result<Self, CoreError> {
        Self::claim()?;
        Ok(Self::build(config, platform, clock))
    }

    /// Whether an application currently exists in this process.
    pub fn is_initialized() -> bool {
        INITIALIZED.load(Ordering::Acquire)
    }

    fn claim() -> Result<(), CoreError> {
        INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| CoreError::ApplicationAlreadyInitialized)
    }

    fn build(config: ApplicationConfig, platform: Box<dyn Platform>, clock: SharedClock) -> Self {
        let tasks = TaskQueue::new();
        let proxy = tasks.sender();
        tracing::info!(
            target: targets::APPLICATION,
            app = %config.app_name,
            platform = platform.name(),
            "application initialized"
        );
        Self {
            config,
            platform,
            clock,
            windows: Vec::new(),
            global_handler: None,
            tasks: Some(tasks),
            proxy,
            timers: TimerManager::new(),
            timer_callbacks: HashMap::new(),
            exit_requested: false,
        }
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    pub fn app_name(&self) -> &str {
        &self.config.app_name
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// A handle other threads use to run closures on the UI thread.
    pub fn proxy(&self) -> ApplicationProxy {
        self.proxy.clone()
    }

    // =========================================================================
    // Windows
    // =========================================================================

    /// Create a window. On failure no window is registered.
    pub fn create_window(&mut self, config: WindowConfig) -> Result<WindowId, WindowError> {
        let id = WindowId::next();
        let native = self
            .platform
            .create_window(id, &config)
            .map_err(|e| WindowError::NativeCreation(e.to_string()))?;
        let window = Window::create(id, config, native, self.clock.clone())?;
        self.windows.push(window);
        Ok(id)
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(Window::id).collect()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Close a window. Destruction happens at the end of the loop iteration.
    pub fn close_window(&mut self, id: WindowId) -> Result<(), CoreError> {
        let window = self.window_mut(id).ok_or(CoreError::UnknownWindow)?;
        window
            .close()
            .map_err(|e| CoreError::Platform(e.to_string()))
    }

    /// The live modal window blocking input to `id`, if any.
    pub fn blocking_modal(&self, id: WindowId) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|w| {
                w.id() != id
                    && w.config().is_modal()
                    && w.config().parent() == Some(id)
                    && w.state().is_shown()
            })
            .map(Window::id)
    }

    // =========================================================================
    // Events, timers, tasks
    // =========================================================================

    /// Install the handler that sees every event first.
    pub fn set_global_event_handler(&mut self, handler: impl FnMut(&UcEvent) -> bool + 'static) {
        self.global_handler = Some(Box::new(handler));
    }

    pub fn clear_global_event_handler(&mut self) {
        self.global_handler = None;
    }

    /// Run `callback` once after `delay`.
    pub fn start_timer(&mut self, delay: Duration, callback: impl FnMut(&mut Application) + 'static) -> TimerId {
        let id = self.timers.start_one_shot(self.clock.now(), delay);
        self.timer_callbacks.insert(id, Box::new(callback));
        id
    }

    /// Run `callback` every `interval`.
    pub fn start_repeating_timer(
        &mut self,
        interval: Duration,
        callback: impl FnMut(&mut Application) + 'static,
    ) -> Result<TimerId, CoreError> {
        let id = self.timers.start_repeating(self.clock.now(), interval)?;
        self.timer_callbacks.insert(id, Box::new(callback));
        Ok(id)
    }

    pub fn stop_timer(&mut self, id: TimerId) -> Result<(), CoreError> {
        self.timer_callbacks.remove(&id);
        self.timers.stop(id)
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.timers.is_active(id)
    }

    fn fire_timers(&mut self, now: Duration) {
        for id in self.timers.process_expired(now) {
            let Some(mut callback) = self.timer_callbacks.remove(&id) else {
                continue;
            };
            tracing::trace!(target: targets::TIMER, ?id, "timer fired");
            callback(self);
            if self.timers.is_active(id) {
                self.timer_callbacks.entry(id).or_insert(callback);
            }
        }
    }

    fn run_tasks(&mut self) -> usize {
        let Some(queue) = self.tasks.take() else {
            return 0;
        };
        let ran = queue.drain(self);
        self.tasks = Some(queue);
        ran
    }

    /// How long the next poll may block.
    fn poll_timeout(&mut self) -> Duration {
        let pending_tasks = self.tasks.as_ref().is_some_and(|q| q.pending_count() > 0);
        if pending_tasks || self.windows.iter().any(Window::needs_redraw) {
            return Duration::ZERO;
        }
        let now = self.clock.now();
        let mut timeout = self.config.idle_poll_interval;
        if let Some(next) = self.timers.time_until_next(now) {
            timeout = timeout.min(next);
        }
        for deadline in self.windows.iter().filter_map(Window::next_deadline) {
            timeout = timeout.min(deadline.saturating_sub(now));
        }
        timeout
    }

    /// Deliver one event as the loop would.
    ///
    /// Returns whether anything handled it.
    pub fn dispatch_event(&mut self, event: UcEvent) -> bool {
        if let Some(handler) = self.global_handler.as_mut()
            && handler(&event)
        {
            return true;
        }
        let Some(id) = event.window else {
            tracing::debug!(target: targets::APPLICATION, kind = ?event.kind, "event without a window dropped");
            return false;
        };
        if event.is_input()
            && let Some(modal) = self.blocking_modal(id)
        {
            tracing::trace!(target: targets::APPLICATION, window = %id, %modal, kind = ?event.kind, "input blocked by modal window");
            return false;
        }
        match self.window_mut(id) {
            Some(window) => window.handle_event(event),
            None => {
                tracing::debug!(target: targets::APPLICATION, window = %id, "event for unknown window dropped");
                false
            }
        }
    }

    fn destroy_closed_windows(&mut self) {
        self.windows.retain_mut(|window| {
            if window.is_delete_requested() {
                window.destroy();
                false
            } else {
                true
            }
        });
    }

    /// Render every window that needs it. Returns the number of frames drawn.
    pub fn render_all(&mut self) -> usize {
        self.windows.iter_mut().map(Window::render).filter(|&drawn| drawn).count()
    }

    /// One loop iteration. Returns `false` once the loop should stop.
    pub fn run_once(&mut self) -> bool {
        let _span = PerfSpan::new(span_names::EVENT_LOOP);

        self.run_tasks();

        let timeout = self.poll_timeout();
        for event in self.platform.poll_events(Some(timeout)) {
            self.dispatch_event(event);
        }
        self.destroy_closed_windows();

        let now = self.clock.now();
        for window in &mut self.windows {
            window.tick(now);
        }
        self.fire_timers(now);
        // Timers and tasks may close windows too.
        self.destroy_closed_windows();

        self.render_all();
        !self.should_exit()
    }

    fn should_exit(&self) -> bool {
        self.exit_requested || (self.config.exit_on_last_window && self.windows.is_empty())
    }

    /// Run until [`exit`](Self::exit) is called or, by default, no windows
    /// remain.
    pub fn run(&mut self) {
        tracing::info!(target: targets::APPLICATION, app = %self.config.app_name, "event loop started");
        while self.run_once() {}
        tracing::info!(target: targets::APPLICATION, app = %self.config.app_name, "event loop finished");
    }

    /// Stop the loop after the current iteration.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn is_exit_requested(&self) -> bool {
        self.exit_requested
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        for window in &mut self.windows {
            window.destroy();
        }
        INITIALIZED.store(false, Ordering::Release);
        tracing::debug!(target: targets::APPLICATION, app = %self.config.app_name, "application released");
    }
}

#[cfg(all(feature = "winit-backend", any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn default_platform(clock: SharedClock) -> Result<Box<dyn Platform>, CoreError> {
    Ok(Box::new(crate::platform::WinitPlatform::new(clock)?))
}

#[cfg(not(all(feature = "winit-backend", any(target_os = "windows", target_os = "macos", target_os = "linux"))))]
fn default_platform(_clock: SharedClock) -> Result<Box<dyn Platform>, CoreError> {
    Ok(Box::new(crate::platform::HeadlessPlatform::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::platform::{HeadlessHandle, HeadlessPlatform};
    use parking_lot::Mutex;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use ultracanvas_core::ManualClock;

    // The singleton is process-wide; tests take turns.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn app() -> (Application, HeadlessHandle, Arc<ManualClock>) {
        let platform = HeadlessPlatform::new();
        let handle = platform.handle();
        let clock = Arc::new(ManualClock::new());
        let app = Application::initialize_with(ApplicationConfig::new("test"), Box::new(platform), clock.clone())
            .unwrap();
        (app, handle, clock)
    }

    fn headless_window(title: &str) -> WindowConfig {
        WindowConfig::new(title)
            .with_size(200, 100)
            .with_text_shaping(crate::window::TextShaping::Builtin)
    }

    #[test]
    fn test_single_instance() {
        let _guard = SERIAL.lock();
        let (app, _, _) = app();
        assert!(Application::is_initialized());
        let second = Application::initialize_with(
            ApplicationConfig::default(),
            Box::new(HeadlessPlatform::new()),
            MonotonicClock::shared(),
        );
        assert!(matches!(second, Err(CoreError::ApplicationAlreadyInitialized)));
        drop(app);
        assert!(!Application::is_initialized());
    }

    #[test]
    fn test_failed_window_creation_leaves_app_usable() {
        let _guard = SERIAL.lock();
        let mut platform = HeadlessPlatform::new();
        platform.set_fail_creation(true);
        let mut app = Application::initialize_with(
            ApplicationConfig::default(),
            Box::new(platform),
            Arc::new(ManualClock::new()),
        )
        .unwrap();
        assert!(matches!(
            app.create_window(headless_window("x")),
            Err(WindowError::NativeCreation(_))
        ));
        assert_eq!(app.window_count(), 0);
    }

    #[test]
    fn test_close_event_destroys_window_after_dispatch() {
        let _guard = SERIAL.lock();
        let (mut app, handle, _) = app();
        let id = app.create_window(headless_window("main")).unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let slot = Arc::clone(&closed);
        app.window(id)
            .unwrap()
            .on_close()
            .connect(move |_| slot.store(true, Ordering::SeqCst));

        handle.push_event(UcEvent::new(EventKind::WindowClose).with_window(id));
        let keep_going = app.run_once();

        assert!(closed.load(Ordering::SeqCst));
        assert!(app.window(id).is_none());
        assert!(!keep_going);
    }

    #[test]
    fn test_proxy_runs_tasks_on_loop() {
        let _guard = SERIAL.lock();
        let (mut app, _, _) = app();
        app.create_window(headless_window("main")).unwrap();
        let proxy = app.proxy();
        std::thread::spawn(move || {
            proxy.post(|app: &mut Application| app.exit()).unwrap();
        })
        .join()
        .unwrap();
        assert!(!app.run_once());
        assert!(app.is_exit_requested());
    }

    #[test]
    fn test_timers_fire_from_loop() {
        let _guard = SERIAL.lock();
        let (mut app, _, clock) = app();
        app.create_window(headless_window("main")).unwrap();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = app
            .start_repeating_timer(Duration::from_millis(10), move |_| c.set(c.get() + 1))
            .unwrap();

        clock.advance(Duration::from_millis(10));
        app.run_once();
        clock.advance(Duration::from_millis(10));
        app.run_once();
        assert_eq!(count.get(), 2);

        app.stop_timer(id).unwrap();
        clock.advance(Duration::from_millis(10));
        app.run_once();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_global_handler_consumes() {
        let _guard = SERIAL.lock();
        let (mut app, _, _) = app();
        let id = app.create_window(headless_window("main")).unwrap();
        app.set_global_event_handler(|e| e.kind == EventKind::WindowClose);
        assert!(app.dispatch_event(UcEvent::new(EventKind::WindowClose).with_window(id)));
        assert_eq!(app.window(id).map(Window::state), Some(crate::window::WindowState::Normal));
    }

    #[test]
    fn test_renders_once_per_iteration() {
        let _guard = SERIAL.lock();
        let (mut app, handle, _) = app();
        let id = app.create_window(headless_window("main")).unwrap();
        app.run_once();
        assert_eq!(handle.present_count(), 1);
        app.run_once();
        assert_eq!(handle.present_count(), 1);
        app.window_mut(id).unwrap().request_redraw();
        app.window_mut(id).unwrap().request_redraw();
        app.run_once();
        assert_eq!(handle.present_count(), 2);
    }
}
