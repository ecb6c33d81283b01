//! Modal windows block input to their parent while shown.

use std::sync::Arc;

use ultracanvas::platform::HeadlessPlatform;
use ultracanvas::render::IntRect;
use ultracanvas::window::TextShaping;
use ultracanvas::{
    Application, ApplicationConfig, Element, ElementBase, EventCx, ManualClock, UcEvent, WindowConfig,
};

#[derive(Debug)]
struct Counter {
    base: ElementBase,
    presses: usize,
}

impl Element for Counter {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn on_event(&mut self, _cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
        if event.kind == ultracanvas::EventKind::MouseDown {
            self.presses += 1;
            return true;
        }
        false
    }
}

fn config(title: &str) -> WindowConfig {
    WindowConfig::new(title)
        .with_size(300, 200)
        .with_text_shaping(TextShaping::Builtin)
}

// One test per binary: the application is a process-wide singleton.
#[test]
fn test_modal_blocks_parent_until_closed() {
    let mut app = Application::initialize_with(
        ApplicationConfig::new("modal").with_exit_on_last_window(false),
        Box::new(HeadlessPlatform::new()),
        Arc::new(ManualClock::new()),
    )
    .unwrap();

    let parent = app.create_window(config("parent")).unwrap();
    let counter = {
        let window = app.window_mut(parent).unwrap();
        let root = window.root();
        window
            .add_element(
                root,
                Counter {
                    base: ElementBase::new("counter", IntRect::new(0, 0, 100, 100)),
                    presses: 0,
                },
            )
            .unwrap()
    };
    let presses = |app: &Application| {
        app.window(parent)
            .and_then(|w| w.tree().downcast::<Counter>(counter))
            .map(|c| c.presses)
    };

    assert!(app.dispatch_event(UcEvent::mouse_down(10, 10).with_window(parent)));
    assert_eq!(presses(&app), Some(1));

    let dialog = app
        .create_window(config("dialog").with_parent(parent).with_modal(true))
        .unwrap();
    assert_eq!(app.blocking_modal(parent), Some(dialog));
    assert_eq!(app.blocking_modal(dialog), None);

    // Input is blocked, lifecycle events still apply.
    assert!(!app.dispatch_event(UcEvent::mouse_down(10, 10).with_window(parent)));
    assert_eq!(presses(&app), Some(1));
    assert!(app.dispatch_event(UcEvent::resize(320, 240).with_window(parent)));
    assert_eq!(app.window(parent).map(|w| w.size()), Some((320, 240)));

    // A hidden modal no longer blocks.
    app.window_mut(dialog).unwrap().hide().unwrap();
    assert_eq!(app.blocking_modal(parent), None);
    app.window_mut(dialog).unwrap().show().unwrap();
    assert_eq!(app.blocking_modal(parent), Some(dialog));

    app.close_window(dialog).unwrap();
    app.run_once();
    assert!(app.window(dialog).is_none());
    assert_eq!(app.blocking_modal(parent), None);

    assert!(app.dispatch_event(UcEvent::mouse_down(10, 10).with_window(parent)));
    assert_eq!(presses(&app), Some(2));
}
