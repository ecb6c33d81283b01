//! End-to-end behavior of a window driven through the headless platform.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Button, Dropdown, Harness};
use parking_lot::Mutex;
use ultracanvas::platform::NativeCall;
use ultracanvas::render::{DrawCommand, IntRect, Rect};
use ultracanvas::{Element, EventKind, Layer, Modifiers, TooltipState, UcEvent, VirtualKey};

#[test]
fn test_dropdown_open_select_close() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let dropdown = h
        .window
        .add_element(
            root,
            Dropdown::new("dropdown", IntRect::new(10, 10, 200, 24), &["Alpha", "Beta", "Gamma"]),
        )
        .unwrap();

    let selections = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&selections);
    h.window.on_notification().connect(move |e: &UcEvent| {
        if e.kind == EventKind::DropdownSelect {
            sink.lock().push((e.target, e.user_data));
        }
    });

    assert!(h.send(UcEvent::mouse_down(50, 20)));
    let dd = h.window.tree().downcast::<Dropdown>(dropdown).unwrap();
    assert!(dd.is_open());
    assert_eq!(dd.base().z_index(), Layer::Dropdowns.z());
    assert_eq!(h.window.active_popups(), vec![dropdown]);

    assert!(h.send(UcEvent::mouse_move(50, 70)));
    assert_eq!(h.window.tree().downcast::<Dropdown>(dropdown).unwrap().hovered(), 1);

    assert!(h.send(UcEvent::mouse_down(50, 70)));
    let dd = h.window.tree().downcast::<Dropdown>(dropdown).unwrap();
    assert_eq!(dd.selected(), 1);
    assert!(!dd.is_open());
    assert!(h.window.active_popups().is_empty());
    assert_eq!(*selections.lock(), vec![(Some(dropdown), 1)]);

    let texts: Vec<(String, Rect)> = h
        .frame()
        .into_iter()
        .filter_map(|c| match c {
            DrawCommand::Text {
                text, rect: Some(rect), ..
            } => Some((text, rect)),
            _ => None,
        })
        .collect();
    assert_eq!(texts.len(), 1);
    let (text, rect) = &texts[0];
    assert_eq!(text, "Beta");
    assert!(rect.left() >= 10.0 && rect.right() <= 210.0);
    assert!(rect.top() >= 10.0 && rect.bottom() <= 34.0);
}

#[test]
fn test_focus_traversal_wraps() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let a = h.window.add_element(root, Button::new("a", IntRect::new(10, 10, 80, 24))).unwrap();
    let b = h.window.add_element(root, Button::new("b", IntRect::new(100, 10, 80, 24))).unwrap();
    let c = h.window.add_element(root, Button::new("c", IntRect::new(190, 10, 80, 24))).unwrap();
    assert!(h.window.request_element_focus(b));

    assert!(h.window.focus_next_element());
    assert_eq!(h.window.focused_element(), Some(c));
    let tree = h.window.tree();
    let (bb, cb) = (tree.downcast::<Button>(b).unwrap(), tree.downcast::<Button>(c).unwrap());
    assert!(!bb.base().is_focused());
    assert!(cb.base().is_focused());
    assert_eq!(bb.focus_lost, 1);
    assert_eq!(cb.focus_gained, 1);

    assert!(h.window.focus_next_element());
    assert_eq!(h.window.focused_element(), Some(a));
    assert!(h.window.tree().downcast::<Button>(a).unwrap().base().is_focused());
}

#[test]
fn test_tab_key_moves_focus() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let a = h.window.add_element(root, Button::new("a", IntRect::new(10, 10, 80, 24))).unwrap();
    let b = h.window.add_element(root, Button::new("b", IntRect::new(100, 10, 80, 24))).unwrap();
    h.window.request_element_focus(a);

    assert!(h.send(UcEvent::key_down(VirtualKey::Tab)));
    assert_eq!(h.window.focused_element(), Some(b));
    assert!(h.send(UcEvent::key_down(VirtualKey::Tab).with_modifiers(Modifiers::SHIFT)));
    assert_eq!(h.window.focused_element(), Some(a));
}

#[test]
fn test_tooltip_delay() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    h.window
        .add_element(root, Button::new("tip", IntRect::new(100, 100, 50, 20)).with_tooltip("hello"))
        .unwrap();

    h.send(UcEvent::mouse_move(110, 110));
    assert_eq!(h.window.tooltip().state(), TooltipState::PendingShow);

    h.advance(Duration::from_millis(500));
    assert_eq!(h.window.tooltip().state(), TooltipState::PendingShow);
    assert!(!h.texts().contains(&"hello".to_string()));

    h.advance(Duration::from_millis(400));
    assert_eq!(h.window.tooltip().state(), TooltipState::Visible);
    let frame = h.frame();
    let text_at = frame
        .iter()
        .position(|c| c.text() == Some("hello"))
        .expect("tooltip text drawn");
    assert!(
        frame[..text_at]
            .iter()
            .any(|c| matches!(c, DrawCommand::FillPath { .. })),
        "background is drawn before the text"
    );
    if let DrawCommand::Text { style, .. } = &frame[text_at] {
        let tooltip = h.window.tooltip().style();
        assert_eq!(style.face.family, tooltip.font_family);
        assert_eq!(style.size, tooltip.font_size);
    }

    h.window.hide_tooltip();
    assert_eq!(h.window.tooltip().state(), TooltipState::PendingHide);
    assert!(h.texts().contains(&"hello".to_string()));

    h.advance(Duration::from_millis(500));
    assert_eq!(h.window.tooltip().state(), TooltipState::Idle);
    assert!(!h.texts().contains(&"hello".to_string()));
}

#[test]
fn test_outside_click_dismisses_popup() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let dropdown = h
        .window
        .add_element(root, Dropdown::new("dd", IntRect::new(10, 10, 200, 24), &["One", "Two"]))
        .unwrap();
    let button = h
        .window
        .add_element(root, Button::new("below", IntRect::new(250, 200, 100, 40)))
        .unwrap();

    h.send(UcEvent::mouse_down(50, 20));
    assert_eq!(h.window.active_popups(), vec![dropdown]);

    assert!(h.send(UcEvent::mouse_down(300, 220)));
    assert!(!h.window.tree().downcast::<Dropdown>(dropdown).unwrap().is_open());
    assert!(h.window.active_popups().is_empty());
    assert_eq!(h.window.tree().downcast::<Button>(button).unwrap().presses, 0);

    // With the popup gone the next press reaches the button.
    h.send(UcEvent::mouse_down(300, 220));
    assert_eq!(h.window.tree().downcast::<Button>(button).unwrap().presses, 1);
}

#[test]
fn test_escape_closes_open_dropdown() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let dropdown = h
        .window
        .add_element(root, Dropdown::new("dd", IntRect::new(10, 10, 200, 24), &["One"]))
        .unwrap();
    h.send(UcEvent::mouse_down(50, 20));

    assert!(h.send(UcEvent::key_down(VirtualKey::Escape)));
    assert!(!h.window.tree().downcast::<Dropdown>(dropdown).unwrap().is_open());
    assert!(h.window.active_popups().is_empty());
}

#[test]
fn test_redraw_requests_coalesce_into_one_frame() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    for (i, x) in [10, 110, 210].into_iter().enumerate() {
        let mut button = Button::new(&format!("b{i}"), IntRect::new(x, 10, 80, 24));
        button.redraw_on_press = true;
        h.window.add_element(root, button).unwrap();
    }
    assert!(h.window.render());
    h.handle.take_calls();

    for x in [20, 120, 220] {
        h.send(UcEvent::mouse_down(x, 20));
    }
    let pokes = h
        .handle
        .calls()
        .iter()
        .filter(|c| matches!(c, NativeCall::RequestRedraw(_)))
        .count();
    assert_eq!(pokes, 1);

    let before = h.window.frames_rendered();
    assert!(h.window.render());
    assert!(!h.window.render());
    assert_eq!(h.window.frames_rendered(), before + 1);
    assert!(!h.window.needs_redraw());
}

#[test]
fn test_resize_propagates() {
    let mut h = Harness::new(800, 600);
    assert!(h.window.render());
    h.handle.take_calls();

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    h.window.on_resize().connect(move |size: &(i32, i32)| sink.lock().push(*size));

    assert!(h.send(UcEvent::resize(1000, 700)));
    assert_eq!(h.window.size(), (1000, 700));
    assert_eq!(h.window.surface_size(), (1000, 700));
    assert_eq!(*sizes.lock(), vec![(1000, 700)]);
    assert!(h.window.needs_redraw());
    let pokes = h
        .handle
        .calls()
        .iter()
        .filter(|c| matches!(c, NativeCall::RequestRedraw(_)))
        .count();
    assert_eq!(pokes, 1);

    assert!(h.window.render());
    let presented = h.handle.calls().into_iter().find_map(|c| match c {
        NativeCall::Present { width, height, .. } => Some((width, height)),
        _ => None,
    });
    assert_eq!(presented, Some((1000, 700)));
}

#[test]
fn test_hover_enter_leave_and_cursor() {
    let mut h = Harness::new(400, 300);
    let root = h.window.root();
    let mut link = Button::new("link", IntRect::new(10, 10, 50, 20));
    link.base_mut().set_cursor(cursor_icon::CursorIcon::Pointer);
    let link = h.window.add_element(root, link).unwrap();

    h.send(UcEvent::mouse_move(20, 20));
    assert_eq!(h.window.hovered_element(), Some(link));
    assert_eq!(h.window.cursor(), cursor_icon::CursorIcon::Pointer);
    assert!(
        h.handle
            .calls()
            .contains(&NativeCall::SetCursor(h.window.id(), cursor_icon::CursorIcon::Pointer))
    );

    h.send(UcEvent::mouse_move(200, 200));
    assert_eq!(h.window.hovered_element(), None);
    let b = h.window.tree().downcast::<Button>(link).unwrap();
    assert_eq!((b.enters, b.leaves), (1, 1));
    assert_eq!(h.window.cursor(), cursor_icon::CursorIcon::Default);
}
