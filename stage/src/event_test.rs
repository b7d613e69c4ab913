use super::*;

#[test]
fn add_then_contains() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::PointerDown, 1).expect("add");
    assert!(t.contains(EventKind::PointerDown));
    assert!(!t.contains(EventKind::PointerUp));
    assert_eq!(t.len(), 1);
}

#[test]
fn duplicate_add_is_rejected_and_first_kept() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::Wheel, 1).expect("add");
    assert!(matches!(t.add(EventKind::Wheel, 2), Err(EngineError::Configuration(_))));
    assert_eq!(t.take(EventKind::Wheel), Some(1));
}

#[test]
fn remove_frees_the_slot() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::Render, 1).expect("add");
    assert!(t.remove(EventKind::Render));
    assert!(!t.remove(EventKind::Render));
    t.add(EventKind::Render, 2).expect("re-add");
}

#[test]
fn take_and_restore_round_trip() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::DragStart, 7).expect("add");
    let h = t.take(EventKind::DragStart).expect("take");
    assert!(t.contains(EventKind::DragStart));
    t.restore(EventKind::DragStart, h);
    assert_eq!(t.take(EventKind::DragStart), Some(7));
}

#[test]
fn slot_is_occupied_while_handler_runs() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::PointerMove, 1).expect("add");
    let h = t.take(EventKind::PointerMove).expect("take");
    assert!(t.add(EventKind::PointerMove, 2).is_err());
    t.restore(EventKind::PointerMove, h);
}

#[test]
fn removal_during_call_is_honored() {
    let mut t: EventTable<u32> = EventTable::new();
    t.add(EventKind::PointerUp, 1).expect("add");
    let h = t.take(EventKind::PointerUp).expect("take");
    assert!(t.remove(EventKind::PointerUp));
    t.restore(EventKind::PointerUp, h);
    assert!(t.is_empty());
}

#[test]
fn scene_kinds_exclude_object_only_events() {
    assert!(!EventKind::SCENE.contains(&EventKind::Render));
    assert!(!EventKind::SCENE.contains(&EventKind::PointerEnter));
    assert!(EventKind::SCENE.contains(&EventKind::DragEnd));
}

#[test]
fn event_kind_displays_snake_case() {
    assert_eq!(EventKind::PointerLeave.to_string(), "pointer_leave");
    assert_eq!(serde_json::to_string(&EventKind::DragStart).expect("json"), "\"drag_start\"");
}
