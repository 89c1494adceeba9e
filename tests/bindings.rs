use census::core::{BindingTracker, Origin};

#[test]
fn inner_scope_shadows_and_pop_restores() {
    let mut tracker = BindingTracker::new();
    tracker.bind_import("F", "pkg.functions");

    tracker.push_scope();
    tracker.bind_assignment("F", Origin::Unknown);
    assert_eq!(tracker.lookup("F"), Origin::Unknown);
    assert!(tracker.is_bound("F"));

    tracker.pop_scope();
    assert_eq!(
        tracker.lookup("F"),
        Origin::ImportedModule("pkg.functions".to_string())
    );
}

#[test]
fn module_scope_is_never_popped() {
    let mut tracker = BindingTracker::new();
    tracker.bind_import("pkg", "pkg");
    tracker.pop_scope();
    tracker.pop_scope();

    assert_eq!(tracker.depth(), 1);
    assert!(tracker.is_bound("pkg"));
}

#[test]
fn unbound_names_are_unknown() {
    let tracker = BindingTracker::default();
    assert_eq!(tracker.lookup("df"), Origin::Unknown);
    assert!(!tracker.is_bound("df"));
}

#[test]
fn rebinding_in_same_scope_replaces() {
    let mut tracker = BindingTracker::new();
    tracker.bind_assignment("df", Origin::ResolvedCall("pkg.frame".to_string()));
    tracker.bind_assignment("df", Origin::Unknown);
    assert_eq!(tracker.lookup("df"), Origin::Unknown);
}

#[test]
fn star_imports_are_recorded_once() {
    let mut tracker = BindingTracker::new();
    tracker.bind_star_import("pkg.functions");
    tracker.bind_star_import("pkg.functions");
    tracker.bind_star_import("pkg.types");
    assert_eq!(tracker.star_modules(), ["pkg.functions", "pkg.types"]);
}

#[test]
fn origin_attribute_access() {
    let module = Origin::ImportedModule("pkg".to_string());
    assert_eq!(
        module.attribute("functions"),
        Origin::ImportedModule("pkg.functions".to_string())
    );

    let frame = Origin::ResolvedCall("pkg.frame".to_string());
    assert_eq!(frame.attribute("write"), frame);
    assert_eq!(frame.owner_hint(), Some("pkg.frame"));

    assert_eq!(Origin::Unknown.attribute("x"), Origin::Unknown);
    assert_eq!(module.owner_hint(), None);
}
