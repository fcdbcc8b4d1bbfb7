mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::Harness;
use reconciler::{Component, ComponentError, Dispatch, HookError, Reducer, RootPhase, h};
use scheduler::StepDeadline;

type Slot<T> = Rc<RefCell<Option<T>>>;

fn slot<T>() -> Slot<T> {
    Rc::new(RefCell::new(None))
}

fn take<T: Clone>(slot: &Slot<T>) -> T {
    slot.borrow().clone().expect("captured by render")
}

#[test]
fn use_state_replays_updaters_and_values() {
    let t = Harness::new();
    let count = Rc::new(Cell::new(0i64));
    let setter: Slot<Dispatch<i64>> = slot();

    let app = {
        let count = Rc::clone(&count);
        let setter = Rc::clone(&setter);
        Component::new("App", move |hooks, _| {
            let (value, set_value) = hooks.use_state(100i64)?;
            count.set(value);
            *setter.borrow_mut() = Some(set_value);
            Ok(h("div").child(value).build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    assert_eq!(t.html(), "<div>100</div>");

    t.root
        .act(|| take(&setter).update(|c| c + 1))
        .expect("update");
    assert_eq!(count.get(), 101);

    t.root
        .act(|| take(&setter).set(count.get() + 1))
        .expect("set");
    assert_eq!(count.get(), 102);
    assert_eq!(t.html(), "<div>102</div>");
}

#[test]
fn dispatch_is_stable_across_renders() {
    let t = Harness::new();
    let seen: Rc<RefCell<Vec<Dispatch<u32>>>> = Rc::new(RefCell::new(Vec::new()));
    let app = {
        let seen = Rc::clone(&seen);
        Component::new("App", move |hooks, _| {
            let (value, set_value) = hooks.use_state(0u32)?;
            seen.borrow_mut().push(set_value);
            Ok(h("p").child(i64::from(value)).build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    let first = seen.borrow()[0].clone();
    t.root.act(|| first.set(5)).expect("update");
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].ptr_eq(&seen[1]));
    assert_eq!(t.html(), "<p>5</p>");
}

#[test]
fn multiple_state_slots_keep_their_order() {
    let t = Harness::new();
    let setters: Slot<(Dispatch<i32>, Dispatch<String>, Dispatch<bool>)> = slot();
    let app = {
        let setters = Rc::clone(&setters);
        Component::new("Form", move |hooks, _| {
            let (n, set_n) = hooks.use_state(1)?;
            let (label, set_label) = hooks.use_state(String::from("a"))?;
            let (flag, set_flag) = hooks.use_state(false)?;
            *setters.borrow_mut() = Some((set_n, set_label, set_flag));
            Ok(h("p").child(format!("{n}-{label}-{flag}")).build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    assert_eq!(t.html(), "<p>1-a-false</p>");

    t.root
        .act(|| {
            let (set_n, set_label, set_flag) = take(&setters);
            set_label.set("b".to_string());
            set_n.update(|n| n * 10);
            set_flag.set(true);
        })
        .expect("update");
    assert_eq!(t.html(), "<p>10-b-true</p>");
}

#[derive(Clone)]
enum Action {
    Add,
    Sub,
}

fn counter_reducer(state: &i32, action: Action) -> i32 {
    match action {
        Action::Add => state + 1,
        Action::Sub => state - 1,
    }
}

#[test]
fn use_reducer_feeds_actions_through_the_reducer() {
    let t = Harness::new();
    let count = Rc::new(Cell::new(0));
    let dispatch: Slot<Reducer<i32, Action>> = slot();
    let app = {
        let count = Rc::clone(&count);
        let dispatch = Rc::clone(&dispatch);
        Component::new("App", move |hooks, _| {
            let (value, reducer) = hooks.use_reducer(counter_reducer, 100)?;
            count.set(value);
            *dispatch.borrow_mut() = Some(reducer);
            Ok(h("div").child(value).build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");

    t.root
        .act(|| {
            let reducer = take(&dispatch);
            reducer.dispatch(Action::Add);
            reducer.dispatch(Action::Add);
        })
        .expect("add");
    assert_eq!(count.get(), 102);

    t.root
        .act(|| take(&dispatch).dispatch(Action::Sub))
        .expect("sub");
    assert_eq!(count.get(), 101);
}

#[test]
fn click_listeners_dispatch_updates() {
    let t = Harness::new();
    let increases = Rc::new(Cell::new(0));
    let app = {
        let increases = Rc::clone(&increases);
        Component::new("App", move |hooks, _| {
            let (count, set_count) = hooks.use_state(100)?;
            let increases = Rc::clone(&increases);
            Ok(h("div")
                .child(count)
                .child(" ")
                .child(h("button").child("add").on("click", move |_| {
                    let increases = Rc::clone(&increases);
                    set_count.update(move |c| {
                        increases.set(increases.get() + 1);
                        c + 1
                    });
                }))
                .build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    assert_eq!(increases.get(), 0);

    t.root
        .act(|| {
            t.click_button(0);
            t.click_button(0);
        })
        .expect("clicks");
    assert_eq!(increases.get(), 2);
    assert_eq!(t.html(), "<div>102 <button>add</button></div>");
}

#[test]
fn list_grows_and_shrinks_with_state() {
    let t = Harness::new();
    let app = Component::new("App", |hooks, _| {
        let (count, set_count) = hooks.use_state(2usize)?;
        let inc = set_count.clone();
        Ok(h("div")
            .attr("id", "foo")
            .child(count)
            .child(
                h("button")
                    .child("add")
                    .on("click", move |_| inc.update(|s| s + 1)),
            )
            .child(
                h("button")
                    .child("sub")
                    .on("click", move |_| set_count.update(|s| s.saturating_sub(1))),
            )
            .child(h("ul").children((0..count).map(|i| h("li").child(i))))
            .build())
    });

    t.root
        .act(|| {
            t.root.render(app.element());
            assert_eq!(t.html(), "");
        })
        .expect("mount");

    t.root.act(|| t.click_button(0)).expect("add");
    assert_eq!(
        t.html(),
        r#"<div id="foo">3<button>add</button><button>sub</button><ul><li>0</li><li>1</li><li>2</li></ul></div>"#
    );

    t.root.act(|| t.click_button(1)).expect("sub");
    assert_eq!(
        t.html(),
        r#"<div id="foo">2<button>add</button><button>sub</button><ul><li>0</li><li>1</li></ul></div>"#
    );

    t.root
        .act(|| {
            t.click_button(1);
            t.click_button(1);
        })
        .expect("sub twice");
    assert_eq!(
        t.html(),
        r#"<div id="foo">0<button>add</button><button>sub</button><ul></ul></div>"#
    );
    assert_eq!(
        t.root.host().attached_count(t.container),
        t.fiber_host_nodes()
    );
}

#[test]
fn effects_run_after_commit_when_deps_change() {
    let t = Harness::new();
    let power_seen = Rc::new(Cell::new(-1));
    let app = {
        let power_seen = Rc::clone(&power_seen);
        Component::new("App", move |hooks, _| {
            let (count, set_count) = hooks.use_state(0)?;
            let (power, set_power) = hooks.use_state(count * count)?;
            hooks.use_effect(count, move || set_power.set(count * count))?;
            power_seen.set(power);
            Ok(h("div")
                .attr("id", "foo")
                .style(host::StyleMap::new().with("width", 100).with("fontSize", "22px"))
                .child(h("div").child(count))
                .child(h("div").child(power))
                .child(
                    h("button")
                        .child("power")
                        .on("click", move |_| set_count.update(|s| s + 1)),
                )
                .build())
        })
    };
    let page = |count: i32, power: i32| {
        format!(
            r#"<div id="foo" style="width: 100px; font-size: 22px;"><div>{count}</div><div>{power}</div><button>power</button></div>"#
        )
    };

    t.root
        .act(|| {
            t.root.render(app.element());
            assert_eq!(t.html(), "");
        })
        .expect("mount");
    assert_eq!(t.html(), page(0, 0));

    t.root.act(|| t.click_button(0)).expect("click");
    assert_eq!(t.html(), page(1, 1));

    t.root.act(|| t.click_button(0)).expect("click");
    assert_eq!(t.html(), page(2, 4));

    t.root.act(|| t.click_button(0)).expect("click");
    assert_eq!(power_seen.get(), 9);

    t.root.act(|| t.click_button(0)).expect("click");
    assert_eq!(power_seen.get(), 16);
}

#[test]
fn effects_flush_in_visitation_order() {
    let t = Harness::new();
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let child = {
        let log = Rc::clone(&log);
        Component::new("Child", move |hooks, props| {
            let name = props.str("name").unwrap_or("?").to_string();
            let log = Rc::clone(&log);
            let entry = name.clone();
            hooks.use_effect_always(move || log.borrow_mut().push(entry))?;
            Ok(h("span").child(name).build())
        })
    };
    let app = {
        let log = Rc::clone(&log);
        Component::new("Parent", move |hooks, _| {
            let log = Rc::clone(&log);
            hooks.use_effect((), move || log.borrow_mut().push("parent".to_string()))?;
            Ok(h("div")
                .child(child.element().attr("name", "a"))
                .child(child.element().attr("name", "b"))
                .build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    assert_eq!(*log.borrow(), ["parent", "a", "b"]);

    log.borrow_mut().clear();
    t.root.act(|| t.root.render(app.element())).expect("rerender");
    assert_eq!(*log.borrow(), ["a", "b"]);
}

#[test]
fn updates_during_work_wait_for_the_next_cycle() {
    let t = Harness::new();
    let setter: Slot<Dispatch<i32>> = slot();
    let app = {
        let setter = Rc::clone(&setter);
        Component::new("App", move |hooks, _| {
            let (value, set_value) = hooks.use_state(0)?;
            *setter.borrow_mut() = Some(set_value);
            Ok(h("ul")
                .children((0..3).map(|i| h("li").child(i)))
                .child(h("p").child(value))
                .build())
        })
    };
    t.root.render(app.element());

    // root, then App
    t.scheduler.run_slice(&StepDeadline::new(0));
    t.scheduler.run_slice(&StepDeadline::new(0));
    assert_eq!(t.root.phase(), RootPhase::Working);

    take(&setter).set(5);
    assert_eq!(t.scheduler.pending(), 1);

    t.scheduler
        .run_until_idle_with(|| StepDeadline::new(0))
        .expect("idle");
    assert_eq!(t.root.version().0, 2);
    assert_eq!(
        t.html(),
        "<ul><li>0</li><li>1</li><li>2</li><p>5</p></ul>"
    );
}

#[test]
fn hook_count_changes_abort_the_render() {
    let t = Harness::new();
    let extra = Rc::new(Cell::new(false));
    let setter: Slot<Dispatch<i32>> = slot();
    let app = {
        let extra = Rc::clone(&extra);
        let setter = Rc::clone(&setter);
        Component::new("Flaky", move |hooks, _| {
            let (value, set_value) = hooks.use_state(1)?;
            *setter.borrow_mut() = Some(set_value);
            if extra.get() {
                hooks.use_state(2)?;
            }
            Ok(h("p").child(value).build())
        })
    };
    t.root.act(|| t.root.render(app.element())).expect("mount");
    let before = t.root.current_tree();

    extra.set(true);
    let err = t
        .root
        .act(|| take(&setter).set(7))
        .expect_err("hook count mismatch");
    assert_eq!(
        err.hook_error(),
        Some(&HookError::CountMismatch {
            component: "Flaky".to_string(),
            previous: 1,
            current: 2,
        })
    );
    assert_eq!(t.html(), "<p>1</p>");
    assert_eq!(t.root.current_tree(), before);
    assert_eq!(t.root.phase(), RootPhase::Idle);
}

#[test]
fn component_errors_leave_the_committed_tree_unchanged() {
    let t = Harness::new();
    let fail = Rc::new(Cell::new(false));
    let app = {
        let fail = Rc::clone(&fail);
        Component::new("Fallible", move |_, props| {
            if fail.get() {
                return Err(ComponentError::msg("render failed"));
            }
            Ok(h("p").child(props.str("label").unwrap_or("")).build())
        })
    };
    t.root
        .act(|| t.root.render(app.element().attr("label", "ok")))
        .expect("mount");
    let version = t.root.version();

    fail.set(true);
    let err = t
        .root
        .act(|| t.root.render(app.element().attr("label", "next")))
        .expect_err("component error");
    assert!(matches!(
        err,
        reconciler::RenderError::Component { ref component, .. } if component == "Fallible"
    ));
    assert_eq!(t.html(), "<p>ok</p>");
    assert_eq!(t.root.version(), version);
    assert_eq!(t.root.fiber_count(), t.root.current_tree().len());

    fail.set(false);
    t.root
        .act(|| t.root.render(app.element().attr("label", "again")))
        .expect("recovered");
    assert_eq!(t.html(), "<p>again</p>");
}
