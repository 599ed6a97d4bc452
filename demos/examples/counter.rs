// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter demo.
//!
//! Renders a list of counters into a `MemoryTarget`, works through the pass a
//! couple of units per "frame", then clicks a button and prints the mutations
//! the resulting pass produced.
//!
//! Run:
//! - `cargo run -p understory_fiber_demos --example counter`

use std::cell::Cell;

use understory_fiber::memory::MemoryTarget;
use understory_fiber::{Component, Element, Engine, Handler, PropValue, Props, WorkStatus};

fn counter() -> Component {
    Component::new(|cx, props: &Props| {
        let (count, set_count) = cx.use_state(0_i64);
        let label = props.get("label").and_then(PropValue::as_str).unwrap_or("?");
        Element::host("li").with_children([
            Element::text(format!("{label}: {count}")),
            Element::host("button")
                .with("onClick", Handler::new(move |_| set_count.update(|c| c + 1)))
                .with_child(Element::text("+")),
        ])
    })
}

fn app() -> Element {
    Element::host("ul").with_children(["apples", "pears", "plums"].map(|label| {
        Element::function(counter(), Props::new().with("label", label))
    }))
}

fn main() {
    let mut target = MemoryTarget::new();
    let container = target.create_container();
    let mut engine = Engine::new(target);
    engine.render(app(), container);

    // Pretend each frame leaves room for two units of work.
    let mut frame = 0;
    loop {
        frame += 1;
        let budget = Cell::new(2.0_f64);
        let deadline = || {
            budget.set(budget.get() - 1.0);
            budget.get()
        };
        match engine.work_loop(&deadline) {
            Ok(WorkStatus::Yielded) => println!("frame {frame}: yielded"),
            Ok(WorkStatus::Committed(summary)) => {
                println!("frame {frame}: committed {summary:?}");
                break;
            }
            Ok(WorkStatus::Idle) => break,
            Err(err) => {
                eprintln!("render failed: {err}");
                return;
            }
        }
    }
    println!("{}", engine.target().to_markup(container));

    let ul = engine.target().children(container)[0];
    let pears = engine.target().children(ul)[1];
    let button = engine.target().children(pears)[1];
    engine.target_mut().clear_mutations();
    engine.target().dispatch(button, "click", &());

    match engine.flush() {
        Ok(summary) => println!("after click: {summary:?}"),
        Err(err) => {
            eprintln!("render failed: {err}");
            return;
        }
    }
    for mutation in engine.target().mutations() {
        println!("  {mutation:?}");
    }
    println!("{}", engine.target().to_markup(container));
}
