use host::{Document, HostError};
use mimalloc::MiMalloc;
use reconciler::{Component, RenderError, create_root, h};
use scheduler::Scheduler;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), RenderError> {
    let counter = Component::new("Counter", |hooks, props| {
        let (count, set_count) = hooks.use_state(props.num("start").unwrap_or(0.0))?;
        Ok(h("div")
            .attr("className", "counter")
            .child(h("h1").child(format!("Count: {count}")))
            .child(
                h("button")
                    .on("click", move |_| set_count.update(|c| c + 1.0))
                    .child("+1"),
            )
            .build())
    });

    let scheduler = Scheduler::new();
    let mut doc = Document::new();
    let container = doc.create_element("div")?;
    let root = create_root(doc, container, &scheduler);

    root.act(|| root.render(counter.element().attr("start", 1)))?;
    println!("{}", root.host().inner_html(container));

    for _ in 0..3 {
        root.act(|| click_first_button(&root.host(), container))??;
        println!("{}", root.host().inner_html(container));
    }
    Ok(())
}

fn click_first_button(doc: &Document, container: host::HostHandle) -> Result<(), HostError> {
    if let Some(&button) = doc.query_selector_all(container, "button").first() {
        doc.click(button)?;
    }
    Ok(())
}
