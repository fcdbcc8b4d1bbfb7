//! Hooks runtime.
//!
//! Hook identity is positional: the Nth hook call of a component fiber always
//! addresses slot N. Slots are rebuilt on every render of the fiber from the
//! slots of its alternate.
//!
//! State updates go into a queue shared by every generation of the slot. A
//! render replays the whole queue on top of the committed state without
//! draining it and records how many updates it consumed; the commit then drains
//! exactly that many. A discarded render therefore leaves the queue intact.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::HookError;
use crate::root::UpdateSignal;

/// Effect collected during render and run after commit.
pub(crate) type PendingEffect = Box<dyn FnOnce()>;

enum Update<T> {
    Replace(T),
    Apply(Rc<dyn Fn(&T) -> T>),
}

impl<T: Clone> Clone for Update<T> {
    fn clone(&self) -> Self {
        match self {
            Update::Replace(value) => Update::Replace(value.clone()),
            Update::Apply(f) => Update::Apply(Rc::clone(f)),
        }
    }
}

pub(crate) struct UpdateQueue<T> {
    pending: RefCell<Vec<Update<T>>>,
    signal: Rc<UpdateSignal>,
}

impl<T: Clone> UpdateQueue<T> {
    fn new(signal: Rc<UpdateSignal>) -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            signal,
        }
    }

    fn push(&self, update: Update<T>) {
        self.pending.borrow_mut().push(update);
        self.signal.notify();
    }

    /// Applies every pending update to `base`, in enqueue order.
    fn replay(&self, base: T) -> (T, usize) {
        // Updaters may dispatch; replay from a snapshot.
        let pending: Vec<Update<T>> = self.pending.borrow().clone();
        let mut state = base;
        for update in &pending {
            state = match update {
                Update::Replace(value) => value.clone(),
                Update::Apply(f) => f(&state),
            };
        }
        (state, pending.len())
    }
}

/// Type-erased view of an update queue, used by the commit to drain it.
pub(crate) trait PendingQueue {
    fn drain_front(&self, count: usize);

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: 'static> PendingQueue for UpdateQueue<T> {
    fn drain_front(&self, count: usize) {
        let mut pending = self.pending.borrow_mut();
        let count = count.min(pending.len());
        pending.drain(..count);
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[derive(Clone)]
pub(crate) enum HookSlot {
    State {
        state: Rc<dyn Any>,
        queue: Rc<dyn PendingQueue>,
        consumed: usize,
    },
    Effect {
        deps: Option<Rc<dyn Any>>,
    },
}

impl HookSlot {
    fn kind(&self) -> &'static str {
        match self {
            HookSlot::State { .. } => "state",
            HookSlot::Effect { .. } => "effect",
        }
    }

    /// Drains the updates the committed render consumed.
    pub(crate) fn settle(&mut self) {
        if let HookSlot::State {
            queue, consumed, ..
        } = self
        {
            queue.drain_front(std::mem::take(consumed));
        }
    }
}

/// Setter returned by [`Hooks::use_state`].
///
/// Stable across renders: every render of the same slot hands out a dispatch
/// sharing one queue.
pub struct Dispatch<T> {
    queue: Rc<UpdateQueue<T>>,
}

impl<T> Clone for Dispatch<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> fmt::Debug for Dispatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("pending", &self.queue.pending.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Dispatch<T> {
    /// Queues a replacement value and schedules a re-render.
    pub fn set(&self, value: T) {
        self.queue.push(Update::Replace(value));
    }

    /// Queues an updater and schedules a re-render.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.queue.push(Update::Apply(Rc::new(f)));
    }

    pub fn ptr_eq(&self, other: &Dispatch<T>) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

/// Dispatcher returned by [`Hooks::use_reducer`].
pub struct Reducer<S, A> {
    dispatch: Dispatch<S>,
    reducer: Rc<dyn Fn(&S, A) -> S>,
}

impl<S, A> Clone for Reducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            dispatch: self.dispatch.clone(),
            reducer: Rc::clone(&self.reducer),
        }
    }
}

impl<S: Clone + 'static, A: Clone + 'static> Reducer<S, A> {
    pub fn dispatch(&self, action: A) {
        let reducer = Rc::clone(&self.reducer);
        self.dispatch
            .update(move |state| reducer(state, action.clone()));
    }

    pub fn ptr_eq(&self, other: &Reducer<S, A>) -> bool {
        self.dispatch.ptr_eq(&other.dispatch)
    }
}

/// Hook context handed to a component's render function.
pub struct Hooks<'a> {
    component: &'a str,
    previous: Option<&'a [HookSlot]>,
    slots: Vec<HookSlot>,
    effects: &'a mut Vec<PendingEffect>,
    signal: &'a Rc<UpdateSignal>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        component: &'a str,
        previous: Option<&'a [HookSlot]>,
        effects: &'a mut Vec<PendingEffect>,
        signal: &'a Rc<UpdateSignal>,
    ) -> Self {
        Self {
            component,
            previous,
            slots: Vec::new(),
            effects,
            signal,
        }
    }

    pub fn component(&self) -> &str {
        self.component
    }

    pub fn use_state<T: Clone + 'static>(
        &mut self,
        initial: T,
    ) -> Result<(T, Dispatch<T>), HookError> {
        let index = self.slots.len();
        let (base, queue) = match self.previous_slot("state")? {
            Some(HookSlot::State { state, queue, .. }) => {
                let queue = Rc::clone(queue)
                    .into_any()
                    .downcast::<UpdateQueue<T>>()
                    .map_err(|_| self.type_mismatch(index))?;
                let base = (**state)
                    .downcast_ref::<T>()
                    .ok_or_else(|| self.type_mismatch(index))?
                    .clone();
                (base, queue)
            }
            _ => (initial, Rc::new(UpdateQueue::new(Rc::clone(self.signal)))),
        };
        let (value, consumed) = queue.replay(base);
        self.slots.push(HookSlot::State {
            state: Rc::new(value.clone()),
            queue: Rc::clone(&queue) as Rc<dyn PendingQueue>,
            consumed,
        });
        Ok((value, Dispatch { queue }))
    }

    /// `use_state` whose dispatch feeds actions through `reducer`.
    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        initial: S,
    ) -> Result<(S, Reducer<S, A>), HookError>
    where
        S: Clone + 'static,
        A: Clone + 'static,
    {
        let (state, dispatch) = self.use_state(initial)?;
        Ok((
            state,
            Reducer {
                dispatch,
                reducer: Rc::new(reducer),
            },
        ))
    }

    /// Runs `effect` after commit when `deps` differ from the previous
    /// render's (or on the first render).
    pub fn use_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        effect: impl FnOnce() + 'static,
    ) -> Result<(), HookError> {
        let index = self.slots.len();
        let due = match self.previous_slot("effect")? {
            Some(HookSlot::Effect {
                deps: Some(previous),
            }) => {
                let previous = (**previous)
                    .downcast_ref::<D>()
                    .ok_or_else(|| self.type_mismatch(index))?;
                previous != &deps
            }
            _ => true,
        };
        if due {
            self.effects.push(Box::new(effect));
        }
        self.slots.push(HookSlot::Effect {
            deps: Some(Rc::new(deps)),
        });
        Ok(())
    }

    /// Runs `effect` after every commit.
    pub fn use_effect_always(&mut self, effect: impl FnOnce() + 'static) -> Result<(), HookError> {
        self.previous_slot("effect")?;
        self.effects.push(Box::new(effect));
        self.slots.push(HookSlot::Effect { deps: None });
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<HookSlot>, HookError> {
        match self.previous {
            Some(previous) if previous.len() != self.slots.len() => {
                Err(HookError::CountMismatch {
                    component: self.component.to_string(),
                    previous: previous.len(),
                    current: self.slots.len(),
                })
            }
            _ => Ok(self.slots),
        }
    }

    fn previous_slot(&self, kind: &'static str) -> Result<Option<&'a HookSlot>, HookError> {
        let index = self.slots.len();
        let Some(previous) = self.previous else {
            return Ok(None);
        };
        match previous.get(index) {
            None => Err(HookError::CountMismatch {
                component: self.component.to_string(),
                previous: previous.len(),
                current: index + 1,
            }),
            Some(slot) if slot.kind() != kind => Err(HookError::KindMismatch {
                component: self.component.to_string(),
                index,
                previous: slot.kind(),
                current: kind,
            }),
            Some(slot) => Ok(Some(slot)),
        }
    }

    fn type_mismatch(&self, index: usize) -> HookError {
        HookError::TypeMismatch {
            component: self.component.to_string(),
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::Scheduler;

    fn signal(scheduler: &Scheduler) -> Rc<UpdateSignal> {
        Rc::new(UpdateSignal::detached(scheduler.handle()))
    }

    #[test]
    fn replay_keeps_queue_until_settled() {
        let scheduler = Scheduler::new();
        let signal = signal(&scheduler);
        let mut effects = Vec::new();
        let mut hooks = Hooks::new("Counter", None, &mut effects, &signal);
        assert_eq!(hooks.component(), "Counter");
        let (count, set_count) = hooks.use_state(100).expect("state");
        assert_eq!(count, 100);
        let mut slots = hooks.finish().expect("slots");

        set_count.update(|c| c + 1);
        set_count.set(7);

        let mut hooks = Hooks::new("Counter", Some(&slots), &mut effects, &signal);
        let (count, again) = hooks.use_state(100).expect("state");
        assert_eq!(count, 7);
        assert!(again.ptr_eq(&set_count));
        let mut next = hooks.finish().expect("slots");

        // The discarded first generation still sees the whole queue.
        let mut hooks = Hooks::new("Counter", Some(&slots), &mut effects, &signal);
        assert_eq!(hooks.use_state(100).expect("state").0, 7);

        next.iter_mut().for_each(HookSlot::settle);
        slots = next;
        let mut hooks = Hooks::new("Counter", Some(&slots), &mut effects, &signal);
        assert_eq!(hooks.use_state(100).expect("state").0, 7);
        assert_eq!(set_count.queue.pending.borrow().len(), 0);
    }

    #[test]
    fn effects_run_only_when_deps_change() {
        let scheduler = Scheduler::new();
        let signal = signal(&scheduler);
        let mut effects = Vec::new();
        let mut hooks = Hooks::new("Effects", None, &mut effects, &signal);
        hooks.use_effect(1, || {}).expect("effect");
        let slots = hooks.finish().expect("slots");
        assert_eq!(effects.len(), 1);

        effects.clear();
        let mut hooks = Hooks::new("Effects", Some(&slots), &mut effects, &signal);
        hooks.use_effect(1, || {}).expect("effect");
        hooks.finish().expect("slots");
        assert!(effects.is_empty());

        let mut hooks = Hooks::new("Effects", Some(&slots), &mut effects, &signal);
        hooks.use_effect(2, || {}).expect("effect");
        hooks.finish().expect("slots");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn misuse_is_reported() {
        let scheduler = Scheduler::new();
        let signal = signal(&scheduler);
        let mut effects = Vec::new();
        let mut hooks = Hooks::new("App", None, &mut effects, &signal);
        hooks.use_state(0u8).expect("state");
        let slots = hooks.finish().expect("slots");

        let mut hooks = Hooks::new("App", Some(&slots), &mut effects, &signal);
        assert!(matches!(
            hooks.use_effect((), || {}),
            Err(HookError::KindMismatch { index: 0, .. })
        ));

        let mut hooks = Hooks::new("App", Some(&slots), &mut effects, &signal);
        assert!(matches!(
            hooks.use_state("text"),
            Err(HookError::TypeMismatch { index: 0, .. })
        ));

        let hooks = Hooks::new("App", Some(&slots), &mut effects, &signal);
        assert_eq!(
            hooks.finish().err(),
            Some(HookError::CountMismatch {
                component: "App".to_string(),
                previous: 1,
                current: 0,
            })
        );
    }
}
