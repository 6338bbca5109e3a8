//! [`Scheduler`] on browser timers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lf_core::{Deferral, Job, Scheduler, TaskId};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{IdleRequestOptions, Node, Window};

/// Receives jobs when their deferral elapses.
pub type Dispatch = Rc<dyn Fn(Job<Node>)>;

/// Slot filled in once the owner of the scanner exists.
pub type DispatchSlot = Rc<RefCell<Option<Dispatch>>>;

#[derive(Debug, Clone, Copy)]
enum Handle {
    Idle(u32),
    Timeout(i32),
    Frame(i32),
}

/// An armed browser callback. Dropping it frees the JS function.
struct Armed {
    handle: Handle,
    _callback: Closure<dyn FnMut()>,
}

/// Idle callbacks with a timeout ceiling when available, plain timers
/// otherwise, and animation frames.
pub struct BrowserScheduler {
    window: Window,
    has_idle_callback: bool,
    dispatch: DispatchSlot,
    handles: Rc<RefCell<HashMap<TaskId, Armed>>>,
    next_id: u64,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        let has_idle_callback = js_sys::Reflect::get(&window, &"requestIdleCallback".into())
            .map(|f| f.is_function())
            .unwrap_or(false);
        Self {
            window,
            has_idle_callback,
            dispatch: Rc::new(RefCell::new(None)),
            handles: Rc::new(RefCell::new(HashMap::new())),
            next_id: 0,
        }
    }

    pub fn dispatch_slot(&self) -> DispatchSlot {
        self.dispatch.clone()
    }

    /// Callbacks armed and not yet fired or cancelled.
    pub fn armed_count(&self) -> usize {
        self.handles.borrow().len()
    }

    fn arm(&self, when: Deferral, callback: &js_sys::Function) -> Result<Handle, JsValue> {
        match when {
            Deferral::Idle { timeout_ms, .. } if self.has_idle_callback => {
                let options = IdleRequestOptions::new();
                options.set_timeout(timeout_ms);
                self.window
                    .request_idle_callback_with_options(callback, &options)
                    .map(Handle::Idle)
            }
            Deferral::Idle { fallback_ms, .. } => self.timeout(callback, fallback_ms),
            Deferral::Delay(ms) => self.timeout(callback, ms),
            Deferral::AnimationFrame => self.window.request_animation_frame(callback).map(Handle::Frame),
        }
    }

    fn timeout(&self, callback: &js_sys::Function, ms: u32) -> Result<Handle, JsValue> {
        let ms = i32::try_from(ms).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback, ms)
            .map(Handle::Timeout)
    }
}

impl Scheduler<Node> for BrowserScheduler {
    fn schedule(&mut self, when: Deferral, job: Job<Node>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let handles = self.handles.clone();
        let dispatch = self.dispatch.clone();
        let callback = Closure::once(move || {
            // Freed by the bindings once this call returns
            let _armed = handles.borrow_mut().remove(&id);
            let target = dispatch.borrow().clone();
            if let Some(target) = target {
                target(job);
            }
        });

        match self.arm(when, callback.as_ref().unchecked_ref()) {
            Ok(handle) => {
                self.handles.borrow_mut().insert(
                    id,
                    Armed {
                        handle,
                        _callback: callback,
                    },
                );
            }
            Err(e) => warn!("Failed to schedule {when:?}: {e:?}"),
        }
        id
    }

    fn cancel(&mut self, task: TaskId) {
        let Some(armed) = self.handles.borrow_mut().remove(&task) else {
            return;
        };
        match armed.handle {
            Handle::Idle(h) => self.window.cancel_idle_callback(h),
            Handle::Timeout(h) => self.window.clear_timeout_with_handle(h),
            Handle::Frame(h) => {
                let _ = self.window.cancel_animation_frame(h);
            }
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
