//! Narrow seam to the presentation layer. The core describes visual effects
//! and render requests; it never reads layout state back, other than being
//! told which element handles are currently visible (scroll reveal).

use std::sync::Mutex;

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::models::{Discussion, Notification, Story};

/// Opaque handle to a rendered element, minted by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub Uuid);

impl ElementHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    OutCubic,
    Linear,
}

/// One animated property and its keyframe values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub property: Property,
    pub frames: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSpec {
    pub tweens: Vec<Tween>,
    pub duration_ms: u64,
    pub easing: Easing,
    pub delay_ms: u64,
}

impl AnimationSpec {
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

fn spec(tweens: Vec<Tween>, duration_ms: u64) -> AnimationSpec {
    AnimationSpec { tweens, duration_ms, easing: Easing::OutCubic, delay_ms: 0 }
}

/// Fade-and-rise entrance used for scroll reveal and new records.
pub static REVEAL: Lazy<AnimationSpec> = Lazy::new(|| {
    spec(
        vec![
            Tween { property: Property::Opacity, frames: vec![0.0, 1.0] },
            Tween { property: Property::TranslateY, frames: vec![30.0, 0.0] },
        ],
        600,
    )
});

/// Quick pulse acknowledging a vote tap.
pub static VOTE_POP: Lazy<AnimationSpec> = Lazy::new(|| {
    spec(vec![Tween { property: Property::Scale, frames: vec![1.0, 1.2, 1.0] }], 300)
});

/// Softer pulse for a chosen poll option.
pub static OPTION_PULSE: Lazy<AnimationSpec> = Lazy::new(|| {
    spec(vec![Tween { property: Property::Scale, frames: vec![1.0, 1.05, 1.0] }], 400)
});

/// Slide-in used when a notification appears.
pub static SLIDE_IN: Lazy<AnimationSpec> = Lazy::new(|| {
    spec(
        vec![
            Tween { property: Property::TranslateX, frames: vec![-300.0, 0.0] },
            Tween { property: Property::Opacity, frames: vec![0.0, 1.0] },
        ],
        300,
    )
});

/// Record data handed to `render`.
#[derive(Debug, Clone)]
pub enum RenderRecord<'a> {
    Story(&'a Story),
    Discussion(&'a Discussion),
    Notification(&'a Notification),
}

pub trait Presenter: Send + Sync {
    /// Fire-and-forget visual effect on an already-rendered element.
    fn animate(&self, target: ElementHandle, animation: &AnimationSpec);

    /// Render a record into the named container, returning its handle.
    fn render(&self, container: &str, record: RenderRecord<'_>) -> ElementHandle;
}

/// Presenter that does nothing. Used when the core runs headless.
#[derive(Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn animate(&self, _target: ElementHandle, _animation: &AnimationSpec) {}

    fn render(&self, _container: &str, _record: RenderRecord<'_>) -> ElementHandle {
        ElementHandle::new()
    }
}

/// Test double that records every call.
#[derive(Default)]
pub struct RecordingPresenter {
    pub animations: Mutex<Vec<(ElementHandle, AnimationSpec)>>,
    pub renders: Mutex<Vec<(String, String)>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animation_count(&self) -> usize {
        self.animations.lock().unwrap().len()
    }

    pub fn rendered_into(&self, container: &str) -> Vec<String> {
        self.renders
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == container)
            .map(|(_, what)| what.clone())
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn animate(&self, target: ElementHandle, animation: &AnimationSpec) {
        self.animations.lock().unwrap().push((target, animation.clone()));
    }

    fn render(&self, container: &str, record: RenderRecord<'_>) -> ElementHandle {
        let what = match record {
            RenderRecord::Story(s) => format!("story:{}", s.title),
            RenderRecord::Discussion(d) => format!("discussion:{}", d.title),
            RenderRecord::Notification(n) => format!("notification:{}", n.message),
        };
        self.renders.lock().unwrap().push((container.to_string(), what));
        ElementHandle::new()
    }
}
