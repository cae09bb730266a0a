//! Overlay panel lifecycle: one open instance per uid, host draw handlers and
//! timers, and the modal event loop.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::Settings;
use crate::context::{HostContext, RegionId};
use crate::errors::HostError;
use crate::hit_test::HitTestManager;
use crate::hotkey::Key;
use crate::layout::{GpuLayout, LayoutAction, PanelStateStore};
use crate::math::{BoundingBox, Vector2};
use crate::render_commands::RenderCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Host services a panel needs while it is open.
pub trait PanelHost {
    /// Installs a draw callback for every region of `space_type`.
    fn add_draw_handler(&mut self, space_type: &str) -> Result<HandlerId, HostError>;
    fn remove_draw_handler(&mut self, handler: HandlerId) -> Result<(), HostError>;
    fn add_timer(&mut self, interval: f64) -> Result<TimerId, HostError>;
    fn remove_timer(&mut self, timer: TimerId) -> Result<(), HostError>;
    fn redraw(&mut self, region: RegionId);
}

/// In-process panel host. Also stands in for sessions without a window manager.
#[derive(Debug, Default)]
pub struct MemoryPanelHost {
    next: u64,
    available: bool,
    handlers: FxHashMap<HandlerId, String>,
    timers: FxHashSet<TimerId>,
    redraws: Vec<RegionId>,
    /// Makes every removal fail, after still forgetting the handle.
    pub fail_removals: bool,
}

impl MemoryPanelHost {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    pub fn headless() -> Self {
        Self::default()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn redraws(&self) -> &[RegionId] {
        &self.redraws
    }

    fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl PanelHost for MemoryPanelHost {
    fn add_draw_handler(&mut self, space_type: &str) -> Result<HandlerId, HostError> {
        if !self.available {
            return Err(HostError::Unavailable);
        }
        let id = HandlerId(self.next_id());
        self.handlers.insert(id, space_type.to_string());
        Ok(id)
    }

    fn remove_draw_handler(&mut self, handler: HandlerId) -> Result<(), HostError> {
        let removed = self.handlers.remove(&handler).is_some();
        if self.fail_removals {
            return Err(HostError::Other("draw handler removal failed".into()));
        }
        if removed { Ok(()) } else { Err(HostError::StaleHandle(handler.0)) }
    }

    fn add_timer(&mut self, _interval: f64) -> Result<TimerId, HostError> {
        if !self.available {
            return Err(HostError::Unavailable);
        }
        let id = TimerId(self.next_id());
        self.timers.insert(id);
        Ok(id)
    }

    fn remove_timer(&mut self, timer: TimerId) -> Result<(), HostError> {
        let removed = self.timers.remove(&timer);
        if self.fail_removals {
            return Err(HostError::Other("timer removal failed".into()));
        }
        if removed { Ok(()) } else { Err(HostError::StaleHandle(timer.0)) }
    }

    fn redraw(&mut self, region: RegionId) {
        self.redraws.push(region);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Session-wide registry of open panels, plus their remembered geometry.
#[derive(Debug, Default)]
pub struct ActivePanels {
    active: FxHashMap<String, PanelPhase>,
    close_requests: FxHashSet<String>,
    states: PanelStateStore,
}

impl ActivePanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, uid: &str) -> bool {
        matches!(self.active.get(uid), Some(PanelPhase::Open | PanelPhase::Opening))
    }

    pub fn phase(&self, uid: &str) -> PanelPhase {
        self.active.get(uid).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Asks the open instance of `uid` to close on its next event.
    pub fn request_close(&mut self, uid: &str) -> bool {
        if !self.is_active(uid) {
            return false;
        }
        self.close_requests.insert(uid.to_string());
        true
    }

    fn take_close_request(&mut self, uid: &str) -> bool {
        self.close_requests.remove(uid)
    }

    /// The host loaded a file. Regions may be gone, so every panel is forgotten.
    pub fn on_file_load(&mut self) {
        if !self.active.is_empty() {
            debug!("file load dropped {} active panel(s)", self.active.len());
        }
        self.active.clear();
        self.close_requests.clear();
    }

    pub fn states(&self) -> &PanelStateStore {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut PanelStateStore {
        &mut self.states
    }
}

/// Lifecycle of one panel instance.
#[derive(Debug, Clone, Default)]
pub struct PanelManager {
    uid: String,
    phase: PanelPhase,
    region: Option<RegionId>,
    handler: Option<HandlerId>,
    timer: Option<TimerId>,
}

impl PanelManager {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == PanelPhase::Open
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    /// Opens the panel for the context's region. Returns false when another
    /// instance with the same uid is open or the host cannot draw.
    pub fn open(
        &mut self,
        active: &mut ActivePanels,
        host: &mut dyn PanelHost,
        ctx: &dyn HostContext,
        timer_interval: Option<f64>,
    ) -> bool {
        if active.is_active(&self.uid) || self.phase != PanelPhase::Closed {
            return false;
        }
        self.phase = PanelPhase::Opening;
        active.active.insert(self.uid.clone(), PanelPhase::Opening);
        self.region = ctx.region();

        let space = ctx.space_type().unwrap_or("VIEW_3D");
        match host.add_draw_handler(space) {
            Ok(handler) => self.handler = Some(handler),
            Err(e) => {
                debug!("panel {} not opened: {}", self.uid, e);
                self.reset(active);
                return false;
            }
        }
        if let Some(interval) = timer_interval {
            match host.add_timer(interval) {
                Ok(timer) => self.timer = Some(timer),
                Err(e) => debug!("panel {} has no timer: {}", self.uid, e),
            }
        }

        self.phase = PanelPhase::Open;
        active.active.insert(self.uid.clone(), PanelPhase::Open);
        true
    }

    /// Tears the panel down. Idempotent, and host failures never keep the
    /// panel registered.
    pub fn close(&mut self, active: &mut ActivePanels, host: &mut dyn PanelHost) {
        if self.phase == PanelPhase::Closed {
            return;
        }
        self.phase = PanelPhase::Closing;
        if active.active.contains_key(&self.uid) {
            active.active.insert(self.uid.clone(), PanelPhase::Closing);
        }
        if let Some(handler) = self.handler.take() {
            if let Err(e) = host.remove_draw_handler(handler) {
                debug!("panel {}: draw handler removal failed: {}", self.uid, e);
            }
        }
        if let Some(timer) = self.timer.take() {
            if let Err(e) = host.remove_timer(timer) {
                debug!("panel {}: timer removal failed: {}", self.uid, e);
            }
        }
        if let Some(region) = self.region {
            host.redraw(region);
        }
        self.reset(active);
    }

    fn reset(&mut self, active: &mut ActivePanels) {
        active.active.remove(&self.uid);
        active.close_requests.remove(&self.uid);
        self.handler = None;
        self.timer = None;
        self.region = None;
        self.phase = PanelPhase::Closed;
    }

    /// True only in the region the panel was opened from.
    pub fn should_draw(&self, ctx: &dyn HostContext) -> bool {
        self.is_open() && self.region.is_some() && ctx.region() == self.region
    }
}

/// Directive returned for every modal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalResult {
    RunningModal,
    Finished,
    Cancelled,
    /// The event was not for the panel. The host should handle it.
    PassThrough,
}

/// Input delivered to a running panel. Positions are in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    PointerMove(Vector2),
    PointerDown(Vector2),
    PointerUp(Vector2),
    Key(Key),
    Timer,
}

type BuildFn = Box<dyn FnMut(&mut GpuLayout)>;

/// A floating, layout-drawn panel driven as a modal operator.
pub struct OverlayPanel {
    manager: PanelManager,
    layout: GpuLayout,
    hits: HitTestManager,
    build: BuildFn,
    timer_interval: Option<f64>,
    pointer_down: bool,
    clicked: Vec<String>,
}

impl OverlayPanel {
    pub fn new(uid: impl Into<String>, build: impl FnMut(&mut GpuLayout) + 'static) -> Self {
        let uid = uid.into();
        Self {
            manager: PanelManager::new(uid.clone()),
            layout: GpuLayout::new(uid),
            hits: HitTestManager::new(),
            build: Box::new(build),
            timer_interval: None,
            pointer_down: false,
            clicked: Vec::new(),
        }
    }

    /// Applies the session's panel margin and initial UI scale.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.layout.set_margin(settings.panel_margin);
        self.layout.set_ui_scale(settings.ui_scale);
        self
    }

    pub fn with_timer(mut self, interval: f64) -> Self {
        self.timer_interval = Some(interval);
        self
    }

    pub fn uid(&self) -> &str {
        self.manager.uid()
    }

    pub fn manager(&self) -> &PanelManager {
        &self.manager
    }

    pub fn layout(&self) -> &GpuLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut GpuLayout {
        &mut self.layout
    }

    /// Region size in device pixels.
    pub fn set_region_bounds(&mut self, bounds: BoundingBox) {
        self.layout.set_region_bounds(bounds);
    }

    /// Button ids clicked since the last call.
    pub fn take_clicks(&mut self) -> Vec<String> {
        std::mem::take(&mut self.clicked)
    }

    /// Opens the panel at `cursor` unless geometry was saved for its uid.
    /// A second instance of an open uid asks the first one to close instead.
    pub fn invoke(
        &mut self,
        active: &mut ActivePanels,
        host: &mut dyn PanelHost,
        ctx: &dyn HostContext,
        cursor: Vector2,
    ) -> ModalResult {
        if active.is_active(self.uid()) {
            active.request_close(self.uid());
            return ModalResult::Cancelled;
        }
        if !self.manager.open(active, host, ctx, self.timer_interval) {
            return ModalResult::Cancelled;
        }
        let scale = ctx.ui_scale();
        self.layout.set_ui_scale(scale);
        if !self.layout.restore_state(active.states()) {
            self.layout.set_position(cursor.x / scale, cursor.y / scale);
        }
        self.pointer_down = false;
        self.clicked.clear();
        ModalResult::RunningModal
    }

    /// Handles one event while the panel is open.
    pub fn modal(
        &mut self,
        active: &mut ActivePanels,
        host: &mut dyn PanelHost,
        event: PanelEvent,
    ) -> ModalResult {
        if !self.manager.is_open() {
            return ModalResult::Cancelled;
        }
        if active.take_close_request(self.uid()) || !active.is_active(self.uid()) {
            return self.cancel(active, host);
        }
        match event {
            PanelEvent::Key(Key::Esc) => self.cancel(active, host),
            PanelEvent::Key(Key::Ret | Key::NumpadEnter) => self.finish(active, host),
            PanelEvent::Key(_) => ModalResult::PassThrough,
            PanelEvent::Timer => {
                self.request_redraw(host);
                ModalResult::RunningModal
            }
            PanelEvent::PointerMove(at) => self.pointer(active, host, at, self.pointer_down),
            PanelEvent::PointerDown(at) => self.pointer(active, host, at, true),
            PanelEvent::PointerUp(at) => self.pointer(active, host, at, false),
        }
    }

    fn pointer(
        &mut self,
        active: &mut ActivePanels,
        host: &mut dyn PanelHost,
        at: Vector2,
        down: bool,
    ) -> ModalResult {
        let was_engaged = self.hits.is_dragging();
        self.pointer_down = down;
        let events = self.hits.set_pointer_state(at, down);
        let mut redraw = false;
        for action in self.layout.handle_events(&events) {
            match action {
                LayoutAction::Close => return self.finish(active, host),
                LayoutAction::Clicked(id) => {
                    self.clicked.push(id);
                    redraw = true;
                }
                LayoutAction::Moved | LayoutAction::Resized => redraw = true,
            }
        }
        if redraw {
            self.request_redraw(host);
        }
        if was_engaged || self.hits.is_dragging() || self.layout.bounds().contains(at) {
            ModalResult::RunningModal
        } else {
            ModalResult::PassThrough
        }
    }

    /// Draws into the context's region if it is the panel's own.
    pub fn draw(&mut self, ctx: &dyn HostContext) -> Option<&[RenderCommand]> {
        if !self.manager.should_draw(ctx) {
            return None;
        }
        self.layout.set_ui_scale(ctx.ui_scale());
        self.layout.clear();
        (self.build)(&mut self.layout);
        Some(self.layout.update_and_draw(&mut self.hits))
    }

    pub fn finish(&mut self, active: &mut ActivePanels, host: &mut dyn PanelHost) -> ModalResult {
        self.cleanup(active, host);
        ModalResult::Finished
    }

    pub fn cancel(&mut self, active: &mut ActivePanels, host: &mut dyn PanelHost) -> ModalResult {
        self.cleanup(active, host);
        ModalResult::Cancelled
    }

    fn cleanup(&mut self, active: &mut ActivePanels, host: &mut dyn PanelHost) {
        self.layout.save_state(active.states_mut());
        self.layout.release_hits(&mut self.hits);
        self.pointer_down = false;
        self.manager.close(active, host);
    }

    fn request_redraw(&self, host: &mut dyn PanelHost) {
        if let Some(region) = self.manager.region() {
            host.redraw(region);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;

    fn ctx(region: u64) -> StaticContext {
        StaticContext::for_region(RegionId(region))
    }

    #[test]
    fn open_rejects_duplicates_and_close_is_idempotent() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut first = PanelManager::new("tools");
        let mut second = PanelManager::new("tools");
        assert!(first.open(&mut active, &mut host, &ctx(1), Some(0.1)));
        assert!(!second.open(&mut active, &mut host, &ctx(1), None));
        assert_eq!((host.handler_count(), host.timer_count()), (1, 1));

        first.close(&mut active, &mut host);
        first.close(&mut active, &mut host);
        assert_eq!(first.phase(), PanelPhase::Closed);
        assert!(active.is_empty());
        assert_eq!(host.handler_count(), 0);
        assert_eq!(host.redraws(), &[RegionId(1)]);
        assert!(second.open(&mut active, &mut host, &ctx(2), None));
    }

    #[test]
    fn failed_teardown_still_unregisters() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = PanelManager::new("p");
        panel.open(&mut active, &mut host, &ctx(1), Some(1.0));
        host.fail_removals = true;
        panel.close(&mut active, &mut host);
        assert!(!active.is_active("p"));
        assert!(PanelManager::new("p").open(&mut active, &mut host, &ctx(1), None));
    }

    #[test]
    fn headless_host_refuses_to_open() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::headless();
        let mut panel = PanelManager::new("p");
        assert!(!panel.open(&mut active, &mut host, &StaticContext::headless(), None));
        assert_eq!(panel.phase(), PanelPhase::Closed);
        assert!(active.is_empty());
    }

    #[test]
    fn draws_only_in_its_own_region() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = PanelManager::new("p");
        panel.open(&mut active, &mut host, &ctx(7), None);
        assert!(panel.should_draw(&ctx(7)));
        assert!(!panel.should_draw(&ctx(8)));
        assert!(!panel.should_draw(&StaticContext::default()));
    }

    #[test]
    fn file_load_forgets_active_panels() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = PanelManager::new("p");
        panel.open(&mut active, &mut host, &ctx(1), None);
        active.on_file_load();
        assert!(!active.is_active("p"));
        assert!(PanelManager::new("p").open(&mut active, &mut host, &ctx(1), None));
    }

    fn overlay() -> OverlayPanel {
        let mut panel = OverlayPanel::new("overlay", |ui: &mut GpuLayout| {
            ui.set_title_bar("Overlay", true);
            ui.label("Hello");
            ui.button("go", "Go");
        });
        panel.set_region_bounds(BoundingBox::new(0.0, 0.0, 1000.0, 800.0));
        panel
    }

    #[test]
    fn second_invoke_toggles_first_closed() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut first = overlay();
        let mut second = overlay();
        let at = Vector2::new(100.0, 100.0);
        assert_eq!(first.invoke(&mut active, &mut host, &ctx(1), at), ModalResult::RunningModal);
        assert_eq!(second.invoke(&mut active, &mut host, &ctx(1), at), ModalResult::Cancelled);
        assert_eq!(first.modal(&mut active, &mut host, PanelEvent::Timer), ModalResult::Cancelled);
        assert!(active.is_empty());
        assert_eq!(host.handler_count(), 0);
    }

    #[test]
    fn modal_loop_routes_events() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = overlay();
        panel.invoke(&mut active, &mut host, &ctx(1), Vector2::new(200.0, 200.0));
        assert!(panel.draw(&ctx(2)).is_none());
        assert!(panel.draw(&ctx(1)).is_some());

        let outside = Vector2::new(5.0, 790.0);
        assert_eq!(panel.modal(&mut active, &mut host, PanelEvent::PointerMove(outside)), ModalResult::PassThrough);
        assert_eq!(panel.modal(&mut active, &mut host, PanelEvent::Key(Key::A)), ModalResult::PassThrough);

        let bounds = panel.layout().bounds();
        let title = Vector2::new(bounds.x + 5.0, bounds.y + 5.0);
        assert_eq!(panel.modal(&mut active, &mut host, PanelEvent::PointerDown(title)), ModalResult::RunningModal);
        let moved = Vector2::new(title.x + 40.0, title.y + 10.0);
        assert_eq!(panel.modal(&mut active, &mut host, PanelEvent::PointerMove(moved)), ModalResult::RunningModal);
        panel.modal(&mut active, &mut host, PanelEvent::PointerUp(moved));
        assert_eq!(panel.layout().state().x, 240.0);

        assert_eq!(panel.modal(&mut active, &mut host, PanelEvent::Key(Key::Esc)), ModalResult::Cancelled);
        assert!(active.is_empty());
        assert_eq!(active.states().get("overlay").map(|s| s.x), Some(240.0));
    }

    #[test]
    fn reopen_restores_saved_position_until_reset() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = overlay();
        panel.invoke(&mut active, &mut host, &ctx(1), Vector2::new(300.0, 300.0));
        panel.finish(&mut active, &mut host);

        panel.invoke(&mut active, &mut host, &ctx(1), Vector2::new(50.0, 50.0));
        assert_eq!(panel.layout().state().x, 300.0);
        panel.cancel(&mut active, &mut host);

        active.states_mut().reset("overlay");
        panel.invoke(&mut active, &mut host, &ctx(1), Vector2::new(50.0, 50.0));
        assert_eq!(panel.layout().state().x, 50.0);
    }

    #[test]
    fn button_clicks_are_collected() {
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = overlay();
        panel.invoke(&mut active, &mut host, &ctx(1), Vector2::new(100.0, 100.0));
        panel.draw(&ctx(1));
        let go = panel.hits.get("overlay:btn:go").map(|r| r.bounds).unwrap();
        let inside = Vector2::new(go.x + 1.0, go.y + 1.0);
        panel.modal(&mut active, &mut host, PanelEvent::PointerDown(inside));
        panel.modal(&mut active, &mut host, PanelEvent::PointerUp(inside));
        assert_eq!(panel.take_clicks(), vec!["go".to_string()]);
        assert!(panel.take_clicks().is_empty());
    }

    #[test]
    fn settings_drive_margin_and_scale() {
        let settings = Settings {
            panel_margin: 30.0,
            ui_scale: 2.0,
            ..Settings::default()
        };
        let mut active = ActivePanels::new();
        let mut host = MemoryPanelHost::new();
        let mut panel = overlay().with_settings(&settings);
        let ctx = ctx(1).with_settings(&settings);
        panel.invoke(&mut active, &mut host, &ctx, Vector2::new(0.0, 0.0));
        panel.draw(&ctx);
        assert_eq!((panel.layout().state().x, panel.layout().state().y), (30.0, 30.0));
        assert_eq!(panel.layout().bounds().x, 60.0);
    }
}
