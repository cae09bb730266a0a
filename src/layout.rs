//! Immediate-mode panel layout.
//!
//! Widget calls only record elements and grow their container's size
//! estimate. [`GpuLayout::update_and_draw`] then places the tree, clamps the
//! panel into its region, refreshes chrome hit rects and emits render
//! commands in device pixels. Everything stored is in logical units and is
//! scaled at draw time.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::Settings;
use crate::hit_test::{HitEvent, HitTestManager};
use crate::math::{BoundingBox, Dimensions};
use crate::render_commands::{Border, Icon, Rectangle, RenderCommand, RenderCommandConfig, Text};
use crate::style::{Style, StyleCache, Theme};
use crate::text::{estimate_text, MeasureTextFn};

/// How a container distributes its children across its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Stretches children to share the slack evenly.
    #[default]
    Expand,
    Center,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Column,
    Row,
}

#[derive(Debug, Clone)]
enum Widget {
    Container {
        direction: Direction,
        gap: f32,
        boxed: bool,
        alignment: Alignment,
    },
    Label {
        text: String,
        icon: Option<String>,
    },
    Prop {
        text: String,
        value: String,
    },
    Button {
        id: String,
        text: String,
    },
    Separator,
}

#[derive(Debug, Clone)]
struct Element {
    widget: Widget,
    children: Vec<usize>,
    size: Dimensions,
    bounds: BoundingBox,
}

impl Element {
    fn new(widget: Widget, size: Dimensions) -> Self {
        Self {
            widget,
            children: Vec::new(),
            size,
            bounds: BoundingBox::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelConfig {
    pub min_width: f32,
    pub draggable: bool,
    pub resizable: bool,
    pub z_index: i16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_width: 120.0,
            draggable: true,
            resizable: false,
            z_index: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TitleBar {
    text: String,
    closable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Chrome {
    title: Option<BoundingBox>,
    close: Option<BoundingBox>,
    resize: Option<BoundingBox>,
}

/// What the panel did in response to pointer events.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutAction {
    Moved,
    Resized,
    Close,
    /// A button registered with this id was clicked.
    Clicked(String),
}

/// Panel geometry in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelState {
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Session-scoped panel geometry keyed by a caller-chosen uid.
#[derive(Debug, Clone, Default)]
pub struct PanelStateStore {
    states: FxHashMap<String, PanelState>,
}

impl PanelStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: &str) -> Option<PanelState> {
        self.states.get(uid).copied()
    }

    pub fn set(&mut self, uid: impl Into<String>, state: PanelState) {
        self.states.insert(uid.into(), state);
    }

    pub fn reset(&mut self, uid: &str) -> bool {
        self.states.remove(uid).is_some()
    }

    pub fn reset_all(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

const ROOT: usize = 0;
const RESIZE_HANDLE: f32 = 12.0;
const CLOSE_ICON: &str = "PANEL_CLOSE";

pub struct GpuLayout {
    uid: String,
    elements: Vec<Element>,
    stack: Vec<usize>,
    styles: StyleCache,
    measure_text: MeasureTextFn,
    title: Option<TitleBar>,
    config: PanelConfig,
    region: Option<BoundingBox>,
    margin: f32,
    ui_scale: f32,
    state: PanelState,
    bounds: BoundingBox,
    chrome: Chrome,
    buttons: FxHashSet<String>,
    commands: Vec<RenderCommand>,
}

impl GpuLayout {
    pub fn new(uid: impl Into<String>) -> Self {
        let mut layout = Self {
            uid: uid.into(),
            elements: Vec::new(),
            stack: Vec::new(),
            styles: StyleCache::new(Theme::default()),
            measure_text: Box::new(estimate_text),
            title: None,
            config: PanelConfig::default(),
            region: None,
            margin: 10.0,
            ui_scale: 1.0,
            state: PanelState::default(),
            bounds: BoundingBox::default(),
            chrome: Chrome::default(),
            buttons: FxHashSet::default(),
            commands: Vec::new(),
        };
        layout.clear();
        layout
    }

    /// Layout using the session's edge margin and initial UI scale.
    pub fn with_settings(uid: impl Into<String>, settings: &Settings) -> Self {
        let mut layout = Self::new(uid);
        layout.set_margin(settings.panel_margin);
        layout.set_ui_scale(settings.ui_scale);
        layout
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn set_measure_text_function(&mut self, f: MeasureTextFn) {
        self.measure_text = f;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.styles.set_theme(theme);
    }

    pub fn set_ui_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.ui_scale = scale;
        }
    }

    pub fn set_title_bar(&mut self, text: impl Into<String>, closable: bool) {
        self.title = Some(TitleBar {
            text: text.into(),
            closable,
        });
    }

    pub fn set_panel_config(&mut self, config: PanelConfig) {
        self.config = config;
    }

    /// Region the panel is clamped into, in device pixels.
    pub fn set_region_bounds(&mut self, bounds: BoundingBox) {
        self.region = Some(bounds);
    }

    /// Minimum distance to the region edge, in logical units.
    pub fn set_margin(&mut self, margin: f32) {
        self.margin = margin.max(0.0);
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Panel position relative to the region's top-left corner, in logical units.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.state.x = x;
        self.state.y = y;
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Restores geometry saved under this layout's uid.
    pub fn restore_state(&mut self, store: &PanelStateStore) -> bool {
        match store.get(&self.uid) {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    pub fn save_state(&self, store: &mut PanelStateStore) {
        store.set(self.uid.clone(), self.state);
    }

    /// Panel bounds of the last draw, in device pixels.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drops every element so the content can be rebuilt. Chrome and geometry stay.
    pub fn clear(&mut self) {
        let gap = self.styles.get("label").spacing;
        self.elements.clear();
        self.elements.push(Element::new(
            Widget::Container {
                direction: Direction::Column,
                gap,
                boxed: false,
                alignment: Alignment::Expand,
            },
            Dimensions::default(),
        ));
        self.stack.clear();
    }

    /// Measured content size of the root, in logical units.
    pub fn content_size(&self) -> Dimensions {
        self.elements[ROOT].size
    }

    pub fn label(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let style = self.styles.get("label");
        let measured = (self.measure_text)(&text, &style.text);
        let size = Dimensions::new(measured.width + style.padding, style.height);
        self.push(Widget::Label { text, icon: None }, size);
        self
    }

    pub fn icon_label(&mut self, icon: impl Into<String>, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let style = self.styles.get("label");
        let measured = (self.measure_text)(&text, &style.text);
        let width = icon_size(&style) + style.spacing + measured.width + style.padding;
        self.push(
            Widget::Label {
                text,
                icon: Some(icon.into()),
            },
            Dimensions::new(width, style.height),
        );
        self
    }

    /// A property row: label followed by its current value in a field.
    pub fn prop(&mut self, text: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (text, value) = (text.into(), value.into());
        let style = self.styles.get("button");
        let label = (self.measure_text)(&text, &style.text);
        let field = (self.measure_text)(&value, &style.text);
        let width = label.width + style.spacing + field.width + 2.0 * style.padding;
        self.push(Widget::Prop { text, value }, Dimensions::new(width, style.height));
        self
    }

    /// A clickable button. Clicks come back as [`LayoutAction::Clicked`] with `id`.
    pub fn button(&mut self, id: impl Into<String>, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let style = self.styles.get("button");
        let measured = (self.measure_text)(&text, &style.text);
        let size = Dimensions::new(measured.width + 2.0 * style.padding, style.height);
        self.push(Widget::Button { id: id.into(), text }, size);
        self
    }

    pub fn separator(&mut self) -> &mut Self {
        let extent = self.styles.get("separator").height;
        let size = match self.direction_of(self.current()) {
            Direction::Column => Dimensions::new(0.0, extent),
            Direction::Row => Dimensions::new(extent, 0.0),
        };
        self.push(Widget::Separator, size);
        self
    }

    /// Horizontal container. Aligned rows have no gap between items.
    pub fn row(&mut self, align: bool, f: impl FnOnce(&mut Self)) -> &mut Self {
        let gap = if align { 0.0 } else { self.styles.get("label").spacing };
        self.container(Direction::Row, gap, false, f)
    }

    pub fn column(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        let gap = self.styles.get("label").spacing;
        self.container(Direction::Column, gap, false, f)
    }

    /// Column drawn with a framed background.
    pub fn box_(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        let gap = self.styles.get("label").spacing;
        self.container(Direction::Column, gap, true, f)
    }

    /// Sets how the current container distributes its children.
    pub fn alignment(&mut self, alignment: Alignment) -> &mut Self {
        let current = self.current();
        if let Widget::Container { alignment: a, .. } = &mut self.elements[current].widget {
            *a = alignment;
        }
        self
    }

    fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    fn direction_of(&self, index: usize) -> Direction {
        match self.elements[index].widget {
            Widget::Container { direction, .. } => direction,
            _ => Direction::Column,
        }
    }

    fn push(&mut self, widget: Widget, size: Dimensions) -> usize {
        let parent = self.current();
        let index = self.elements.len();
        self.elements.push(Element::new(widget, size));
        self.elements[parent].children.push(index);
        self.grow(parent, size);
        index
    }

    fn container(&mut self, direction: Direction, gap: f32, boxed: bool, f: impl FnOnce(&mut Self)) -> &mut Self {
        let parent = self.current();
        let index = self.elements.len();
        self.elements.push(Element::new(
            Widget::Container {
                direction,
                gap,
                boxed,
                alignment: Alignment::Expand,
            },
            Dimensions::default(),
        ));
        self.elements[parent].children.push(index);
        self.stack.push(index);
        f(self);
        self.stack.pop();

        if boxed {
            let padding = self.styles.get("box").padding;
            let size = &mut self.elements[index].size;
            size.width += 2.0 * padding;
            size.height += 2.0 * padding;
        }
        let size = self.elements[index].size;
        self.grow(parent, size);
        self
    }

    /// Adds the newest child's extent to the container's running estimate.
    fn grow(&mut self, index: usize, child: Dimensions) {
        let element = &mut self.elements[index];
        let Widget::Container { direction, gap, .. } = element.widget else {
            return;
        };
        let gap = if element.children.len() > 1 { gap } else { 0.0 };
        match direction {
            Direction::Column => {
                element.size.width = element.size.width.max(child.width);
                element.size.height += gap + child.height;
            }
            Direction::Row => {
                element.size.width += gap + child.width;
                element.size.height = element.size.height.max(child.height);
            }
        }
    }

    /// Panel size in logical units, including chrome.
    fn panel_size(&mut self) -> (Dimensions, f32) {
        let panel = self.styles.get("panel");
        let content = self.content_size();
        let mut width = content.width + 2.0 * panel.padding;
        let mut title_height = 0.0;
        if let Some(title) = &self.title {
            let style = self.styles.get("title");
            title_height = style.height;
            let text = (self.measure_text)(&title.text, &style.text).width;
            let close = if title.closable { style.height } else { 0.0 };
            width = width.max(text + close + 2.0 * style.padding);
        }
        width = width.max(self.config.min_width);
        if let Some(w) = self.state.width {
            width = width.max(w);
        }
        let mut height = title_height + content.height + 2.0 * panel.padding;
        if let Some(h) = self.state.height {
            height = height.max(h);
        }
        (Dimensions::new(width, height), title_height)
    }

    /// Keeps the panel inside the region. Content may overflow the bottom edge,
    /// the title bar may not.
    fn clamp(&mut self, size: Dimensions, title_height: f32) {
        let Some(region) = self.region else {
            return;
        };
        let scale = self.ui_scale;
        let (region_w, region_h) = (region.width / scale, region.height / scale);
        let m = self.margin;
        let visible = if title_height > 0.0 {
            title_height
        } else {
            size.height.min(self.styles.get("label").height)
        };
        let max_x = (region_w - m - size.width).max(m);
        let max_y = (region_h - m - visible).max(m);
        self.state.x = self.state.x.clamp(m, max_x);
        self.state.y = self.state.y.clamp(m, max_y);
    }

    fn origin(&self) -> (f32, f32) {
        self.region.map_or((0.0, 0.0), |r| (r.x, r.y))
    }

    fn to_device(&self, bounds: BoundingBox) -> BoundingBox {
        let (ox, oy) = self.origin();
        bounds.scaled(self.ui_scale).offset(ox, oy)
    }

    /// Places every element, refreshes hit rects and rebuilds the command list.
    pub fn update_and_draw(&mut self, hits: &mut HitTestManager) -> &[RenderCommand] {
        self.commands.clear();
        let (size, title_height) = self.panel_size();
        self.clamp(size, title_height);

        let panel = BoundingBox::new(self.state.x, self.state.y, size.width, size.height);
        self.bounds = self.to_device(panel);
        let z = self.config.z_index;

        let style = self.styles.get("panel");
        self.emit_rect(panel, style.background, style.corner_radius, 0, z);
        self.emit_border(panel, style.outline, style.corner_radius, 0, z);
        self.draw_chrome(panel, title_height);

        let content = BoundingBox::new(
            panel.x + style.padding,
            panel.y + title_height + style.padding,
            (panel.width - 2.0 * style.padding).max(0.0),
            self.content_size().height,
        );
        let mut seen = FxHashSet::default();
        self.place(ROOT, content, &mut seen);
        self.sync_hits(hits, seen);
        &self.commands
    }

    fn draw_chrome(&mut self, panel: BoundingBox, title_height: f32) {
        self.chrome = Chrome::default();
        let z = self.config.z_index;
        if let Some(title) = self.title.clone() {
            let style = self.styles.get("title");
            let bar = BoundingBox::new(panel.x, panel.y, panel.width, title_height);
            self.chrome.title = Some(bar);
            self.emit_rect(bar, style.background, style.corner_radius, 0, z);
            let mut text_box = bar;
            text_box.x += style.padding;
            self.emit_text(text_box, &title.text, &style, 0, z);
            if title.closable {
                let close = BoundingBox::new(bar.right() - title_height, bar.y, title_height, title_height).inset(2.0);
                self.chrome.close = Some(close);
                self.emit_icon(close, CLOSE_ICON, &style, 0, z + 1);
            }
        }
        if self.config.resizable {
            let handle = BoundingBox::new(
                panel.right() - RESIZE_HANDLE,
                panel.bottom() - RESIZE_HANDLE,
                RESIZE_HANDLE,
                RESIZE_HANDLE,
            );
            self.chrome.resize = Some(handle);
            let style = self.styles.get("panel");
            self.emit_rect(handle, style.outline, 0.0, 0, z + 1);
        }
    }

    fn place(&mut self, index: usize, bounds: BoundingBox, seen: &mut FxHashSet<String>) {
        self.elements[index].bounds = bounds;
        let id = index as u32 + 1;
        let z = self.config.z_index;
        match self.elements[index].widget.clone() {
            Widget::Container {
                direction,
                gap,
                boxed,
                alignment,
            } => {
                let mut inner = bounds;
                if boxed {
                    let style = self.styles.get("box");
                    self.emit_rect(bounds, style.background, style.corner_radius, id, z);
                    self.emit_border(bounds, style.outline, style.corner_radius, id, z);
                    inner = bounds.inset(style.padding);
                }
                let children = self.elements[index].children.clone();
                for (child, child_bounds) in self.distribute(&children, inner, direction, gap, alignment) {
                    self.place(child, child_bounds, seen);
                }
            }
            Widget::Label { text, icon } => {
                let style = self.styles.get("label");
                let mut text_box = bounds;
                text_box.x += style.padding * 0.5;
                if let Some(icon) = icon {
                    let size = icon_size(&style);
                    let icon_box = BoundingBox::new(
                        text_box.x,
                        bounds.y + (bounds.height - size) * 0.5,
                        size,
                        size,
                    );
                    self.emit_icon(icon_box, &icon, &style, id, z);
                    text_box.x += size + style.spacing;
                }
                self.emit_text(text_box, &text, &style, id, z);
            }
            Widget::Prop { text, value } => {
                let style = self.styles.get("button");
                let label_width = (self.measure_text)(&text, &style.text).width + style.padding;
                let mut label_box = bounds;
                label_box.x += style.padding * 0.5;
                self.emit_text(label_box, &text, &style, id, z);
                let field_x = bounds.x + label_width + style.spacing;
                let field = BoundingBox::new(field_x, bounds.y, (bounds.right() - field_x).max(0.0), bounds.height);
                self.emit_rect(field, style.background.shade(-30.0), style.corner_radius, id, z);
                let mut value_box = field;
                value_box.x += style.padding * 0.5;
                self.emit_text(value_box, &value, &style, id, z);
            }
            Widget::Button { id: name, text } => {
                let style = self.styles.get("button");
                self.emit_rect(bounds, style.background, style.corner_radius, id, z);
                let width = (self.measure_text)(&text, &style.text).width;
                let mut text_box = bounds;
                text_box.x += ((bounds.width - width) * 0.5).max(0.0);
                self.emit_text(text_box, &text, &style, id, z);
                seen.insert(name);
            }
            Widget::Separator => {
                let style = self.styles.get("separator");
                let line = if bounds.height >= bounds.width {
                    BoundingBox::new(bounds.x + bounds.width * 0.5, bounds.y, 1.0, bounds.height)
                } else {
                    BoundingBox::new(bounds.x, bounds.y + bounds.height * 0.5, bounds.width, 1.0)
                };
                self.emit_rect(line, style.background, 0.0, id, z);
            }
        }
    }

    /// Child bounds along the container's main axis.
    fn distribute(
        &self,
        children: &[usize],
        inner: BoundingBox,
        direction: Direction,
        gap: f32,
        alignment: Alignment,
    ) -> Vec<(usize, BoundingBox)> {
        let mut placed = Vec::with_capacity(children.len());
        match direction {
            Direction::Column => {
                let mut y = inner.y;
                for &child in children {
                    let size = self.elements[child].size;
                    let width = match alignment {
                        Alignment::Expand => inner.width,
                        _ => size.width.min(inner.width),
                    };
                    let x = anchor(inner.x, inner.width, width, alignment);
                    placed.push((child, BoundingBox::new(x, y, width, size.height)));
                    y += size.height + gap;
                }
            }
            Direction::Row => {
                let count = children.len() as f32;
                let used: f32 = children.iter().map(|&c| self.elements[c].size.width).sum::<f32>()
                    + gap * (count - 1.0).max(0.0);
                let slack = (inner.width - used).max(0.0);
                let (mut x, extra) = match alignment {
                    Alignment::Expand if count > 0.0 => (inner.x, slack / count),
                    _ => (anchor(inner.x, inner.width, used.min(inner.width), alignment), 0.0),
                };
                for &child in children {
                    let size = self.elements[child].size;
                    let width = size.width + extra;
                    placed.push((child, BoundingBox::new(x, inner.y, width, inner.height.max(size.height))));
                    x += width + gap;
                }
            }
        }
        placed
    }

    fn hit_id(&self, part: &str) -> String {
        format!("{}:{}", self.uid, part)
    }

    fn button_hit_id(&self, name: &str) -> String {
        format!("{}:btn:{}", self.uid, name)
    }

    fn sync_hits(&mut self, hits: &mut HitTestManager, seen: FxHashSet<String>) {
        let z = self.config.z_index;
        let chrome = self.chrome;
        let parts = [
            ("title", chrome.title, z, self.config.draggable),
            ("close", chrome.close, z + 1, false),
            ("resize", chrome.resize, z + 1, true),
        ];
        for (part, bounds, z, draggable) in parts {
            let id = self.hit_id(part);
            match bounds {
                Some(bounds) => hits.place(&id, self.to_device(bounds), z, draggable),
                None => {
                    hits.remove(&id);
                }
            }
        }
        for index in 0..self.elements.len() {
            if let Widget::Button { id, .. } = &self.elements[index].widget {
                let hit = self.button_hit_id(id);
                hits.place(&hit, self.to_device(self.elements[index].bounds), z + 1, false);
            }
        }
        for stale in self.buttons.difference(&seen) {
            hits.remove(&self.button_hit_id(stale));
        }
        self.buttons = seen;
    }

    /// Removes every hit rect this panel registered.
    pub fn release_hits(&mut self, hits: &mut HitTestManager) {
        hits.remove_prefixed(&format!("{}:", self.uid));
        self.buttons.clear();
    }

    /// Applies pointer events addressed to this panel's chrome and buttons.
    pub fn handle_events(&mut self, events: &[HitEvent]) -> Vec<LayoutAction> {
        let title = self.hit_id("title");
        let close = self.hit_id("close");
        let resize = self.hit_id("resize");
        let button_prefix = self.hit_id("btn:");
        let scale = self.ui_scale;
        let mut actions = Vec::new();
        for event in events {
            match event {
                HitEvent::Drag { id, dx, dy, .. } if *id == title && self.config.draggable => {
                    self.state.x += dx / scale;
                    self.state.y += dy / scale;
                    actions.push(LayoutAction::Moved);
                }
                HitEvent::Drag { id, dx, dy, .. } if *id == resize => {
                    let current = self.bounds;
                    let width = self.state.width.unwrap_or(current.width / scale);
                    let height = self.state.height.unwrap_or(current.height / scale);
                    self.state.width = Some((width + dx / scale).max(self.config.min_width));
                    self.state.height = Some((height + dy / scale).max(0.0));
                    actions.push(LayoutAction::Resized);
                }
                HitEvent::Click { id } if *id == close => actions.push(LayoutAction::Close),
                HitEvent::Click { id } => {
                    if let Some(name) = id.strip_prefix(&button_prefix) {
                        actions.push(LayoutAction::Clicked(name.to_string()));
                    }
                }
                _ => {}
            }
        }
        actions
    }

    fn emit(&mut self, bounds: BoundingBox, config: RenderCommandConfig, id: u32, z_index: i16) {
        let bounding_box = self.to_device(bounds);
        self.commands.push(RenderCommand {
            bounding_box,
            config,
            id,
            z_index,
        });
    }

    fn emit_rect(&mut self, bounds: BoundingBox, color: Color, radius: f32, id: u32, z: i16) {
        if color.a <= 0.0 {
            return;
        }
        let config = RenderCommandConfig::Rectangle(Rectangle {
            color,
            corner_radius: radius * self.ui_scale,
        });
        self.emit(bounds, config, id, z);
    }

    fn emit_border(&mut self, bounds: BoundingBox, color: Color, radius: f32, id: u32, z: i16) {
        let config = RenderCommandConfig::Border(Border {
            color,
            corner_radius: radius * self.ui_scale,
            width: self.ui_scale.max(1.0),
        });
        self.emit(bounds, config, id, z);
    }

    /// Text vertically centered in `area`.
    fn emit_text(&mut self, area: BoundingBox, text: &str, style: &Rc<Style>, id: u32, z: i16) {
        if text.is_empty() {
            return;
        }
        let measured = (self.measure_text)(text, &style.text);
        let bounds = BoundingBox::new(
            area.x,
            area.y + (area.height - measured.height) * 0.5,
            measured.width,
            measured.height,
        );
        let scaled = style.text.scaled(self.ui_scale);
        let config = RenderCommandConfig::Text(Text {
            text: text.to_string(),
            color: scaled.color,
            font_id: scaled.font_id,
            font_size: scaled.font_size,
            letter_spacing: scaled.letter_spacing,
            line_height: scaled.line_height,
        });
        self.emit(bounds, config, id, z);
    }

    fn emit_icon(&mut self, bounds: BoundingBox, name: &str, style: &Rc<Style>, id: u32, z: i16) {
        let config = RenderCommandConfig::Icon(Icon {
            name: name.to_string(),
            color: style.text.color,
        });
        self.emit(bounds, config, id, z);
    }
}

fn icon_size(style: &Style) -> f32 {
    style.height * 0.8
}

fn anchor(start: f32, available: f32, used: f32, alignment: Alignment) -> f32 {
    match alignment {
        Alignment::Expand | Alignment::Left => start,
        Alignment::Center => start + (available - used) * 0.5,
        Alignment::Right => start + available - used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use crate::text::TextConfig;

    /// Ten logical units per character, twenty high.
    fn fixed_measure(text: &str, _config: &TextConfig) -> Dimensions {
        Dimensions::new(text.chars().count() as f32 * 10.0, 20.0)
    }

    fn layout() -> GpuLayout {
        let mut layout = GpuLayout::new("test");
        layout.set_measure_text_function(Box::new(fixed_measure));
        layout
    }

    fn texts(layout: &GpuLayout) -> Vec<(String, BoundingBox)> {
        layout
            .commands()
            .iter()
            .filter_map(|c| c.text().map(|t| (t.to_string(), c.bounding_box)))
            .collect()
    }

    #[test]
    fn measure_pass_accumulates_heights_and_gaps() {
        let mut ui = layout();
        ui.label("One").label("Two");
        // Two 20-unit rows and one 2-unit gap.
        assert_eq!(ui.content_size(), Dimensions::new(36.0, 42.0));

        ui.row(true, |row| {
            row.button("a", "A").button("b", "B");
        });
        ui.row(false, |row| {
            row.button("a", "A").button("b", "B");
        });
        let aligned = ui.elements[ui.elements[ROOT].children[2]].size;
        let spaced = ui.elements[ui.elements[ROOT].children[3]].size;
        assert_eq!(aligned.width, 44.0);
        assert_eq!(spaced.width, 46.0);
    }

    #[test]
    fn expand_shares_slack_between_row_children() {
        let mut ui = layout();
        ui.label("A much longer label");
        ui.row(true, |row| {
            row.button("ok", "OK").button("cancel", "Cancel");
        });
        let mut hits = HitTestManager::new();
        ui.update_and_draw(&mut hits);
        let row = ui.elements[ROOT].children[1];
        let [ok, cancel] = [ui.elements[row].children[0], ui.elements[row].children[1]];
        let (ok, cancel) = (ui.elements[ok].bounds, ui.elements[cancel].bounds);
        assert_eq!(ok.right(), cancel.x);
        assert_eq!(cancel.right(), ui.elements[row].bounds.right());
        assert_eq!(cancel.width - ok.width, 40.0);
    }

    #[test]
    fn anchored_alignment_does_not_stretch() {
        let mut ui = layout();
        ui.label("Wide enough label");
        ui.column(|col| {
            col.alignment(Alignment::Right).button("x", "X");
        });
        let mut hits = HitTestManager::new();
        ui.update_and_draw(&mut hits);
        let col = ui.elements[ROOT].children[1];
        let button = ui.elements[ui.elements[col].children[0]].bounds;
        assert_eq!(button.width, 22.0);
        assert_eq!(button.right(), ui.elements[col].bounds.right());
    }

    #[test]
    fn boxed_column_adds_padding_and_frame() {
        let mut ui = layout();
        ui.box_(|b| {
            b.label("In");
        });
        assert_eq!(ui.content_size(), Dimensions::new(32.0, 26.0));
        let mut hits = HitTestManager::new();
        let borders = ui
            .update_and_draw(&mut hits)
            .iter()
            .filter(|c| matches!(c.config, RenderCommandConfig::Border(_)))
            .count();
        assert_eq!(borders, 2);
    }

    #[test]
    fn clamp_keeps_title_bar_visible() {
        let mut ui = layout();
        ui.set_title_bar("Panel", true);
        ui.set_region_bounds(BoundingBox::new(0.0, 0.0, 800.0, 600.0));
        for _ in 0..40 {
            ui.label("row");
        }
        let mut hits = HitTestManager::new();

        ui.set_position(-100.0, -100.0);
        ui.update_and_draw(&mut hits);
        assert_eq!((ui.state().x, ui.state().y), (10.0, 10.0));

        ui.set_position(2000.0, 2000.0);
        ui.update_and_draw(&mut hits);
        let bounds = ui.bounds();
        assert_eq!(bounds.right(), 790.0);
        // Title bar ends at the margin, content hangs below the region.
        assert_eq!(bounds.y + 24.0, 590.0);
        assert!(bounds.bottom() > 600.0);
    }

    #[test]
    fn panel_margin_comes_from_settings() {
        let settings = Settings {
            panel_margin: 40.0,
            ..Settings::default()
        };
        let mut ui = GpuLayout::with_settings("test", &settings);
        ui.set_title_bar("Panel", false);
        ui.set_region_bounds(BoundingBox::new(0.0, 0.0, 800.0, 600.0));
        ui.label("row");
        let mut hits = HitTestManager::new();

        ui.set_position(-100.0, -100.0);
        ui.update_and_draw(&mut hits);
        assert_eq!((ui.state().x, ui.state().y), (40.0, 40.0));

        ui.set_position(2000.0, 0.0);
        ui.update_and_draw(&mut hits);
        assert_eq!(ui.bounds().right(), 760.0);
    }

    #[test]
    fn ui_scale_applies_at_draw_time_only() {
        let mut ui = layout();
        ui.label("Scaled");
        ui.set_position(20.0, 30.0);
        let mut hits = HitTestManager::new();
        ui.update_and_draw(&mut hits);
        let at_one = texts(&ui)[0].1;

        ui.set_ui_scale(2.0);
        ui.update_and_draw(&mut hits);
        let at_two = texts(&ui)[0].1;
        assert_eq!(at_two, at_one.scaled(2.0));
        assert_eq!((ui.state().x, ui.state().y), (20.0, 30.0));
    }

    #[test]
    fn chrome_drag_close_and_button_clicks() {
        let mut ui = layout();
        ui.set_title_bar("Tools", true);
        ui.set_region_bounds(BoundingBox::new(0.0, 0.0, 1000.0, 1000.0));
        ui.set_position(100.0, 100.0);
        ui.button("apply", "Apply");
        let mut hits = HitTestManager::new();
        ui.update_and_draw(&mut hits);
        assert!(hits.get("test:title").is_some());
        assert!(hits.get("test:close").is_some());
        assert!(hits.get("test:btn:apply").is_some());
        assert!(hits.get("test:resize").is_none());

        let grab = Vector2::new(110.0, 110.0);
        hits.set_pointer_state(grab, true);
        let events = hits.set_pointer_state(Vector2::new(140.0, 125.0), true);
        assert_eq!(ui.handle_events(&events), vec![LayoutAction::Moved]);
        hits.set_pointer_state(Vector2::new(140.0, 125.0), false);
        assert_eq!((ui.state().x, ui.state().y), (130.0, 115.0));
        ui.update_and_draw(&mut hits);

        let close = hits.get("test:close").map(|r| r.bounds).unwrap();
        let centre = Vector2::new(close.x + 2.0, close.y + 2.0);
        hits.set_pointer_state(centre, true);
        let events = hits.set_pointer_state(centre, false);
        assert_eq!(ui.handle_events(&events), vec![LayoutAction::Close]);

        let button = hits.get("test:btn:apply").map(|r| r.bounds).unwrap();
        let inside = Vector2::new(button.x + 1.0, button.y + 1.0);
        hits.set_pointer_state(inside, true);
        let events = hits.set_pointer_state(inside, false);
        assert_eq!(ui.handle_events(&events), vec![LayoutAction::Clicked("apply".into())]);
    }

    #[test]
    fn rebuilt_content_drops_stale_buttons() {
        let mut ui = layout();
        let mut hits = HitTestManager::new();
        ui.button("old", "Old");
        ui.update_and_draw(&mut hits);
        ui.clear();
        ui.button("new", "New");
        ui.update_and_draw(&mut hits);
        assert!(hits.get("test:btn:old").is_none());
        assert!(hits.get("test:btn:new").is_some());
        ui.release_hits(&mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn resize_handle_grows_panel() {
        let mut ui = layout();
        ui.set_panel_config(PanelConfig {
            resizable: true,
            ..PanelConfig::default()
        });
        ui.label("x");
        let mut hits = HitTestManager::new();
        ui.update_and_draw(&mut hits);
        let before = ui.bounds();
        let handle = hits.get("test:resize").map(|r| r.bounds).unwrap();
        let start = Vector2::new(handle.x + 1.0, handle.y + 1.0);
        hits.set_pointer_state(start, true);
        let events = hits.set_pointer_state(Vector2::new(start.x + 50.0, start.y + 40.0), true);
        assert_eq!(ui.handle_events(&events), vec![LayoutAction::Resized]);
        ui.update_and_draw(&mut hits);
        assert_eq!(ui.bounds().width, before.width + 50.0);
        assert_eq!(ui.bounds().height, before.height + 40.0);
    }

    #[test]
    fn state_store_round_trip_and_reset() {
        let mut store = PanelStateStore::new();
        let mut ui = layout();
        ui.set_position(42.0, 24.0);
        ui.save_state(&mut store);

        let mut again = layout();
        assert!(again.restore_state(&store));
        assert_eq!(again.state().x, 42.0);

        assert!(store.reset("test"));
        assert!(!layout().restore_state(&store));
        ui.save_state(&mut store);
        store.reset_all();
        assert!(store.is_empty());
    }
}
