use crate::model::config::LayoutConfig;

/// The resizable, collapsible side panels. The content panel takes what's left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Explorer,
    Properties,
    Timeline,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Explorer, Panel::Properties, Panel::Timeline];

    fn index(self) -> usize {
        match self {
            Panel::Explorer => 0,
            Panel::Properties => 1,
            Panel::Timeline => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Explorer => "explorer",
            Panel::Properties => "properties",
            Panel::Timeline => "timeline",
        }
    }

    /// Default size in percent
    pub fn default_size(self) -> u16 {
        match self {
            Panel::Explorer | Panel::Properties => 20,
            Panel::Timeline => 30,
        }
    }

    pub fn min_size(self) -> u16 {
        match self {
            Panel::Explorer | Panel::Properties => 15,
            Panel::Timeline => 10,
        }
    }

    pub fn max_size(self) -> u16 {
        match self {
            Panel::Explorer | Panel::Properties => 30,
            Panel::Timeline => 60,
        }
    }

    /// +1 if dragging the panel's inner edge toward higher coordinates grows it.
    /// Explorer sits on the left; properties on the right and timeline at the bottom.
    fn drag_sign(self) -> i32 {
        match self {
            Panel::Explorer => 1,
            Panel::Properties | Panel::Timeline => -1,
        }
    }

    pub fn clamp(self, size: u16) -> u16 {
        size.clamp(self.min_size(), self.max_size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PanelState {
    size: u16,
    visible: bool,
}

/// Visibility and size (percent of the screen) of each side panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    panels: [PanelState; 3],
}

impl Default for PanelLayout {
    fn default() -> Self {
        PanelLayout {
            panels: Panel::ALL.map(|p| PanelState {
                size: p.default_size(),
                visible: true,
            }),
        }
    }
}

impl PanelLayout {
    pub fn from_config(cfg: &LayoutConfig) -> Self {
        let mut layout = PanelLayout::default();
        layout.set_size(Panel::Explorer, cfg.explorer);
        layout.set_size(Panel::Properties, cfg.properties);
        layout.set_size(Panel::Timeline, cfg.timeline);
        layout.panels[Panel::Timeline.index()].visible = cfg.show_timeline;
        layout
    }

    pub fn size(&self, panel: Panel) -> u16 {
        self.panels[panel.index()].size
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.panels[panel.index()].visible
    }

    /// Set a panel's size, clamped to its bounds. Returns the size applied.
    pub fn set_size(&mut self, panel: Panel, size: u16) -> u16 {
        let size = panel.clamp(size);
        self.panels[panel.index()].size = size;
        size
    }

    /// Show or hide a panel. Returns the new visibility.
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let state = &mut self.panels[panel.index()];
        state.visible = !state.visible;
        state.visible
    }
}

/// An in-progress border drag. Exists only between mouse down and mouse up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDrag {
    panel: Panel,
    origin: u16,
    start_size: u16,
}

impl ResizeDrag {
    /// Start dragging `panel`'s border at screen coordinate `origin`
    pub fn begin(layout: &PanelLayout, panel: Panel, origin: u16) -> Self {
        ResizeDrag {
            panel,
            origin,
            start_size: layout.size(panel),
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    /// Apply the pointer at `pos` along an axis `extent` cells long.
    /// Returns the clamped size now in effect.
    pub fn update(&self, layout: &mut PanelLayout, pos: u16, extent: u16) -> u16 {
        if extent == 0 {
            return layout.size(self.panel);
        }
        let delta_cells = (i32::from(pos) - i32::from(self.origin)) * self.panel.drag_sign();
        let delta_pct = delta_cells * 100 / i32::from(extent);
        let target = (i32::from(self.start_size) + delta_pct).clamp(0, i32::from(u16::MAX));
        layout.set_size(self.panel, target as u16)
    }
}
