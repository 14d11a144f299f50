use archie_core::{Color, ContainerKind};

/// Colors used by the scene builder. Entity `color` fields override the
/// corresponding fill when they parse.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub node_fill: Color,
    pub node_stroke: Color,
    pub node_text: Color,
    pub locked_stroke: Color,
    pub selection: Color,
    pub pending_source: Color,
    pub link: Color,
    pub link_label_bg: Color,
    pub link_label_text: Color,
    pub region_fill: Color,
    pub zone_fill: Color,
    pub container_stroke: Color,
    pub container_text: Color,
    pub handle_fill: Color,
    pub marquee: Color,
    /// Cycled across tier containers ordered top to bottom.
    pub tier_palette: &'static [Color],
}

const TIER_PALETTE_LIGHT: &[Color] = &[
    Color::rgb8(0xE8, 0xF0, 0xFE),
    Color::rgb8(0xE6, 0xF4, 0xEA),
    Color::rgb8(0xFE, 0xF7, 0xE0),
    Color::rgb8(0xFC, 0xE8, 0xE6),
    Color::rgb8(0xF3, 0xE8, 0xFD),
];

const TIER_PALETTE_DARK: &[Color] = &[
    Color::rgb8(0x1E, 0x2A, 0x3D),
    Color::rgb8(0x1C, 0x33, 0x26),
    Color::rgb8(0x3A, 0x33, 0x1C),
    Color::rgb8(0x3D, 0x22, 0x20),
    Color::rgb8(0x2E, 0x22, 0x3D),
];

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// Light theme, warm white canvas.
    pub fn light() -> Self {
        Self {
            background: Color::rgb8(0xF5, 0xF5, 0xF7),
            node_fill: Color::rgb8(0xFF, 0xFF, 0xFF),
            node_stroke: Color::rgb8(0x86, 0x86, 0x8B),
            node_text: Color::rgb8(0x1D, 0x1D, 0x1F),
            locked_stroke: Color::rgb8(0xC7, 0xC7, 0xCC),
            selection: Color::rgb8(0x00, 0x7A, 0xFF),
            pending_source: Color::rgb8(0xFF, 0x95, 0x00),
            link: Color::rgb8(0x63, 0x63, 0x66),
            link_label_bg: Color::rgb8(0xFF, 0xFF, 0xFF),
            link_label_text: Color::rgb8(0x3A, 0x3A, 0x3C),
            region_fill: Color::rgba(0.0, 0.478, 1.0, 0.04),
            zone_fill: Color::rgba(0.204, 0.78, 0.349, 0.06),
            container_stroke: Color::rgb8(0xAE, 0xAE, 0xB2),
            container_text: Color::rgb8(0x48, 0x48, 0x4A),
            handle_fill: Color::rgb8(0xFF, 0xFF, 0xFF),
            marquee: Color::rgba(0.0, 0.478, 1.0, 0.12),
            tier_palette: TIER_PALETTE_LIGHT,
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            background: Color::rgb8(0x1C, 0x1C, 0x1E),
            node_fill: Color::rgb8(0x2C, 0x2C, 0x2E),
            node_stroke: Color::rgb8(0x63, 0x63, 0x66),
            node_text: Color::rgb8(0xF2, 0xF2, 0xF7),
            locked_stroke: Color::rgb8(0x48, 0x48, 0x4A),
            selection: Color::rgb8(0x0A, 0x84, 0xFF),
            pending_source: Color::rgb8(0xFF, 0x9F, 0x0A),
            link: Color::rgb8(0x98, 0x98, 0x9D),
            link_label_bg: Color::rgb8(0x1C, 0x1C, 0x1E),
            link_label_text: Color::rgb8(0xE5, 0xE5, 0xEA),
            region_fill: Color::rgba(0.039, 0.518, 1.0, 0.06),
            zone_fill: Color::rgba(0.188, 0.82, 0.345, 0.08),
            container_stroke: Color::rgb8(0x63, 0x63, 0x66),
            container_text: Color::rgb8(0xAE, 0xAE, 0xB2),
            handle_fill: Color::rgb8(0x2C, 0x2C, 0x2E),
            marquee: Color::rgba(0.039, 0.518, 1.0, 0.16),
            tier_palette: TIER_PALETTE_DARK,
        }
    }

    /// Palette entry for the tier at `rank` (0 = topmost).
    pub fn tier_color(&self, rank: usize) -> Color {
        if self.tier_palette.is_empty() {
            return self.region_fill;
        }
        self.tier_palette[rank % self.tier_palette.len()]
    }

    /// Default fill for non-tier containers.
    pub fn container_fill(&self, kind: ContainerKind) -> Color {
        match kind {
            ContainerKind::Region => self.region_fill,
            ContainerKind::AvailabilityZone => self.zone_fill,
            ContainerKind::Tier => self.tier_color(0),
        }
    }
}

/// Parse an entity color override, falling back when absent or invalid.
pub fn resolve_color(hex: Option<&str>, fallback: Color) -> Color {
    match hex {
        Some(s) => Color::from_hex(s).unwrap_or_else(|| {
            log::debug!("unparsable color {s:?}, using theme default");
            fallback
        }),
        None => fallback,
    }
}
