use egui::{Color32, FontFamily, FontId, Rounding, Shadow, Stroke, Vec2};
use image_expander::settings::Theme;

pub struct Palette {
    // Colors
    pub background: Color32,
    pub surface: Color32,
    pub surface_hover: Color32,
    pub surface_active: Color32,
    pub card: Color32,
    pub border: Color32,
    pub grid_line: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub error: Color32,

    // Spacing
    pub spacing_small: f32,
    pub spacing_medium: f32,
    pub spacing_large: f32,
    pub padding_medium: f32,

    pub radius_medium: Rounding,
    pub radius_large: Rounding,
    pub shadow_medium: Shadow,

    // Typography
    pub font_small: FontId,
    pub font_medium: FontId,
    pub font_title: FontId,

    dark_mode: bool,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(24, 24, 27),
            surface: Color32::from_rgb(39, 39, 42),
            surface_hover: Color32::from_rgb(52, 52, 56),
            surface_active: Color32::from_rgb(63, 63, 70),
            card: Color32::from_rgba_unmultiplied(39, 39, 42, 220),
            border: Color32::from_rgb(63, 63, 70),
            grid_line: Color32::from_rgb(45, 45, 50),
            text_primary: Color32::from_rgb(250, 250, 250),
            text_secondary: Color32::from_rgb(212, 212, 216),
            text_muted: Color32::from_rgb(161, 161, 170),
            accent: Color32::from_rgb(99, 102, 241),
            success: Color32::from_rgb(52, 199, 89),
            error: Color32::from_rgb(239, 68, 68),
            dark_mode: true,
            ..Self::base()
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(250, 250, 250),
            surface: Color32::from_rgb(244, 244, 245),
            surface_hover: Color32::from_rgb(228, 228, 231),
            surface_active: Color32::from_rgb(212, 212, 216),
            card: Color32::from_rgba_unmultiplied(244, 244, 245, 230),
            border: Color32::from_rgb(212, 212, 216),
            grid_line: Color32::from_rgb(228, 228, 231),
            text_primary: Color32::from_rgb(9, 9, 11),
            text_secondary: Color32::from_rgb(63, 63, 70),
            text_muted: Color32::from_rgb(113, 113, 122),
            accent: Color32::from_rgb(79, 70, 229),
            success: Color32::from_rgb(22, 163, 74),
            error: Color32::from_rgb(220, 38, 38),
            dark_mode: false,
            ..Self::base()
        }
    }

    // Theme-independent metrics; the colors here are overwritten.
    fn base() -> Self {
        Self {
            background: Color32::BLACK,
            surface: Color32::BLACK,
            surface_hover: Color32::BLACK,
            surface_active: Color32::BLACK,
            card: Color32::BLACK,
            border: Color32::BLACK,
            grid_line: Color32::BLACK,
            text_primary: Color32::WHITE,
            text_secondary: Color32::WHITE,
            text_muted: Color32::WHITE,
            accent: Color32::WHITE,
            success: Color32::WHITE,
            error: Color32::WHITE,

            spacing_small: 4.0,
            spacing_medium: 8.0,
            spacing_large: 16.0,
            padding_medium: 12.0,

            radius_medium: Rounding::same(8.0),
            radius_large: Rounding::same(12.0),
            shadow_medium: Shadow {
                offset: Vec2::new(0.0, 4.0),
                blur: 16.0,
                spread: 0.0,
                color: Color32::from_black_alpha(60),
            },

            font_small: FontId::new(12.0, FontFamily::Proportional),
            font_medium: FontId::new(14.0, FontFamily::Proportional),
            font_title: FontId::new(18.0, FontFamily::Proportional),

            dark_mode: true,
        }
    }

    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        style.visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.surface;
        style.visuals.window_shadow = self.shadow_medium;
        style.visuals.window_rounding = self.radius_large;
        style.visuals.window_stroke = Stroke::new(1.0, self.border);

        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_primary);
        style.visuals.widgets.inactive.weak_bg_fill = self.surface;
        style.visuals.widgets.inactive.bg_fill = self.surface;
        style.visuals.widgets.inactive.rounding = self.radius_medium;
        style.visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, self.border);

        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);
        style.visuals.widgets.hovered.weak_bg_fill = self.surface_hover;
        style.visuals.widgets.hovered.bg_fill = self.surface_hover;
        style.visuals.widgets.hovered.rounding = self.radius_medium;

        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);
        style.visuals.widgets.active.weak_bg_fill = self.surface_active;
        style.visuals.widgets.active.bg_fill = self.surface_active;
        style.visuals.widgets.active.rounding = self.radius_medium;

        style.visuals.text_cursor.stroke = Stroke::new(2.0, self.accent);
        style.visuals.selection.bg_fill = self.accent;
        style.visuals.selection.stroke = Stroke::new(1.0, self.text_primary);
        style.visuals.hyperlink_color = self.accent;

        style.text_styles = [
            (egui::TextStyle::Heading, self.font_title.clone()),
            (egui::TextStyle::Body, self.font_medium.clone()),
            (egui::TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
            (egui::TextStyle::Button, self.font_medium.clone()),
            (egui::TextStyle::Small, self.font_small.clone()),
        ]
        .into();

        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> egui::Frame {
        egui::Frame {
            inner_margin: egui::Margin::same(self.padding_medium),
            rounding: self.radius_large,
            shadow: self.shadow_medium,
            fill: self.card,
            stroke: Stroke::new(1.0, self.border),
            ..Default::default()
        }
    }

    pub fn primary_button(&self, text: &str) -> egui::Button<'static> {
        egui::Button::new(egui::RichText::new(text.to_string()).color(Color32::WHITE))
            .fill(self.accent)
            .rounding(self.radius_medium)
    }
}
