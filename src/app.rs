use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use egui::{Align2, Color32, Rect, Sense, Stroke, Vec2};
use tokio::sync::mpsc;
use uuid::Uuid;

use image_expander::expansion_manager::{ExpansionEvent, ExpansionManager};
use image_expander::gemini::GeminiService;
use image_expander::image_loader::{self, OriginalImage};
use image_expander::settings::{AppConfig, Theme};
use image_expander::{ExpandError, ExpansionClient, Preset, Session, MAX_DIM};

use crate::ui_theme::Palette;

const PROJECT_URL: &str = "https://github.com/all-in-a-i/Gemini-Image-Expander";
const API_KEY_PLACEHOLDER: &str = "Enter your API key";
const PROMPT_PLACEHOLDER: &str = "Prompt (optional - describe the expanded areas)";
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

type LoadResult = Result<OriginalImage, ExpandError>;

/// One-line status shown under the uploader or the editor controls.
#[derive(Debug, Clone, PartialEq)]
enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }

    fn color(&self, palette: &Palette) -> Color32 {
        match self {
            Notice::Info(_) => palette.success,
            Notice::Error(_) => palette.error,
        }
    }
}

pub struct ExpanderApp {
    // Settings
    config: AppConfig,
    config_path: PathBuf,
    palette: Palette,

    // Editing state
    session: Session,
    notice: Option<Notice>,

    // UI state
    show_key_popover: bool,
    key_draft: String,
    show_api_key: bool,
    history_visible: bool,
    is_loading: bool,

    // Core components
    runtime: tokio::runtime::Runtime,
    manager: ExpansionManager<GeminiService>,
    event_receiver: mpsc::UnboundedReceiver<ExpansionEvent>,

    // Image load channel
    load_sender: std_mpsc::Sender<LoadResult>,
    load_receiver: std_mpsc::Receiver<LoadResult>,
}

impl ExpanderApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, ExpandError> {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let runtime = tokio::runtime::Runtime::new()?;
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let (load_sender, load_receiver) = std_mpsc::channel();

        let config_path = AppConfig::default_path();
        let config = AppConfig::load_or_default(&config_path);

        let service = GeminiService::new(config.api_base_url.clone(), config.model.clone());
        log::info!("🤖 Using model {}", service.model());
        let manager = ExpansionManager::new(ExpansionClient::new(service), event_sender);

        let session = Session::new(config.api_key.clone());
        let palette = Palette::for_theme(config.theme);

        Ok(Self {
            key_draft: config.api_key.clone().unwrap_or_default(),
            show_key_popover: config.api_key.is_none(),
            show_api_key: false,
            history_visible: false,
            is_loading: false,
            notice: None,
            config,
            config_path,
            palette,
            session,
            runtime,
            manager,
            event_receiver,
            load_sender,
            load_receiver,
        })
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            log::error!("❌ Failed to save config: {}", e);
        }
    }

    fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        self.palette = Palette::for_theme(self.config.theme);
        self.save_config();
    }

    fn save_api_key(&mut self) {
        self.config.set_api_key(&self.key_draft);
        self.session.set_api_key(self.config.api_key.clone());
        self.save_config();
        log::info!(
            "🔑 API key {}",
            if self.config.api_key.is_some() { "saved" } else { "removed" }
        );
    }

    fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.load_path(path);
        }
    }

    fn load_path(&mut self, path: PathBuf) {
        let sender = self.load_sender.clone();
        self.is_loading = true;
        self.runtime.spawn(async move {
            let result = image_loader::load_from_path(&path).await;
            let _ = sender.send(result);
        });
    }

    // Drops and pastes are only taken by the uploader; the editor ignores them.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if !self.session.accepts_upload() {
            log::debug!("🚫 Ignoring drop while editing");
            return;
        }

        if let Some(path) = file.path {
            self.load_path(path);
        } else if let Some(bytes) = file.bytes {
            let result = OriginalImage::from_bytes(bytes.to_vec(), Some(file.name));
            let _ = self.load_sender.send(result);
        }
    }

    fn handle_paste(&mut self, ctx: &egui::Context) {
        if !self.session.accepts_upload() || ctx.wants_keyboard_input() {
            return;
        }

        let pasted = ctx.input(|i| {
            i.events.iter().any(|event| match event {
                egui::Event::Paste(_) => true,
                egui::Event::Key {
                    key: egui::Key::V,
                    pressed: true,
                    modifiers,
                    ..
                } => modifiers.command,
                _ => false,
            })
        });
        if pasted {
            self.paste_image();
        }
    }

    fn paste_image(&mut self) {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                log::error!("❌ Failed to open clipboard: {}", e);
                self.notice = Some(Notice::Error(format!("Clipboard unavailable: {}", e)));
                return;
            }
        };

        if let Ok(image_data) = clipboard.get_image() {
            log::info!("📋 Pasted {}x{} image", image_data.width, image_data.height);
            let result = OriginalImage::from_rgba(
                image_data.width as u32,
                image_data.height as u32,
                image_data.bytes.into_owned(),
                Some("pasted.png".to_string()),
            );
            let _ = self.load_sender.send(result);
            return;
        }

        let text = clipboard.get_text().unwrap_or_default();
        let text = text.trim();
        if text.starts_with("data:image/") {
            let _ = self.load_sender.send(OriginalImage::from_data_uri(text));
        } else if image_loader::is_image_file(Path::new(text)) && Path::new(text).is_file() {
            self.load_path(PathBuf::from(text));
        } else {
            self.notice = Some(Notice::Error(
                "The clipboard does not contain an image.".to_string(),
            ));
        }
    }

    fn copy_link(&mut self, id: Uuid) {
        let Some(image) = self.session.history().get_item_by_id(id) else {
            return;
        };
        let result = arboard::Clipboard::new().and_then(|mut c| c.set_text(image.src.clone()));

        self.notice = Some(match result {
            Ok(()) => Notice::Info(format!("Copied {} as a data URI", image.file_name())),
            Err(e) => {
                log::error!("❌ Failed to copy to clipboard: {}", e);
                Notice::Error(format!("Copy failed: {}", e))
            }
        });
    }

    fn generate(&mut self) {
        if self.session.is_busy() {
            return;
        }

        match self.session.begin_generation() {
            Ok(job) => {
                self.notice = None;
                self.manager.start(self.runtime.handle(), job);
            }
            Err(e) => {
                log::warn!("⚠ Not generating: {}", e);
                if e.is_credential_problem() {
                    self.show_key_popover = true;
                }
            }
        }
    }

    fn download(&mut self, id: Uuid) {
        let Some(dir) = rfd::FileDialog::new()
            .set_title("Choose a folder for the expanded image")
            .pick_folder()
        else {
            return;
        };

        self.notice = Some(match self.session.history().save_item(id, &dir) {
            Ok(path) => Notice::Info(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("❌ Failed to save image: {}", e);
                Notice::Error(e.to_string())
            }
        });
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            let succeeded = event.result.is_ok();
            let credential_problem = matches!(&event.result, Err(e) if e.is_credential_problem());

            if self.session.finish_generation(event.epoch, event.result) {
                if succeeded {
                    self.history_visible = true;
                } else if credential_problem {
                    self.show_key_popover = true;
                }
            }
        }

        while let Ok(result) = self.load_receiver.try_recv() {
            self.is_loading = false;
            match result {
                Ok(image) => {
                    if self.session.load_image(image) {
                        self.history_visible = false;
                        self.notice = None;
                    }
                }
                Err(e) => {
                    log::error!("❌ Failed to load image: {}", e);
                    self.notice = Some(Notice::Error(e.to_string()));
                }
            }
        }
    }
}

impl eframe::App for ExpanderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.palette.apply_to_ctx(ctx);

        self.process_events();
        self.handle_dropped_files(ctx);
        self.handle_paste(ctx);

        // Results arrive on channels; keep polling while anything is in flight.
        if self.session.is_busy() || self.is_loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.show_header(ctx);
        self.show_key_window(ctx);

        if !self.session.history().is_empty() {
            let visible = self.history_visible;
            egui::SidePanel::right("history")
                .resizable(false)
                .exact_width(320.0)
                .show_animated(ctx, visible, |ui| self.show_history(ui));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.session.original().is_none() {
                self.show_uploader(ui);
            } else {
                self.show_editor(ui);
            }
        });
    }
}

impl ExpanderApp {
    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(self.palette.spacing_medium);
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Gemini Image Expander")
                        .font(self.palette.font_title.clone())
                        .strong()
                        .color(self.palette.text_primary),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("GitHub").clicked() {
                        if let Err(e) = webbrowser::open(PROJECT_URL) {
                            log::error!("❌ Failed to open browser: {}", e);
                        }
                    }

                    let theme_label = match self.config.theme {
                        Theme::Dark => "☀ Light",
                        Theme::Light => "🌙 Dark",
                    };
                    if ui.button(theme_label).clicked() {
                        self.toggle_theme();
                    }

                    if ui.button("🔑 API Key").clicked() {
                        self.show_key_popover = !self.show_key_popover;
                    }

                    if !self.session.history().is_empty() {
                        let label = format!("History ({})", self.session.history().len());
                        if ui.selectable_label(self.history_visible, label).clicked() {
                            self.history_visible = !self.history_visible;
                        }
                    }
                });
            });
            ui.add_space(self.palette.spacing_medium);
        });
    }

    fn show_key_window(&mut self, ctx: &egui::Context) {
        if !self.show_key_popover {
            return;
        }

        let mut open = true;
        let mut saved = false;
        egui::Window::new("Gemini API Key")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::RIGHT_TOP, [-16.0, 56.0])
            .frame(self.palette.card_frame())
            .show(ctx, |ui| {
                ui.set_width(300.0);
                ui.label(
                    egui::RichText::new(
                        "Your key is stored locally on this machine and only sent to the Gemini API.",
                    )
                    .font(self.palette.font_small.clone())
                    .color(self.palette.text_muted),
                );
                ui.add_space(self.palette.spacing_medium);

                ui.horizontal(|ui| {
                    let toggle = if self.show_api_key { "Hide" } else { "Show" };
                    let width = ui.available_width() - 60.0;
                    ui.add_sized(
                        [width, 24.0],
                        egui::TextEdit::singleline(&mut self.key_draft)
                            .password(!self.show_api_key)
                            .hint_text(API_KEY_PLACEHOLDER),
                    );
                    if ui.add_sized([52.0, 24.0], egui::Button::new(toggle)).clicked() {
                        self.show_api_key = !self.show_api_key;
                    }
                });

                ui.add_space(self.palette.spacing_medium);
                let save = self.palette.primary_button("Save");
                if ui.add_sized([ui.available_width(), 28.0], save).clicked() {
                    saved = true;
                }
            });

        if saved {
            self.save_api_key();
        }
        self.show_key_popover = open && !saved;
    }

    fn show_uploader(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            self.palette.card_frame().show(ui, |ui| {
                ui.set_width(420.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Drop or paste an image here")
                            .font(self.palette.font_title.clone())
                            .color(self.palette.text_primary),
                    );
                    ui.add_space(self.palette.spacing_small);
                    ui.label(
                        egui::RichText::new("PNG, JPEG, WebP, GIF or BMP. Ctrl/Cmd+V pastes.")
                            .color(self.palette.text_muted),
                    );
                    ui.add_space(self.palette.spacing_large);

                    if self.is_loading {
                        ui.spinner();
                    } else if ui.add(self.palette.primary_button("Choose image...")).clicked() {
                        self.pick_image();
                    }
                });
            });

            if let Some(notice) = &self.notice {
                ui.add_space(self.palette.spacing_medium);
                ui.colored_label(notice.color(&self.palette), notice.text());
            }
        });
    }

    fn show_editor(&mut self, ui: &mut egui::Ui) {
        if ui.button("⬅ Back").clicked() {
            self.session.reset();
            self.history_visible = false;
            self.notice = None;
            return;
        }

        let controls_height = 190.0;
        let preview_height = (ui.available_height() - controls_height).max(120.0);
        ui.allocate_ui(Vec2::new(ui.available_width(), preview_height), |ui| {
            ui.centered_and_justified(|ui| self.show_preview(ui));
        });

        ui.add_space(self.palette.spacing_medium);
        self.show_controls(ui);
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        let Some(original) = self.session.original() else {
            return;
        };
        let target = self.session.target();

        let available = ui.available_size();
        let scale = (available.x * 0.9 / target.width as f32)
            .min(available.y * 0.95 / target.height as f32)
            .min(1.0);

        let canvas_size = Vec2::new(target.width as f32, target.height as f32) * scale;
        let (canvas_rect, _) = ui.allocate_exact_size(canvas_size, Sense::hover());
        let painter = ui.painter_at(canvas_rect);

        painter.rect_filled(canvas_rect, 0.0, self.palette.surface);
        let step = 32.0 * scale.max(0.25);
        let mut x = canvas_rect.left() + step;
        while x < canvas_rect.right() {
            painter.vline(x, canvas_rect.y_range(), Stroke::new(1.0, self.palette.grid_line));
            x += step;
        }
        let mut y = canvas_rect.top() + step;
        while y < canvas_rect.bottom() {
            painter.hline(canvas_rect.x_range(), y, Stroke::new(1.0, self.palette.grid_line));
            y += step;
        }

        let image_rect = Rect::from_center_size(
            canvas_rect.center(),
            Vec2::new(original.width as f32, original.height as f32) * scale,
        );
        let uri = format!(
            "bytes://original-{}.{}",
            self.session.epoch(),
            extension_for(&original.mime_type)
        );
        // A smaller target crops the original, same as the composite.
        let previous_clip = ui.clip_rect();
        ui.set_clip_rect(canvas_rect.intersect(previous_clip));
        egui::Image::from_bytes(uri, original.bytes.clone()).paint_at(ui, image_rect);
        ui.set_clip_rect(previous_clip);

        painter.rect_stroke(
            canvas_rect,
            0.0,
            Stroke::new(2.0, self.palette.accent.gamma_multiply(0.6)),
        );
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let busy = self.session.is_busy();

        self.palette.card_frame().show(ui, |ui| {
            if let Some(error) = self.session.last_error() {
                ui.vertical_centered(|ui| ui.colored_label(self.palette.error, error));
            } else if let Some(notice) = &self.notice {
                ui.vertical_centered(|ui| ui.colored_label(notice.color(&self.palette), notice.text()));
            }

            ui.columns(2, |columns| {
                let target = self.session.target();

                let mut width = target.width;
                columns[0].horizontal(|ui| {
                    ui.add_sized([56.0, 20.0], egui::Label::new("Width"));
                    ui.add(egui::Slider::new(&mut width, 1..=MAX_DIM).suffix(" px"));
                });
                let mut height = target.height;
                columns[0].horizontal(|ui| {
                    ui.add_sized([56.0, 20.0], egui::Label::new("Height"));
                    ui.add(egui::Slider::new(&mut height, 1..=MAX_DIM).suffix(" px"));
                });
                if width != target.width {
                    self.session.set_width(width);
                }
                if height != target.height {
                    self.session.set_height(height);
                }

                columns[1].horizontal_wrapped(|ui| {
                    for preset in Preset::ALL {
                        if ui.button(preset.label()).clicked() {
                            self.session.apply_preset(preset);
                        }
                    }
                });
                if let Some(original) = self.session.original() {
                    let target = self.session.target();
                    columns[1].label(
                        egui::RichText::new(format!(
                            "{} × {}  →  {} × {}",
                            original.width, original.height, target.width, target.height
                        ))
                        .color(self.palette.text_secondary),
                    );
                    if !target.covers(original.width, original.height) {
                        columns[1].label(
                            egui::RichText::new("Smaller than the original: edges will be cropped")
                                .font(self.palette.font_small.clone())
                                .color(self.palette.text_muted),
                        );
                    }
                }
            });

            ui.add_space(self.palette.spacing_medium);
            ui.horizontal(|ui| {
                let mut prompt = self.session.prompt().to_string();
                let width = ui.available_width() - 130.0;
                let response = ui.add_sized(
                    [width, 28.0],
                    egui::TextEdit::singleline(&mut prompt).hint_text(PROMPT_PLACEHOLDER),
                );
                if response.changed() {
                    self.session.set_prompt(prompt);
                }
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                let label = if busy { "Generating..." } else { "✨ Generate" };
                let clicked = ui
                    .add_enabled(!busy, self.palette.primary_button(label).min_size(Vec2::new(120.0, 28.0)))
                    .clicked();
                if busy {
                    ui.spinner();
                }
                if clicked || (submitted && !busy) {
                    self.generate();
                }
            });
        });
    }

    fn show_history(&mut self, ui: &mut egui::Ui) {
        let busy = self.session.is_busy();
        let mut regenerate = false;
        let mut download = None;
        let mut copy = None;

        ui.add_space(self.palette.spacing_medium);
        ui.horizontal(|ui| {
            ui.heading(format!("History ({})", self.session.history().len()));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if busy { "Generating..." } else { "⟳ Regenerate" };
                if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                    regenerate = true;
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            let side = (ui.available_width() - self.palette.spacing_medium) / 2.0;
            egui::Grid::new("history_grid")
                .spacing([self.palette.spacing_medium, self.palette.spacing_medium])
                .show(ui, |ui| {
                    for (index, image) in self.session.history().get_items().into_iter().enumerate() {
                        ui.vertical(|ui| {
                            ui.add(
                                egui::Image::from_bytes(
                                    format!("bytes://{}", image.file_name()),
                                    image.bytes.clone(),
                                )
                                .fit_to_exact_size(Vec2::splat(side))
                                .rounding(self.palette.radius_medium)
                                .bg_fill(Color32::TRANSPARENT),
                            )
                            .on_hover_text(image.created_at.format("%H:%M:%S").to_string());
                            ui.horizontal(|ui| {
                                if ui.small_button("⬇ Download").clicked() {
                                    download = Some(image.id);
                                }
                                if ui.small_button("🔗 Copy").clicked() {
                                    copy = Some(image.id);
                                }
                            });
                        });
                        if index % 2 == 1 {
                            ui.end_row();
                        }
                    }
                });
        });

        if regenerate {
            self.generate();
        }
        if let Some(id) = copy {
            self.copy_link(id);
        }
        if let Some(id) = download {
            self.download(id);
        }
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_colors_follow_kind() {
        let palette = Palette::for_theme(Theme::Dark);

        let saved = Notice::Info("Saved /tmp/expanded-1.png".to_string());
        assert_eq!(saved.color(&palette), palette.success);
        assert_eq!(saved.text(), "Saved /tmp/expanded-1.png");

        let failed = Notice::Error("Permission denied".to_string());
        assert_eq!(failed.color(&palette), palette.error);
        assert_ne!(failed.color(&palette), saved.color(&palette));
    }

    #[test]
    fn test_extension_for_mime_type() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("application/octet-stream"), "png");
    }
}
