// src/gui.rs
use std::sync::mpsc::Receiver;

use eframe::egui;
use egui::{Color32, RichText, Vec2};
use egui_plot::{HLine, Line, Plot, PlotPoints, VLine};
use graph_scope::graph::{Clock, GridLine, SystemClock};
use graph_scope::{
    ChannelReader, ChannelRegistry, DataKey, GraphConfig, GraphHandler, GraphUpdated, IndexRange,
    RandomValueGenerator,
};

const MAX_NEW_KEY: DataKey = 1024;

const PALETTE: [Color32; 4] = [
    Color32::from_rgb(0x5b, 0x8f, 0xff),
    Color32::from_rgb(0xff, 0x8c, 0x42),
    Color32::from_rgb(0x54, 0xc7, 0x6b),
    Color32::from_rgb(0xd1, 0x5b, 0xff),
];

struct ChannelRow {
    key: DataKey,
    name: String,
    count: usize,
    latest: Option<f32>,
}

pub struct GraphApp {
    handler: GraphHandler,
    updates: Receiver<GraphUpdated>,
    generators: Vec<(DataKey, RandomValueGenerator)>,
    clock: SystemClock,
    last_plot_size: Option<Vec2>,
    redraws: u64,

    new_key: DataKey,
    new_name: String,
    log_messages: Vec<String>,
}

impl GraphApp {
    pub fn new(config: &GraphConfig) -> Self {
        let mut handler = GraphHandler::new(config);
        let updates = handler.subscribe();
        let generators = config
            .generators
            .iter()
            .map(|g| (g.key, g.build()))
            .collect();
        let next_key = handler.registry().span().min(MAX_NEW_KEY as usize) as DataKey;
        Self {
            handler,
            updates,
            generators,
            clock: SystemClock::new(),
            last_plot_size: None,
            redraws: 0,
            new_key: next_key,
            new_name: String::new(),
            log_messages: vec!["graph-scope ready.".to_owned()],
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn pump_generators(&mut self) {
        let now = self.clock.now_secs();
        for (key, gen) in &mut self.generators {
            if let Some(value) = gen.poll(now) {
                self.handler.set_value(*key, value);
            }
        }
    }

    fn scope_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("SCOPE").strong());
        let mut scope = self.handler.scope();
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Offset");
            changed |= ui.add(egui::DragValue::new(&mut scope.offset_x).speed(0.1).prefix("x ")).changed();
            changed |= ui.add(egui::DragValue::new(&mut scope.offset_y).speed(1.0).prefix("y ")).changed();
        });
        ui.horizontal(|ui| {
            ui.label("Size");
            changed |= ui.add(egui::DragValue::new(&mut scope.width).speed(0.1).prefix("w ")).changed();
            changed |= ui.add(egui::DragValue::new(&mut scope.height).speed(1.0).prefix("h ")).changed();
        });
        changed |= ui.checkbox(&mut scope.unsigned, "Unsigned").changed();
        changed |= ui.checkbox(&mut scope.follow_latest, "Follow latest").changed();
        if changed {
            self.handler.set_scope(scope);
        }

        ui.add_space(10.0);
        ui.label(RichText::new("GRID").strong());
        let mut grid = self.handler.grid();
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Cell");
            changed |= ui.add(egui::DragValue::new(&mut grid.cell_width).speed(0.1).prefix("w ")).changed();
            changed |= ui.add(egui::DragValue::new(&mut grid.cell_height).speed(1.0).prefix("h ")).changed();
        });
        ui.horizontal(|ui| {
            ui.label("Subdivision");
            changed |= ui.add(egui::DragValue::new(&mut grid.subdivision_x).prefix("x ")).changed();
            changed |= ui.add(egui::DragValue::new(&mut grid.subdivision_y).prefix("y ")).changed();
        });
        if changed {
            self.handler.set_grid(grid);
        }
    }

    fn data_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("DATA").strong());
        let mut policy = self.handler.policy();
        let mut changed = ui.checkbox(&mut policy.accept_data, "Accept data").changed();
        changed |= ui
            .checkbox(&mut policy.accept_unregistered_keys, "Accept unregistered keys")
            .changed();
        if changed {
            self.handler.set_policy(policy);
        }
        let mut auto = self.handler.auto_commit_on_tick();
        if ui.checkbox(&mut auto, "Commit every frame").changed() {
            self.handler.set_auto_commit_on_tick(auto);
        }

        ui.horizontal(|ui| {
            if ui.button("DETERMINE").clicked() {
                self.handler.determine();
            }
            if ui.button("CLEAR").clicked() {
                self.handler.clear_all();
                self.log("Cleared all channels.");
            }
        });

        ui.add_space(10.0);
        let rows: Vec<ChannelRow> = self
            .handler
            .registry()
            .iter()
            .map(|(key, ch)| {
                let reader = ch.reader();
                ChannelRow {
                    key,
                    name: ch.name().to_owned(),
                    count: reader.count(),
                    latest: reader.latest_value(),
                }
            })
            .collect();
        let mut to_remove = None;
        egui::Grid::new("channel_list").striped(true).show(ui, |ui| {
            for row in &rows {
                let is_system = ChannelRegistry::is_reserved(row.key);
                let label = if is_system {
                    format!("{} (system)", row.name)
                } else {
                    row.name.clone()
                };
                ui.monospace(row.key.to_string());
                ui.label(label);
                ui.label(format!("{} pts", row.count));
                ui.label(row.latest.map_or("-".to_owned(), |v| format!("{v:.2}")));
                if !is_system && ui.small_button("x").clicked() {
                    to_remove = Some(row.key);
                }
                ui.end_row();
            }
        });
        if let Some(key) = to_remove {
            match self.handler.remove(key) {
                Ok(_) => self.log(&format!("Removed channel {key}.")),
                Err(e) => self.log(&e.to_string()),
            }
        }

        ui.horizontal(|ui| {
            ui.add(egui::DragValue::new(&mut self.new_key).clamp_range(0..=MAX_NEW_KEY));
            ui.text_edit_singleline(&mut self.new_name);
        });
        if ui.button("ADD CHANNEL").clicked() {
            let name = if self.new_name.is_empty() {
                format!("data {}", self.new_key)
            } else {
                std::mem::take(&mut self.new_name)
            };
            match self.handler.register(self.new_key, name) {
                Ok(()) => {
                    self.log(&format!("Registered channel {}.", self.new_key));
                    self.new_key += 1;
                }
                Err(e) => self.log(&e.to_string()),
            }
        }
    }

    fn plot(&mut self, ui: &mut egui::Ui) {
        let size = ui.available_size();
        if self.last_plot_size != Some(size) {
            self.last_plot_size = Some(size);
            self.handler.on_geometry_changed();
        }

        let rect = self.handler.current_scope_rect();
        let grid = self.handler.grid();
        let lines_x = grid.lines_x(&rect);
        let lines_y = grid.lines_y(&rect);
        let series = self.visible_series();

        Plot::new("scope")
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .include_x(rect.x_min as f64)
            .include_x(rect.x_max as f64)
            .include_y(rect.y_min as f64)
            .include_y(rect.y_max as f64)
            .show(ui, |plot_ui| {
                for line in &lines_x {
                    plot_ui.vline(VLine::new(line.position as f64).color(grid_color(line)));
                }
                for line in &lines_y {
                    plot_ui.hline(HLine::new(line.position as f64).color(grid_color(line)));
                }
                for (i, (name, points)) in series.iter().enumerate() {
                    plot_ui.line(
                        Line::new(PlotPoints::new(points.clone()))
                            .name(name)
                            .color(PALETTE[i % PALETTE.len()]),
                    );
                }
            });
    }

    fn visible_series(&self) -> Vec<(String, Vec<[f64; 2]>)> {
        let Some(range) = self.handler.current_index_range() else {
            return Vec::new();
        };
        let timestamps = self.handler.timestamps();
        self.handler
            .registry()
            .iter()
            .filter(|(key, _)| !ChannelRegistry::is_reserved(*key))
            .map(|(_, ch)| {
                (
                    ch.name().to_owned(),
                    visible_points(timestamps, ch.reader(), range),
                )
            })
            .collect()
    }
}

// Channels registered mid-session hold fewer samples than the timestamp
// channel; their first sample lines up with the timestamp at `offset`.
fn visible_points(
    timestamps: ChannelReader<'_>,
    channel: ChannelReader<'_>,
    range: IndexRange,
) -> Vec<[f64; 2]> {
    let offset = timestamps.count().saturating_sub(channel.count());
    timestamps
        .slice(range)
        .iter()
        .filter_map(|t| {
            let position = t.index.checked_sub(offset)?;
            let sample = channel.sample(position)?;
            Some([t.value as f64, sample.value as f64])
        })
        .collect()
}

fn grid_color(line: &GridLine) -> Color32 {
    if line.major {
        Color32::from_gray(70)
    } else {
        Color32::from_gray(35)
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_generators();
        self.handler.on_tick();
        self.redraws += self.updates.try_iter().count() as u64;

        egui::SidePanel::left("L").min_width(300.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("graph-scope");
            ui.separator();
            self.scope_panel(ui);
            ui.add_space(10.0);
            ui.separator();
            self.data_panel(ui);
            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(100.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = self.handler.current_scope_rect();
            ui.horizontal(|ui| {
                ui.label(format!(
                    "In scope: {} samples [{}, {}]",
                    self.handler.in_scope_count(),
                    self.handler.in_scope_first_index(),
                    self.handler.in_scope_last_index(),
                ));
                ui.label(format!(
                    "x {:.2}..{:.2}  y {:.1}..{:.1}",
                    rect.x_min, rect.x_max, rect.y_min, rect.y_max
                ));
                ui.label(format!("updates: {}", self.redraws));
            });
            self.plot(ui);
        });

        ctx.request_repaint();
    }
}
