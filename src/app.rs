use anyhow::{Result, anyhow};
use eframe::egui;

use crate::chart::Chart;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// eframe App implementation: one window per chart
// ---------------------------------------------------------------------------

pub struct ChartApp {
    pub chart: Chart,
}

impl ChartApp {
    pub fn new(chart: Chart) -> Self {
        Self { chart }
    }
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: chart title ----
        egui::TopBottomPanel::top("title_bar").show(ctx, |ui| {
            ui.heading(&self.chart.title);
        });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_plot(ui, &self.chart);
        });
    }
}

/// Open a native window showing `chart` and block until the user closes it.
pub fn show_window(chart: &Chart) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(chart.size)
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };

    let app = ChartApp::new(chart.clone());
    eframe::run_native(&chart.title, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow!("failed to open chart window '{}': {e}", chart.title))
}
