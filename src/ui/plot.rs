use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{self, ColorMap, ACCENT};
use crate::data::aggregate::{Correlation, CorrelationMatrix, GroupKey, Ranked};
use crate::data::dashboard::{Dashboard, DashboardState};
use crate::state::{AppState, Tab};
use crate::ui::table;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render metrics, the tab strip and the active tab.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let mut tab = state.tab;
    render(ui, state, &mut tab);
    state.tab = tab;
}

fn render(ui: &mut Ui, state: &AppState, tab: &mut Tab) {
    let dashboard = match &state.dashboard {
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a dataset to start exploring  (File → Open…)");
            });
            return;
        }
        Some(DashboardState::EmptyResult) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No tracks match the current filters. Adjust the controls to see data.");
            });
            return;
        }
        Some(DashboardState::Ready(dashboard)) => dashboard,
    };

    metrics_row(ui, dashboard);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        for t in Tab::ALL {
            ui.selectable_value(&mut *tab, t, t.label());
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match tab {
                Tab::Overview => overview_tab(ui, dashboard),
                Tab::ArtistsAndTracks => artists_tab(ui, dashboard, state.artist_colors.as_ref()),
                Tab::Audio => audio_tab(ui, dashboard),
                Tab::Trends => trends_tab(ui, dashboard),
            }

            if state.show_raw_data {
                if let Some(view) = &state.view {
                    ui.separator();
                    ui.heading("Filtered data preview");
                    table::raw_data(ui, view);
                }
            }
        });
}

fn metrics_row(ui: &mut Ui, dashboard: &Dashboard) {
    let summary = dashboard.summary;
    ui.columns(3, |cols| {
        metric(&mut cols[0], "Tracks", &thousands(summary.tracks as u64));
        metric(&mut cols[1], "Unique artists", &thousands(summary.artists as u64));
        metric(&mut cols[2], "Total streams", &billions(summary.streams));
    });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(label).color(Color32::GRAY));
        ui.label(RichText::new(value).size(28.0).strong().color(ACCENT));
    });
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn overview_tab(ui: &mut Ui, dashboard: &Dashboard) {
    ui.heading("Most common words in track names");
    ranked_bars(ui, "title_words", &dashboard.title_words, ACCENT);

    ui.heading("Tracks per decade");
    let per_decade: Vec<(GroupKey, usize)> = dashboard
        .decade_features
        .iter()
        .map(|g| (g.key.clone(), g.count))
        .collect();
    count_bars(ui, "tracks_per_decade", &per_decade, 8.0);
}

fn artists_tab(ui: &mut Ui, dashboard: &Dashboard, artist_colors: Option<&ColorMap>) {
    ui.columns(2, |cols| {
        cols[0].heading(format!("Top {} artists by tracks", dashboard.artists_by_tracks.len()));
        ranked_bars(&mut cols[0], "artists_by_tracks", &dashboard.artists_by_tracks, ACCENT);
        cols[1].heading(format!("Top {} artists by streams", dashboard.artists_by_streams.len()));
        ranked_bars(
            &mut cols[1],
            "artists_by_streams",
            &dashboard.artists_by_streams,
            Color32::from_rgb(155, 89, 182),
        );
    });

    ui.heading("Top 10 tracks by streams");
    let bars: Vec<Bar> = dashboard
        .top_tracks
        .iter()
        .rev()
        .enumerate()
        .map(|(i, t)| {
            let fill = artist_colors.map_or(ACCENT, |m| m.color_for(&t.artist_name));
            Bar::new(i as f64, t.streams as f64)
                .name(format!("{} – {}", t.track_name, t.artist_name))
                .fill(fill)
        })
        .collect();
    let labels: Vec<String> = dashboard
        .top_tracks
        .iter()
        .rev()
        .map(|t| t.track_name.clone())
        .collect();
    Plot::new("top_tracks")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .y_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });

    ui.heading("Danceability vs. streams (100 most streamed)");
    let points: PlotPoints = dashboard
        .most_streamed
        .iter()
        .map(|t| [f64::from(t.danceability), t.streams as f64])
        .collect();
    Plot::new("dance_vs_streams")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label("Danceability (%)")
        .y_axis_label("Streams")
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(points).radius(3.0).color(ACCENT).name("tracks"));
        });
}

fn audio_tab(ui: &mut Ui, dashboard: &Dashboard) {
    ui.columns(2, |cols| {
        cols[0].heading("Key & mode distribution");
        if dashboard.key_mode_counts.is_empty() {
            cols[0].label("No key/mode data for these filters.");
        } else {
            count_bars(&mut cols[0], "key_mode", &dashboard.key_mode_counts, 1.0);
        }

        cols[1].heading("Tempo distribution");
        let bars: Vec<Bar> = dashboard
            .bpm_histogram
            .iter()
            .map(|b| {
                Bar::new((b.start + b.end) / 2.0, b.count as f64)
                    .width(b.end - b.start)
                    .name(format!("{:.0}–{:.0} BPM", b.start, b.end))
            })
            .collect();
        Plot::new("bpm_histogram")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("BPM")
            .show(&mut cols[1], |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(ACCENT));
            });
    });

    ui.heading("Audio feature profile");
    let selection: Vec<Bar> = dashboard
        .feature_profile
        .iter()
        .enumerate()
        .map(|(i, (field, mean))| Bar::new(i as f64 - 0.2, *mean).width(0.4).name(field))
        .collect();
    let overall: Vec<Bar> = dashboard
        .overall_profile
        .iter()
        .enumerate()
        .map(|(i, (field, mean))| Bar::new(i as f64 + 0.2, *mean).width(0.4).name(field))
        .collect();
    let labels = dashboard
        .feature_profile
        .iter()
        .map(|(field, _)| field.to_string())
        .collect();
    Plot::new("feature_profile")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .include_y(100.0)
        .x_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(selection).color(ACCENT).name("Selection"));
            plot_ui.bar_chart(BarChart::new(overall).color(Color32::GRAY).name("All tracks"));
        });

    ui.heading("Feature correlation");
    correlation_grid(ui, &dashboard.correlation);
}

fn trends_tab(ui: &mut Ui, dashboard: &Dashboard) {
    ui.columns(2, |cols| {
        cols[0].heading("Tracks released per year");
        let points: PlotPoints = dashboard
            .tracks_per_year
            .iter()
            .filter_map(|(k, n)| Some([k.as_f64()?, *n as f64]))
            .collect();
        Plot::new("tracks_per_year")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .show(&mut cols[0], |plot_ui| {
                plot_ui.line(Line::new(points).color(ACCENT).fill(0.0));
            });

        cols[1].heading("Tracks released per month");
        count_bars(&mut cols[1], "tracks_per_month", &dashboard.tracks_per_month, 0.8);
    });

    ui.heading("Audio features per decade");
    let fields = crate::data::model::NumericField::AUDIO_FEATURES;
    let palette = color::generate_palette(fields.len());
    Plot::new("decade_features")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .y_axis_label("Feature value (%)")
        .show(ui, |plot_ui| {
            for (idx, field) in fields.iter().enumerate() {
                let points: PlotPoints = dashboard
                    .decade_features
                    .iter()
                    .filter_map(|g| Some([g.key.as_f64()?, g.means[idx]]))
                    .collect();
                plot_ui.line(Line::new(points).name(field).color(palette[idx]).width(1.5));
            }
        });

    ui.heading("Average tempo per year");
    let points: PlotPoints = dashboard
        .bpm_by_year
        .iter()
        .filter_map(|g| Some([g.key.as_f64()?, g.means[0]]))
        .collect();
    Plot::new("bpm_by_year")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .y_axis_label("BPM")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(ACCENT).width(1.5));
        });
}

// ---------------------------------------------------------------------------
// Chart helpers
// ---------------------------------------------------------------------------

/// Horizontal bars, largest on top, labelled with the entry names.
fn ranked_bars(ui: &mut Ui, id: &str, ranked: &[Ranked], color: Color32) {
    let bars: Vec<Bar> = ranked
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| Bar::new(i as f64, r.value as f64).name(&r.name))
        .collect();
    let labels = ranked.iter().rev().map(|r| r.name.clone()).collect();
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .y_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().color(color));
        });
}

/// Vertical bars per group. Numeric keys sit at their own value, others at
/// consecutive positions.
fn count_bars(ui: &mut Ui, id: &str, counts: &[(GroupKey, usize)], width: f64) {
    let numeric = counts.iter().all(|(k, _)| k.as_f64().is_some());
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (key, n))| {
            let x = if numeric {
                key.as_f64().unwrap_or(i as f64)
            } else {
                i as f64
            };
            Bar::new(x, *n as f64).width(width).name(key)
        })
        .collect();
    let mut plot = Plot::new(id).height(CHART_HEIGHT).allow_scroll(false);
    if !numeric {
        let labels = counts.iter().map(|(k, _)| k.to_string()).collect();
        plot = plot.x_axis_formatter(category_formatter(labels));
    }
    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).color(ACCENT));
    });
}

/// Axis labels for bars placed at 0, 1, 2, …
fn category_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn correlation_grid(ui: &mut Ui, matrix: &CorrelationMatrix) {
    egui::Grid::new("correlation_grid")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for field in &matrix.fields {
                ui.label(RichText::new(field.column()).small());
            }
            ui.end_row();

            for (field, row) in matrix.fields.iter().zip(&matrix.cells) {
                ui.label(RichText::new(field.column()).small());
                for cell in row {
                    let value = cell.value();
                    let text = match cell {
                        Correlation::Value(v) => format!("{v:+.2}"),
                        Correlation::NotComputable => " n/a ".to_string(),
                    };
                    ui.label(
                        RichText::new(text)
                            .monospace()
                            .color(Color32::BLACK)
                            .background_color(color::diverging(value)),
                    );
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Stream totals in billions with two decimals.
pub fn billions(n: u64) -> String {
    format!("{:.2} B", n as f64 / 1_000_000_000.0)
}
