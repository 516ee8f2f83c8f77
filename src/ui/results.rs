use eframe::egui::{self, Response, RichText, ScrollArea, Ui};

use crate::results::page::{PageItem, ResultsPage};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Results window – one tab per raster
// ---------------------------------------------------------------------------

/// What the user asked for while the window was drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResultsAction {
    ShowPage(usize),
    Select { item: PageItem, additive: bool },
    ClearSelection,
    Clear,
    ExpandAll,
    CollapseAll,
    Locate,
    CreateAverage,
}

/// Render the results window (tabs, result tree, context actions).
pub fn results_window(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Spectral Library Match Results");
    ui.separator();

    if state.store.is_empty() {
        ui.label("No match results.");
        return;
    }

    let mut actions: Vec<ResultsAction> = Vec::new();
    let additive = ui.input(|i| i.modifiers.command || i.modifiers.ctrl);
    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        actions.push(ResultsAction::ClearSelection);
    }

    // ---- Tabs ----
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let current = state.store.current_index();
        for (index, page) in state.store.pages().iter().enumerate() {
            let tab = ui
                .selectable_label(current == Some(index), page.display_name())
                .on_hover_text(format!("{}\n{} match(es)", page.raster_name(), page.row_count()));
            if tab.clicked() {
                actions.push(ResultsAction::ShowPage(index));
            }
        }
    });
    ui.separator();

    // ---- Action buttons ----
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .button("Locate")
            .on_hover_text("Locates the selected Signatures in the spatial data view")
            .clicked()
        {
            actions.push(ResultsAction::Locate);
        }
        if ui
            .button("Average")
            .on_hover_text("Creates an average Signature from the selected Signatures")
            .clicked()
        {
            actions.push(ResultsAction::CreateAverage);
        }
    });
    ui.separator();

    // ---- Result tree of the current page ----
    let open_override = state.tree_open_override.take();
    if let Some(page) = state.store.current_page() {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                result_tree(ui, page, open_override, additive, &mut actions);
            });
    }

    for action in actions {
        apply(state, action);
    }
}

fn result_tree(
    ui: &mut Ui,
    page: &ResultsPage,
    open_override: Option<bool>,
    additive: bool,
    actions: &mut Vec<ResultsAction>,
) {
    if page.entries().is_empty() {
        let response = ui.label("This page has no results.");
        context_menu(&response, actions);
        return;
    }

    for (entry_index, entry) in page.entries().iter().enumerate() {
        let target = PageItem::Target(entry_index);
        let mut header_text = RichText::new(format!(
            "{}  [{}]  ({})",
            entry.target_name,
            entry.algorithm,
            entry.rows.len()
        ));
        if page.is_selected(target) {
            header_text = header_text.strong().underline();
        }

        let collapsing = egui::CollapsingHeader::new(header_text)
            .id_salt((page.raster_name(), entry_index))
            .default_open(true)
            .open(open_override)
            .show(ui, |ui: &mut Ui| {
                let all = ui.selectable_label(page.is_selected(target), "All matches");
                if all.clicked() {
                    actions.push(ResultsAction::Select {
                        item: target,
                        additive,
                    });
                }
                for (row_index, page_row) in entry.rows.iter().enumerate() {
                    let item = PageItem::Row {
                        entry: entry_index,
                        row: row_index,
                    };
                    let mut text = RichText::new(format!(
                        "{:>3}. {}  {:.4}",
                        page_row.row.rank, page_row.row.signature, page_row.row.score
                    ));
                    if let Some(color) = page_row.color {
                        text = text.color(color);
                    }
                    let response = ui.selectable_label(page.is_selected(item), text);
                    if response.clicked() {
                        actions.push(ResultsAction::Select { item, additive });
                    }
                    context_menu(&response, actions);
                }
            });

        context_menu(&collapsing.header_response, actions);
    }
}

fn context_menu(response: &Response, actions: &mut Vec<ResultsAction>) {
    response.context_menu(|ui: &mut Ui| {
        let mut entry = |ui: &mut Ui, label: &str, tip: &str, action: ResultsAction| {
            if ui.button(label).on_hover_text(tip).clicked() {
                actions.push(action);
                ui.close_menu();
            }
        };
        entry(ui, "Clear", "Clears the results from the current page", ResultsAction::Clear);
        entry(
            ui,
            "Expand All",
            "Expands all the results nodes on the current page",
            ResultsAction::ExpandAll,
        );
        entry(
            ui,
            "Collapse All",
            "Collapses all the results nodes on the current page",
            ResultsAction::CollapseAll,
        );
        ui.separator();
        entry(
            ui,
            "Locate Signatures",
            "Locates the selected Signatures in the spatial data view",
            ResultsAction::Locate,
        );
        entry(
            ui,
            "Create average Signature",
            "Creates an average Signature from the selected Signatures",
            ResultsAction::CreateAverage,
        );
    });
}

fn apply(state: &mut AppState, action: ResultsAction) {
    match action {
        ResultsAction::ShowPage(index) => {
            state.store.set_current(index);
        }
        ResultsAction::Select { item, additive } => {
            if let Some(page) = state.store.current_page_mut() {
                if additive {
                    page.toggle(item);
                } else {
                    page.select_only(item);
                }
            }
        }
        ResultsAction::ClearSelection => {
            if let Some(page) = state.store.current_page_mut() {
                page.clear_selection();
            }
        }
        ResultsAction::Clear => state.clear_current_page(),
        ResultsAction::ExpandAll => state.tree_open_override = Some(true),
        ResultsAction::CollapseAll => state.tree_open_override = Some(false),
        ResultsAction::Locate => state.request_locate(),
        ResultsAction::CreateAverage => state.request_average(),
    }
}
